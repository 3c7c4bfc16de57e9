//! Well-known platform packages.
//!
//! Maps JavaCard package AIDs to their Java package names. The verifier's
//! import pre-check treats every AID in the registry as a platform package.
//! A registry is plain data: build it once and pass it to whoever needs it.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::{Aid, Error, Result};

/// AIDs of the JavaCard and GlobalPlatform API packages.
const BUILTIN: &[(&str, &str)] = &[
    ("A0000000620001", "java.lang"),
    ("A0000000620002", "java.io"),
    ("A0000000620003", "java.rmi"),
    ("A0000000620101", "javacard.framework"),
    ("A0000000620102", "javacard.security"),
    ("A000000062010101", "javacard.framework.service"),
    ("A0000000620201", "javacardx.crypto"),
    ("A0000000620202", "javacardx.biometry"),
    ("A0000000620203", "javacardx.external"),
    ("A0000000620209", "javacardx.apdu"),
    ("A000000062020801", "javacardx.framework.util"),
    ("A00000006202080101", "javacardx.framework.util.intx"),
    ("A000000062020802", "javacardx.framework.math"),
    ("A000000062020803", "javacardx.framework.tlv"),
    ("A00000015100", "org.globalplatform"),
];

/// On-disk AID list format.
///
/// ```toml
/// [aids]
/// D276000085494A434F5058 = "com.nxp.id.jcopx"
/// ```
#[derive(Debug, Deserialize)]
struct AidList {
    #[serde(default)]
    aids: BTreeMap<String, String>,
}

/// Immutable AID to package name table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRegistry {
    names: HashMap<Aid, String>,
}

impl PlatformRegistry {
    /// Registry containing only the built-in JavaCard/GlobalPlatform packages.
    pub fn builtin() -> Self {
        let names = BUILTIN
            .iter()
            .filter_map(|(aid, name)| Some((Aid::from_hex(aid).ok()?, (*name).to_string())))
            .collect();
        Self { names }
    }

    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Parse an AID list from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text is not valid TOML or contains an
    /// invalid AID.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let list: AidList =
            toml::from_str(text).map_err(|e| Error::Config(format!("Invalid AID list: {e}")))?;

        let mut names = HashMap::with_capacity(list.aids.len());
        for (aid, name) in list.aids {
            let aid = Aid::from_hex(&aid)
                .map_err(|e| Error::Config(format!("Invalid AID '{aid}' in AID list: {e}")))?;
            names.insert(aid, name);
        }
        Ok(Self { names })
    }

    /// Load an AID list from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`Error::Config`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Combine two registries. Entries from `other` win on conflict.
    pub fn merge(mut self, other: PlatformRegistry) -> Self {
        self.names.extend(other.names);
        self
    }

    /// Package name registered for `aid`.
    pub fn name(&self, aid: &Aid) -> Option<&str> {
        self.names.get(aid).map(String::as_str)
    }

    /// Whether `aid` is a registered platform package.
    pub fn contains(&self, aid: &Aid) -> bool {
        self.names.contains_key(aid)
    }

    /// Number of registered packages.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
