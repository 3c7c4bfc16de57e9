//! CAP file container.
//!
//! A CAP file is a jar archive holding one package's components
//! (`<package path>/javacard/Header.cap`, `Method.cap`, ...) plus optional
//! `META-INF/` entries. This module only reads components; it never rewrites
//! them. All archive entries live in [`CapFile::entries`], which is also
//! where DAP blocks are added before [`CapFile::store`] writes the archive
//! back in its original entry order.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::Path;

use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::reader::ByteReader;
use crate::{Aid, Error, Result};

/// Path of the jar manifest inside a CAP file.
pub const MANIFEST: &str = "META-INF/MANIFEST.MF";

/// Manifest attribute carrying the package name.
const PACKAGE_NAME_ATTRIBUTE: &str = "Java-Card-Package-Name";

const HEADER_MAGIC: u32 = 0xDECA_FFED;

/// CAP components, named by their file in the `javacard/` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Component {
    /// `Header.cap`
    Header,
    /// `Directory.cap`
    Directory,
    /// `Applet.cap`
    Applet,
    /// `Import.cap`
    Import,
    /// `ConstantPool.cap`
    ConstantPool,
    /// `Class.cap`
    Class,
    /// `Method.cap`
    Method,
    /// `StaticField.cap`
    StaticField,
    /// `RefLocation.cap`
    RefLocation,
    /// `Export.cap`
    Export,
    /// `Descriptor.cap`
    Descriptor,
    /// `Debug.cap`
    Debug,
    /// `StaticResources.cap` (CAP format 2.3)
    StaticResources,
}

impl Component {
    /// Every component type.
    pub const ALL: [Component; 13] = [
        Component::Header,
        Component::Directory,
        Component::Applet,
        Component::Import,
        Component::ConstantPool,
        Component::Class,
        Component::Method,
        Component::StaticField,
        Component::RefLocation,
        Component::Export,
        Component::Descriptor,
        Component::Debug,
        Component::StaticResources,
    ];

    /// Components that make up the load file data, in load order.
    ///
    /// `Descriptor` and `Debug` are not sent to the card and are excluded.
    pub const LOAD_ORDER: [Component; 11] = [
        Component::Header,
        Component::Directory,
        Component::Import,
        Component::Applet,
        Component::Class,
        Component::Method,
        Component::StaticField,
        Component::Export,
        Component::ConstantPool,
        Component::RefLocation,
        Component::StaticResources,
    ];

    /// Component tag byte.
    pub fn tag(self) -> u8 {
        match self {
            Component::Header => 1,
            Component::Directory => 2,
            Component::Applet => 3,
            Component::Import => 4,
            Component::ConstantPool => 5,
            Component::Class => 6,
            Component::Method => 7,
            Component::StaticField => 8,
            Component::RefLocation => 9,
            Component::Export => 10,
            Component::Descriptor => 11,
            Component::Debug => 12,
            Component::StaticResources => 13,
        }
    }

    /// File name of the component inside the `javacard/` directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Component::Header => "Header.cap",
            Component::Directory => "Directory.cap",
            Component::Applet => "Applet.cap",
            Component::Import => "Import.cap",
            Component::ConstantPool => "ConstantPool.cap",
            Component::Class => "Class.cap",
            Component::Method => "Method.cap",
            Component::StaticField => "StaticField.cap",
            Component::RefLocation => "RefLocation.cap",
            Component::Export => "Export.cap",
            Component::Descriptor => "Descriptor.cap",
            Component::Debug => "Debug.cap",
            Component::StaticResources => "StaticResources.cap",
        }
    }

    fn from_entry_name(entry: &str) -> Option<Self> {
        let mut parts = entry.rsplit('/');
        let file = parts.next()?;
        if parts.next()? != "javacard" {
            return None;
        }
        Self::ALL.into_iter().find(|c| c.file_name() == file)
    }
}

/// Digest used for the load file data hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// SHA-1 (20 bytes)
    Sha1,
    /// SHA-256 (32 bytes)
    Sha256,
}

impl HashAlgorithm {
    fn digest<'a>(self, parts: impl IntoIterator<Item = &'a [u8]>) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => {
                let mut hasher = Sha1::new();
                parts.into_iter().for_each(|p| hasher.update(p));
                hasher.finalize().to_vec()
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                parts.into_iter().for_each(|p| hasher.update(p));
                hasher.finalize().to_vec()
            }
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => f.write_str("SHA-1"),
            HashAlgorithm::Sha256 => f.write_str("SHA-256"),
        }
    }
}

/// Parsed `Header.cap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// CAP format version as (major, minor).
    pub format_version: (u8, u8),
    /// Header flags (`ACC_INT`, `ACC_EXPORT`, `ACC_APPLET`, ...).
    pub flags: u8,
    /// Package version as (major, minor).
    pub package_version: (u8, u8),
    /// Package AID.
    pub package_aid: Aid,
    /// Package name in dotted form, when the header carries one.
    pub package_name: Option<String>,
}

/// One entry of `Import.cap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedPackage {
    /// AID of the imported package.
    pub aid: Aid,
    /// Imported version as (major, minor).
    pub version: (u8, u8),
}

/// An opened CAP file.
#[derive(Debug, Clone)]
pub struct CapFile {
    /// All archive entries by name. Add DAP blocks here.
    pub entries: BTreeMap<String, Vec<u8>>,
    /// Entry names as they appeared in the source archive.
    order: Vec<String>,
    components: BTreeMap<Component, String>,
    header: Header,
    imports: Vec<ImportedPackage>,
    manifest: BTreeMap<String, String>,
}

impl CapFile {
    /// Open a CAP file from its archive bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Zip`] if the bytes are not a zip archive and
    /// [`Error::Cap`] if the Header component is missing or malformed, or
    /// the archive holds more than one package.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = BTreeMap::new();
        let mut order = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            // the declared size is not trusted for allocation
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            let name = file.name().to_string();
            if entries.insert(name.clone(), data).is_none() {
                order.push(name);
            }
        }
        let mut cap = Self::from_entries(entries)?;
        cap.order = order;
        Ok(cap)
    }

    /// Open a CAP file from a reader.
    ///
    /// # Errors
    ///
    /// See [`CapFile::from_bytes`]; read failures are returned as I/O errors.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Open a CAP file from disk.
    ///
    /// # Errors
    ///
    /// See [`CapFile::from_bytes`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    fn from_entries(entries: BTreeMap<String, Vec<u8>>) -> Result<Self> {
        let mut components = BTreeMap::new();
        for name in entries.keys() {
            if let Some(component) = Component::from_entry_name(name) {
                if let Some(previous) = components.insert(component, name.clone()) {
                    return Err(Error::Cap(format!(
                        "More than one package in CAP: {previous} and {name}"
                    )));
                }
            }
        }

        let header_entry = components
            .get(&Component::Header)
            .ok_or_else(|| Error::Cap("Header component missing".into()))?;
        let header = parse_header(&entries[header_entry])?;

        let imports = match components.get(&Component::Import) {
            Some(entry) => parse_imports(&entries[entry])?,
            None => Vec::new(),
        };

        let manifest = entries
            .get(MANIFEST)
            .map(|bytes| parse_manifest(&String::from_utf8_lossy(bytes)))
            .unwrap_or_default();

        debug!(
            package = %header.package_aid,
            components = components.len(),
            imports = imports.len(),
            "Opened CAP file"
        );

        Ok(Self {
            entries,
            order: Vec::new(),
            components,
            header,
            imports,
            manifest,
        })
    }

    /// Parsed Header component.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// AID of the package.
    pub fn package_aid(&self) -> &Aid {
        &self.header.package_aid
    }

    /// Dotted package name, from the manifest or else the Header component.
    pub fn package_name(&self) -> Option<&str> {
        self.manifest
            .get(PACKAGE_NAME_ATTRIBUTE)
            .map(String::as_str)
            .or(self.header.package_name.as_deref())
    }

    /// Packages listed in the Import component.
    pub fn imports(&self) -> &[ImportedPackage] {
        &self.imports
    }

    /// Main attributes of the jar manifest.
    pub fn manifest(&self) -> &BTreeMap<String, String> {
        &self.manifest
    }

    /// Raw bytes of a component, if present.
    pub fn component(&self, component: Component) -> Option<&[u8]> {
        self.components
            .get(&component)
            .and_then(|name| self.entries.get(name))
            .map(Vec::as_slice)
    }

    /// Components present in this file, in tag order.
    pub fn components(&self) -> impl Iterator<Item = (Component, &[u8])> {
        self.components
            .iter()
            .filter_map(|(c, name)| Some((*c, self.entries.get(name)?.as_slice())))
    }

    /// Concatenation of the load file components, in load order.
    pub fn load_file_data(&self) -> Vec<u8> {
        Component::LOAD_ORDER
            .into_iter()
            .filter_map(|c| self.component(c))
            .flatten()
            .copied()
            .collect()
    }

    /// Hash over the load file data; this is what DAP blocks sign.
    pub fn load_file_data_hash(&self, algorithm: HashAlgorithm) -> Vec<u8> {
        algorithm.digest(
            Component::LOAD_ORDER
                .into_iter()
                .filter_map(|c| self.component(c)),
        )
    }

    /// Entry names in the order [`CapFile::store`] writes them: entries of
    /// the source archive in their original order, then added entries by
    /// name. Removed entries are skipped.
    pub fn entry_order(&self) -> Vec<&str> {
        let original = self
            .order
            .iter()
            .filter(|name| self.entries.contains_key(name.as_str()));
        let added = self
            .entries
            .keys()
            .filter(|name| !self.order.contains(name));
        original.chain(added).map(String::as_str).collect()
    }

    /// Write the archive, including any entries added since opening.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Zip`] or [`Error::Io`] if writing fails.
    pub fn store<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default();
        for name in self.entry_order() {
            zip.start_file(name, options)?;
            zip.write_all(&self.entries[name])?;
        }
        zip.finish()?;
        Ok(())
    }

    /// Write the archive to `path`, replacing it atomically.
    ///
    /// The archive is written to a temporary file next to `path` and renamed
    /// over it, so an existing file is untouched if writing fails.
    ///
    /// # Errors
    ///
    /// See [`CapFile::store`]. Also fails if the temporary file cannot be
    /// created or renamed.
    pub fn store_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        if let Ok(existing) = std::fs::metadata(path) {
            temp.as_file().set_permissions(existing.permissions())?;
        }
        self.store(temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| {
            Error::Io(io::Error::new(
                e.error.kind(),
                format!("Could not replace {}: {}", path.display(), e.error),
            ))
        })?;
        debug!(path = %path.display(), "Stored CAP file");
        Ok(())
    }
}

fn truncated(component: Component) -> impl Fn(crate::reader::OutOfBounds) -> Error {
    move |e| Error::Cap(format!("{} component: {e}", component.file_name()))
}

/// Check the tag and read the size of a component, returning its body.
fn component_body(bytes: &[u8], component: Component) -> Result<ByteReader<'_>> {
    let mut r = ByteReader::new(bytes);
    let tag = r.read_u8().map_err(truncated(component))?;
    if tag != component.tag() {
        return Err(Error::Cap(format!(
            "{} has tag {tag}, expected {}",
            component.file_name(),
            component.tag()
        )));
    }
    let size = r.read_u16().map_err(truncated(component))?;
    let body = r.read_bytes(usize::from(size)).map_err(truncated(component))?;
    Ok(ByteReader::new(body))
}

fn parse_header(bytes: &[u8]) -> Result<Header> {
    let c = Component::Header;
    let mut r = component_body(bytes, c)?;

    let magic = r.read_u32().map_err(truncated(c))?;
    if magic != HEADER_MAGIC {
        return Err(Error::Cap(format!("Bad header magic {magic:08X}")));
    }
    let minor = r.read_u8().map_err(truncated(c))?;
    let major = r.read_u8().map_err(truncated(c))?;
    let flags = r.read_u8().map_err(truncated(c))?;

    let pkg_minor = r.read_u8().map_err(truncated(c))?;
    let pkg_major = r.read_u8().map_err(truncated(c))?;
    let aid_len = r.read_u8().map_err(truncated(c))?;
    let aid = r.read_bytes(usize::from(aid_len)).map_err(truncated(c))?;
    let package_aid = Aid::new(aid)?;

    // package_name_info only exists from format 2.2 on, and may be empty
    let package_name = if r.remaining() > 0 {
        let len = r.read_u8().map_err(truncated(c))?;
        let name = r.read_bytes(usize::from(len)).map_err(truncated(c))?;
        (!name.is_empty()).then(|| String::from_utf8_lossy(name).replace('/', "."))
    } else {
        None
    };

    Ok(Header {
        format_version: (major, minor),
        flags,
        package_version: (pkg_major, pkg_minor),
        package_aid,
        package_name,
    })
}

fn parse_imports(bytes: &[u8]) -> Result<Vec<ImportedPackage>> {
    let c = Component::Import;
    let mut r = component_body(bytes, c)?;
    let count = r.read_u8().map_err(truncated(c))?;
    let mut imports = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let minor = r.read_u8().map_err(truncated(c))?;
        let major = r.read_u8().map_err(truncated(c))?;
        let len = r.read_u8().map_err(truncated(c))?;
        let aid = Aid::new(r.read_bytes(usize::from(len)).map_err(truncated(c))?)?;
        imports.push(ImportedPackage {
            aid,
            version: (major, minor),
        });
    }
    Ok(imports)
}

/// Main section of a jar manifest. Continuation lines start with one space.
fn parse_manifest(text: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    let mut current: Option<(String, String)> = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(' ') {
            if let Some((_, value)) = current.as_mut() {
                value.push_str(rest);
            }
            continue;
        }
        if let Some((key, value)) = current.take() {
            attributes.insert(key, value);
        }
        if line.is_empty() {
            // end of the main section
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            current = Some((key.trim().to_string(), value.trim_start().to_string()));
        }
    }
    if let Some((key, value)) = current {
        attributes.insert(key, value);
    }
    attributes
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn header_bytes(aid: &[u8], name: &str) -> Vec<u8> {
        let mut body = vec![0xDE, 0xCA, 0xFF, 0xED, 1, 2, 0x04, 0, 1, aid.len() as u8];
        body.extend_from_slice(aid);
        body.push(name.len() as u8);
        body.extend_from_slice(name.as_bytes());
        let mut out = vec![1, 0, body.len() as u8];
        out.extend(body);
        out
    }

    fn import_bytes(aids: &[&[u8]]) -> Vec<u8> {
        let mut body = vec![aids.len() as u8];
        for aid in aids {
            body.extend_from_slice(&[0, 1, aid.len() as u8]);
            body.extend_from_slice(aid);
        }
        let mut out = vec![4, 0, body.len() as u8];
        out.extend(body);
        out
    }

    fn sample() -> BTreeMap<String, Vec<u8>> {
        let mut entries = BTreeMap::new();
        entries.insert(
            "com/example/javacard/Header.cap".to_string(),
            header_bytes(&[0xA0, 0, 0, 0, 0x01, 0x01], "com/example"),
        );
        entries.insert(
            "com/example/javacard/Import.cap".to_string(),
            import_bytes(&[&[0xA0, 0, 0, 0, 0x62, 0, 1]]),
        );
        entries.insert(
            "com/example/javacard/Method.cap".to_string(),
            vec![7, 0, 2, 0xAA, 0xBB],
        );
        entries.insert(
            "com/example/javacard/Descriptor.cap".to_string(),
            vec![11, 0, 1, 0xCC],
        );
        entries
    }

    /// Small single-package CAP importing `java.lang`.
    pub(crate) fn sample_cap() -> CapFile {
        CapFile::from_entries(sample()).unwrap()
    }

    #[test]
    fn parses_header_and_imports() {
        let cap = CapFile::from_entries(sample()).unwrap();
        assert_eq!(cap.header().format_version, (2, 1));
        assert_eq!(cap.header().package_version, (1, 0));
        assert_eq!(cap.package_aid().to_string(), "A00000000101");
        assert_eq!(cap.package_name(), Some("com.example"));
        assert_eq!(cap.imports().len(), 1);
        assert_eq!(cap.imports()[0].aid.to_string(), "A0000000620001");
    }

    #[test]
    fn manifest_name_wins_over_header() {
        let mut entries = sample();
        entries.insert(
            MANIFEST.to_string(),
            b"Manifest-Version: 1.0\r\nJava-Card-Package-Name: com.exa\r\n mple.applet\r\n\r\nName: x\r\n"
                .to_vec(),
        );
        let cap = CapFile::from_entries(entries).unwrap();
        assert_eq!(cap.package_name(), Some("com.example.applet"));
        assert_eq!(cap.manifest().get("Manifest-Version").map(String::as_str), Some("1.0"));
        assert!(!cap.manifest().contains_key("Name"));
    }

    #[test]
    fn load_file_data_skips_descriptor() {
        let cap = CapFile::from_entries(sample()).unwrap();
        let data = cap.load_file_data();
        let header = cap.component(Component::Header).unwrap();
        let import = cap.component(Component::Import).unwrap();
        let method = cap.component(Component::Method).unwrap();
        assert_eq!(data, [header, import, method].concat());

        let expected = Sha256::digest(&data).to_vec();
        assert_eq!(cap.load_file_data_hash(HashAlgorithm::Sha256), expected);
        assert_eq!(cap.load_file_data_hash(HashAlgorithm::Sha1).len(), 20);
    }

    #[test]
    fn missing_header_is_rejected() {
        let mut entries = sample();
        entries.remove("com/example/javacard/Header.cap");
        assert!(matches!(CapFile::from_entries(entries), Err(Error::Cap(_))));
    }

    #[test]
    fn two_packages_are_rejected() {
        let mut entries = sample();
        entries.insert(
            "org/other/javacard/Header.cap".to_string(),
            header_bytes(&[0xA0, 0, 0, 0, 0x02, 0x02], ""),
        );
        assert!(matches!(CapFile::from_entries(entries), Err(Error::Cap(_))));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let mut entries = sample();
        entries.insert(
            "com/example/javacard/Header.cap".to_string(),
            vec![1, 0, 10, 0xDE, 0xCA],
        );
        assert!(matches!(CapFile::from_entries(entries), Err(Error::Cap(_))));
    }

    #[test]
    fn store_then_reopen_keeps_added_entries() {
        let mut cap = CapFile::from_entries(sample()).unwrap();
        cap.entries
            .insert("META-INF/dap.rsa.sha1".to_string(), vec![1, 2, 3]);

        let mut out = Cursor::new(Vec::new());
        cap.store(&mut out).unwrap();
        let reopened = CapFile::from_bytes(out.get_ref()).unwrap();

        assert_eq!(reopened.entries, cap.entries);
        assert_eq!(
            reopened.load_file_data_hash(HashAlgorithm::Sha1),
            cap.load_file_data_hash(HashAlgorithm::Sha1)
        );
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut out);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        out.into_inner()
    }

    /// Archive with one empty stored entry whose ZIP64 field declares
    /// `declared` uncompressed bytes.
    fn zip_declaring_size(declared: u64) -> Vec<u8> {
        let name = b"x.bin";
        let mut out = Vec::new();
        // local file header
        out.extend_from_slice(&0x0403_4b50_u32.to_le_bytes());
        out.extend_from_slice(&[20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&[0; 12]); // crc, sizes
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(name);
        // central directory
        let cd_start = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50_u32.to_le_bytes());
        out.extend_from_slice(&[45, 0, 45, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&[0; 8]); // crc, compressed size
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&12u16.to_le_bytes());
        out.extend_from_slice(&[0; 12]);
        out.extend_from_slice(name);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&declared.to_le_bytes());
        let cd_size = out.len() as u32 - cd_start;
        // end of central directory
        out.extend_from_slice(&0x0605_4b50_u32.to_le_bytes());
        out.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]);
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_start.to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out
    }

    #[test]
    fn declared_entry_size_is_not_trusted() {
        // reading must not reserve what the header claims
        assert!(matches!(
            CapFile::from_bytes(&zip_declaring_size(u64::MAX)),
            Err(Error::Cap(_))
        ));
    }

    #[test]
    fn store_keeps_source_order() {
        let entries = sample();
        let header = "com/example/javacard/Header.cap";
        let method = "com/example/javacard/Method.cap";
        let import = "com/example/javacard/Import.cap";
        let bytes = zip_of(&[
            (MANIFEST, b"Manifest-Version: 1.0\r\n".as_slice()),
            (method, entries[method].as_slice()),
            (header, entries[header].as_slice()),
            (import, entries[import].as_slice()),
        ]);
        let mut cap = CapFile::from_bytes(&bytes).unwrap();
        cap.entries
            .insert("META-INF/dap.rsa.sha1".to_string(), vec![1]);
        cap.entries.remove(import);

        let mut out = Cursor::new(Vec::new());
        cap.store(&mut out).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(out.into_inner())).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, [MANIFEST, method, header, "META-INF/dap.rsa.sha1"]);
    }

    #[test]
    fn store_to_path_replaces_in_place() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("applet.cap");
        let mut cap = sample_cap();
        cap.store_to_path(&path).unwrap();

        cap.entries
            .insert("META-INF/dap.p256.sha1".to_string(), vec![9, 9]);
        cap.store_to_path(&path).unwrap();

        let reopened = CapFile::from_path(&path).unwrap();
        assert_eq!(reopened.entries, cap.entries);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["applet.cap"]);
    }

    #[test]
    fn failed_store_leaves_destination_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        // a directory cannot be replaced by the renamed archive
        let target = dir.path().join("applet.cap");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"keep").unwrap();

        assert!(matches!(
            sample_cap().store_to_path(&target),
            Err(Error::Io(_))
        ));
        assert_eq!(std::fs::read(target.join("keep")).unwrap(), b"keep");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
