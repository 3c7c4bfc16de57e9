//! JavaCard SDK releases and their per-release facts.
//!
//! Everything here is a pure function of the release. Adding a release means
//! adding a variant and one row to each table below.

use std::fmt;

/// Kind of artifact resolved by [`crate::JavaCardSdk::artifacts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// API jars to compile applets against.
    Api,
    /// Converter and verifier jars.
    Tools,
    /// Extra jars needed on the compiler classpath.
    Compiler,
    /// Classpath for the off-card verifier.
    Verifier,
}

/// JavaCard SDK release families, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JavaCardVersion {
    /// Unrecognized.
    None,
    /// 2.1.1
    V211,
    /// 2.1.2
    V212,
    /// 2.2.1
    V221,
    /// 2.2.2
    V222,
    /// 3.0.1
    V301,
    /// 3.0.4
    V304,
    /// 3.0.5
    V305,
    /// 3.1.0
    V310,
}

impl JavaCardVersion {
    /// Whether this is a 3.x SDK, which ships a single `tools.jar`.
    pub fn is_v3(self) -> bool {
        matches!(self, Self::V301 | Self::V304 | Self::V305 | Self::V310)
    }

    /// Whether this SDK ships an off-card verifier.
    pub fn has_verifier(self) -> bool {
        !matches!(self, Self::None | Self::V211)
    }

    /// Highest Java class file level the SDK's converter accepts.
    pub fn java_version(self) -> &'static str {
        match self {
            Self::V310 => "1.7",
            Self::V301 | Self::V304 | Self::V305 => "1.6",
            Self::V222 => "1.5",
            Self::V221 => "1.2",
            Self::None | Self::V211 | Self::V212 => "1.1",
        }
    }

    /// Artifact paths relative to the SDK root.
    pub fn artifacts(self, kind: ArtifactKind) -> &'static [&'static str] {
        match kind {
            ArtifactKind::Api => self.api_jars(),
            ArtifactKind::Tools => self.tool_jars(),
            ArtifactKind::Compiler => self.compiler_jars(),
            ArtifactKind::Verifier => self.verifier_jars(),
        }
    }

    fn api_jars(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::V211 => &["bin/api.jar"],
            Self::V212 => &["lib/api21.jar"],
            Self::V221 | Self::V222 => &["lib/api.jar"],
            Self::V301 => &["lib/api_classic.jar"],
            Self::V304 | Self::V305 => &["lib/api_classic.jar", "lib/api_classic_annotations.jar"],
            Self::V310 => &[
                "lib/api_classic-3.1.0.jar",
                "lib/api_classic_annotations-3.1.0.jar",
            ],
        }
    }

    fn tool_jars(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            // 2.1.1 has no verifier, only the converter
            Self::V211 => &["bin/converter.jar"],
            Self::V212 | Self::V221 | Self::V222 => &["lib/converter.jar", "lib/offcardverifier.jar"],
            Self::V301 | Self::V304 | Self::V305 | Self::V310 => &["lib/tools.jar"],
        }
    }

    fn compiler_jars(self) -> &'static [&'static str] {
        match self {
            Self::V304 => &["lib/tools.jar", "lib/api_classic_annotations.jar"],
            _ => &[],
        }
    }

    fn verifier_jars(self) -> &'static [&'static str] {
        match self {
            Self::None | Self::V211 => &[],
            Self::V212 | Self::V221 | Self::V222 => &["lib/offcardverifier.jar"],
            Self::V301 | Self::V304 | Self::V305 | Self::V310 => &["lib/tools.jar"],
        }
    }

    /// Export file directory relative to the SDK root.
    pub fn export_dir(self) -> &'static str {
        match self {
            Self::V212 => "api21_export_files",
            Self::V310 => "api_export_files_3.1.0",
            _ => "api_export_files",
        }
    }
}

impl fmt::Display for JavaCardVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "unknown",
            Self::V211 => "2.1.1",
            Self::V212 => "2.1.2",
            Self::V221 => "2.2.1",
            Self::V222 => "2.2.2",
            Self::V301 => "3.0.1",
            Self::V304 => "3.0.4",
            Self::V305 => "3.0.5",
            Self::V310 => "3.1.0",
        };
        f.write_str(s)
    }
}

/// Update level of a 3.0.5 SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Update {
    /// 3.0.5u1
    U1,
    /// 3.0.5u2
    U2,
    /// 3.0.5u3 or later
    U3,
}

/// Fine-grained SDK release: the version plus, for 3.0.5, the update level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Release {
    /// Release family.
    pub version: JavaCardVersion,
    /// Update level; only set for 3.0.5.
    pub update: Option<Update>,
}

impl Release {
    /// A release without update level.
    pub fn plain(version: JavaCardVersion) -> Self {
        Self {
            version,
            update: None,
        }
    }

    /// A 3.0.5 release at the given update level.
    pub fn v305(update: Update) -> Self {
        Self {
            version: JavaCardVersion::V305,
            update: Some(update),
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.update {
            Some(Update::U1) => write!(f, "{}u1", self.version),
            Some(Update::U2) => write!(f, "{}u2", self.version),
            Some(Update::U3) => write!(f, "{}u3", self.version),
            None => write!(f, "{}", self.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_ordered() {
        assert!(JavaCardVersion::None < JavaCardVersion::V211);
        assert!(JavaCardVersion::V222 < JavaCardVersion::V301);
        assert!(JavaCardVersion::V305 < JavaCardVersion::V310);
        assert!(Release::v305(Update::U1) < Release::v305(Update::U3));
    }

    #[test]
    fn v3_family() {
        assert!(!JavaCardVersion::V222.is_v3());
        assert!(JavaCardVersion::V301.is_v3());
        assert!(JavaCardVersion::V310.is_v3());
    }

    #[test]
    fn tool_jars_per_generation() {
        assert_eq!(
            JavaCardVersion::V211.artifacts(ArtifactKind::Tools),
            ["bin/converter.jar"]
        );
        assert_eq!(
            JavaCardVersion::V222.artifacts(ArtifactKind::Tools),
            ["lib/converter.jar", "lib/offcardverifier.jar"]
        );
        assert_eq!(
            JavaCardVersion::V305.artifacts(ArtifactKind::Tools),
            ["lib/tools.jar"]
        );
    }

    #[test]
    fn api_jars_split_annotations() {
        assert_eq!(
            JavaCardVersion::V301.artifacts(ArtifactKind::Api),
            ["lib/api_classic.jar"]
        );
        assert_eq!(
            JavaCardVersion::V304.artifacts(ArtifactKind::Api),
            ["lib/api_classic.jar", "lib/api_classic_annotations.jar"]
        );
        assert_eq!(
            JavaCardVersion::V310.artifacts(ArtifactKind::Api),
            [
                "lib/api_classic-3.1.0.jar",
                "lib/api_classic_annotations-3.1.0.jar"
            ]
        );
    }

    #[test]
    fn only_304_has_compiler_jars() {
        assert_eq!(JavaCardVersion::V304.artifacts(ArtifactKind::Compiler).len(), 2);
        assert!(JavaCardVersion::V305.artifacts(ArtifactKind::Compiler).is_empty());
    }

    #[test]
    fn export_dirs() {
        assert_eq!(JavaCardVersion::V212.export_dir(), "api21_export_files");
        assert_eq!(JavaCardVersion::V305.export_dir(), "api_export_files");
        assert_eq!(JavaCardVersion::V310.export_dir(), "api_export_files_3.1.0");
    }

    #[test]
    fn java_levels() {
        assert_eq!(JavaCardVersion::V310.java_version(), "1.7");
        assert_eq!(JavaCardVersion::V305.java_version(), "1.6");
        assert_eq!(JavaCardVersion::V222.java_version(), "1.5");
        assert_eq!(JavaCardVersion::V221.java_version(), "1.2");
        assert_eq!(JavaCardVersion::V211.java_version(), "1.1");
    }

    #[test]
    fn release_display() {
        assert_eq!(Release::v305(Update::U3).to_string(), "3.0.5u3");
        assert_eq!(Release::plain(JavaCardVersion::V222).to_string(), "2.2.2");
        assert_eq!(JavaCardVersion::None.to_string(), "unknown");
    }
}
