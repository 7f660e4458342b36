//! Artifact naming and path convention.
//!
//! A module `com.example.foo` at version `1.0.0` lives at
//! `com/example/foo/1.0.0/` and its compiled archive is named
//! `com.example.foo-1.0.0.car`. The default module is unversioned:
//! `default/default.car`. Documentation uses fixed names regardless of
//! module and version.

use std::fmt;
use std::str::FromStr;

mod maven;

pub use maven::MavenCoordinates;


/// Name of the distinguished unversioned module.
pub const DEFAULT_MODULE: &str = "default";

/// Dependency descriptor stored next to a module's artifacts.
pub const MODULE_PROPERTIES: &str = "module.properties";

/// Suffix of the checksum sidecar written next to published artifacts.
pub const CHECKSUM_SUFFIX: &str = ".blake3";

// ─── Artifact Kinds ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Compiled module archive.
    Car,
    /// Plain archive.
    Jar,
    /// Script bundle.
    Js,
    /// Source archive.
    Src,
    /// Documentation folder.
    Docs,
    /// Compressed documentation.
    DocsZipped,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Car,
        ArtifactKind::Jar,
        ArtifactKind::Js,
        ArtifactKind::Src,
        ArtifactKind::Docs,
        ArtifactKind::DocsZipped,
    ];

    /// File suffix, or the whole fixed file name for documentation.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Car => ".car",
            ArtifactKind::Jar => ".jar",
            ArtifactKind::Js => ".js",
            ArtifactKind::Src => ".src",
            ArtifactKind::Docs => "module-doc",
            ArtifactKind::DocsZipped => "module-doc.zip",
        }
    }

    pub fn is_documentation(self) -> bool {
        matches!(self, ArtifactKind::Docs | ArtifactKind::DocsZipped)
    }

    /// Kind of a module artifact file, judged by suffix. Documentation is
    /// not a module artifact.
    pub fn of_file(name: &str) -> Option<ArtifactKind> {
        [
            ArtifactKind::Car,
            ArtifactKind::Jar,
            ArtifactKind::Js,
            ArtifactKind::Src,
        ]
        .into_iter()
        .find(|kind| name.ends_with(kind.suffix()))
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Car => "car",
            ArtifactKind::Jar => "jar",
            ArtifactKind::Js => "js",
            ArtifactKind::Src => "src",
            ArtifactKind::Docs => "docs",
            ArtifactKind::DocsZipped => "docs-zip",
        };
        f.write_str(name)
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArtifactKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| format!("unknown artifact kind '{}' (car, jar, js, src, docs, docs-zip)", s))
    }
}

/// Whether `name` is a module artifact file of any kind.
pub fn is_artifact(name: &str) -> bool {
    ArtifactKind::of_file(name).is_some()
}

/// Whether a folder label is the documentation folder, which never holds
/// modules.
pub fn is_documentation(label: &str) -> bool {
    label == ArtifactKind::Docs.suffix()
}

// ─── Query Kinds ───────────────────────────────────────────────────

/// Artifact family a search or completion is interested in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Compiled archives (`.car`, `.jar`).
    #[default]
    Jvm,
    Js,
    Src,
}

impl QueryKind {
    pub fn kinds(self) -> &'static [ArtifactKind] {
        match self {
            QueryKind::Jvm => &[ArtifactKind::Car, ArtifactKind::Jar],
            QueryKind::Js => &[ArtifactKind::Js],
            QueryKind::Src => &[ArtifactKind::Src],
        }
    }

    /// Whether the artifact file `name` belongs to this family.
    pub fn matches(self, name: &str) -> bool {
        self.kinds().iter().any(|kind| name.ends_with(kind.suffix()))
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Jvm => "jvm",
            QueryKind::Js => "js",
            QueryKind::Src => "src",
        };
        f.write_str(name)
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jvm" => Ok(QueryKind::Jvm),
            "js" => Ok(QueryKind::Js),
            "src" => Ok(QueryKind::Src),
            _ => Err(format!("unknown query kind '{}' (jvm, js, src)", s)),
        }
    }
}

// ─── Artifact Context ──────────────────────────────────────────────

/// A logical artifact request: module, version and kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactContext {
    pub name: String,
    /// Absent only for the default module.
    pub version: Option<String>,
    pub kind: ArtifactKind,
}

impl ArtifactContext {
    pub fn new(name: impl Into<String>, version: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            kind,
        }
    }

    pub fn default_module(kind: ArtifactKind) -> Self {
        Self {
            name: DEFAULT_MODULE.to_string(),
            version: None,
            kind,
        }
    }

    pub fn is_default_module(&self) -> bool {
        self.name == DEFAULT_MODULE
    }

    /// Tree path of the folder holding this artifact.
    pub fn path_segments(&self) -> Vec<String> {
        module_path_segments(&self.name, self.version.as_deref())
    }

    /// File name of this artifact inside its folder.
    pub fn artifact_name(&self) -> String {
        artifact_file_name(&self.name, self.version.as_deref(), self.kind)
    }
}

impl fmt::Display for ArtifactContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}/{} ({})", self.name, version, self.kind),
            None => write!(f, "{} ({})", self.name, self.kind),
        }
    }
}

/// The module name split on `.`, plus the version unless this is the
/// default module.
pub fn module_path_segments(name: &str, version: Option<&str>) -> Vec<String> {
    let mut segments: Vec<String> = name.split('.').map(str::to_string).collect();
    if name != DEFAULT_MODULE {
        if let Some(version) = version {
            segments.push(version.to_string());
        }
    }
    segments
}

/// Artifact file name: `name-version+suffix`, `name+suffix` for the default
/// module, or the fixed documentation name.
pub fn artifact_file_name(name: &str, version: Option<&str>, kind: ArtifactKind) -> String {
    if kind.is_documentation() {
        return kind.suffix().to_string();
    }
    match version {
        Some(version) if name != DEFAULT_MODULE => format!("{}-{}{}", name, version, kind.suffix()),
        _ => format!("{}{}", name, kind.suffix()),
    }
}
