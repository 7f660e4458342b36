use std::fmt;

use super::ArtifactContext;

/// Maven coordinates of a module name such as `org.example:lib` or
/// `org.example.lib`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MavenCoordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
}

impl MavenCoordinates {
    /// Split the module name at its last `:`, or at its last `.` when it has
    /// no colon. `None` for a name without separator.
    pub fn from_context(context: &ArtifactContext) -> Option<Self> {
        let name = &context.name;
        let split = if name.contains(':') {
            name.rfind(':')
        } else {
            name.rfind('.')
        }?;
        let (group_id, artifact_id) = (&name[..split], &name[split + 1..]);
        if group_id.is_empty() || artifact_id.is_empty() {
            return None;
        }
        Some(Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: context.version.clone(),
        })
    }
}

impl fmt::Display for MavenCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        Ok(())
    }
}
