use crate::artifact::QueryKind;

/// Module search or module-name completion request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleQuery {
    /// Search text, or the module-name prefix for completion.
    pub name: String,
    pub kind: QueryKind,
    /// Index of the first match to report.
    pub start: u64,
    /// Maximum number of matches to report; `None` is unbounded.
    pub count: Option<u64>,
}

impl ModuleQuery {
    pub fn new(name: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            start: 0,
            count: None,
        }
    }

    pub fn paged(mut self, start: u64, count: u64) -> Self {
        self.start = start;
        self.count = Some(count);
        self
    }

    /// Match index at which a paged search stops.
    pub fn end(&self) -> Option<u64> {
        self.count.map(|count| self.start.saturating_add(count))
    }
}

/// Version completion request for one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleVersionQuery {
    pub name: String,
    /// Only versions starting with this prefix.
    pub version: Option<String>,
    pub kind: QueryKind,
}

impl ModuleVersionQuery {
    pub fn new(name: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            name: name.into(),
            version: None,
            kind,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.version = Some(prefix.into());
        self
    }
}
