use crate::error::LintResult;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Source of the CSS properties a utility class declares.
///
/// Used to corroborate the pattern-based conflict verdicts. An empty result
/// means "unknown"; the pattern rules decide in that case.
pub trait PropertyLookup {
    fn declared_properties(&self, class: &str) -> LintResult<Vec<String>>;
}

/// Class → declared property names, usually generated from a compiled
/// stylesheet and loaded from JSON:
///
/// ```json
/// { "mt-4": ["margin-top"], "my-2": ["margin-top", "margin-bottom"] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable {
    classes: HashMap<String, Vec<String>>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> LintResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> LintResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), classes = table.len(), "Loaded property table");
        Ok(table)
    }

    pub fn insert(&mut self, class: impl Into<String>, properties: Vec<String>) {
        self.classes.insert(class.into(), properties);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl PropertyLookup for PropertyTable {
    fn declared_properties(&self, class: &str) -> LintResult<Vec<String>> {
        Ok(self.classes.get(class).cloned().unwrap_or_default())
    }
}
