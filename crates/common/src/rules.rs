//! Library-prefix exclusion rules.
//!
//! Some libraries contribute so many instrumented functions that listing
//! them would make the asyncify imports argument unmanageably long. Names
//! starting with one of these prefixes are dropped by the resolver.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Errors from loading exclusion rules.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid rules file: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Built-in prefixes: the C++ standard library, the C++ ABI runtime and the
/// bundled MT-32 emulator.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["std::", "void std::", "__cxxabiv1::", "MT32Emu::"];

/// Prefix rules as stored in a JSON rules file.
///
/// ```json
/// { "prefixes": ["std::", "Lua::"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRules {
    #[serde(default)]
    pub prefixes: Vec<String>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl ExclusionRules {
    /// Rules with no prefixes at all.
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Reads a JSON rules file.
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Appends prefixes, skipping empty strings and ones already present.
    pub fn extend<I, S>(&mut self, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for prefix in prefixes {
            let prefix = prefix.into();
            if !prefix.is_empty() && !self.prefixes.contains(&prefix) {
                self.prefixes.push(prefix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_rules_cover_std() {
        let rules = ExclusionRules::default();
        assert!(rules.prefixes.iter().any(|p| p == "std::"));
    }

    #[test]
    fn test_load_rules_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "prefixes": ["Lua::", "fluid_"] }}"#).unwrap();

        let rules = ExclusionRules::load(file.path()).unwrap();
        assert_eq!(rules.prefixes, vec!["Lua::", "fluid_"]);
    }

    #[test]
    fn test_load_rules_missing_key_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let rules = ExclusionRules::load(file.path()).unwrap();
        assert!(rules.prefixes.is_empty());
    }

    #[test]
    fn test_load_rules_rejects_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[not json").unwrap();

        let err = ExclusionRules::load(file.path()).unwrap_err();
        assert!(matches!(err, RulesError::JsonError(_)));
    }

    #[test]
    fn test_extend_dedups_and_skips_empty() {
        let mut rules = ExclusionRules::empty();
        rules.extend(["Lua::", "", "Lua::", "Ogg::"]);
        assert_eq!(rules.prefixes, vec!["Lua::", "Ogg::"]);
    }
}
