//! # Import List Resolver
//!
//! Intersects the instrumented function list with the [`SymbolIndex`] and
//! produces the asyncify imports list, rendered as the single-quoted literal
//! the build passes on the compiler command line:
//!
//! ```text
//! '["env.foo","env.bar"]'
//! ```

use advice::unescape::strip_clone_suffix;
use aho_corasick::{AhoCorasick, Anchored, Input, StartKind};
use std::path::Path;
use symtab::SymbolIndex;

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid function list: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to build exclusion automaton: {0}")]
    AutomatonError(#[from] aho_corasick::BuildError),
}

/// Anchored prefix matcher over excluded library namespaces.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    automaton: AhoCorasick,
    prefixes: Vec<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(prefixes: I) -> Result<Self, ResolverError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        let automaton = AhoCorasick::builder()
            .start_kind(StartKind::Anchored)
            .build(&prefixes)?;
        Ok(Self {
            automaton,
            prefixes,
        })
    }

    /// A filter that excludes nothing.
    pub fn none() -> Result<Self, ResolverError> {
        Self::new(Vec::<String>::new())
    }

    /// True when `name` starts with any configured prefix.
    ///
    /// ```
    /// # use resolver::ExclusionFilter;
    /// let filter = ExclusionFilter::new(["std::"]).unwrap();
    /// assert!(filter.is_excluded("std::vector<int>::push_back"));
    /// assert!(!filter.is_excluded("Common::std::thing()"));
    /// ```
    pub fn is_excluded(&self, name: &str) -> bool {
        self.automaton
            .is_match(Input::new(name).anchored(Anchored::Yes))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Outcome of one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Variants of every resolved function, in function-list order.
    pub imports: Vec<String>,
    /// Function names dropped by the exclusion filter.
    pub excluded: Vec<String>,
    /// Function names with no export entry.
    pub missing: Vec<String>,
}

pub struct Resolver {
    filter: ExclusionFilter,
}

impl Resolver {
    pub fn new(filter: ExclusionFilter) -> Self {
        Self { filter }
    }

    /// Looks up every function in order. A trailing `.1` clone suffix is
    /// dropped first, so lists written by other tools resolve too.
    pub fn resolve<S: AsRef<str>>(&self, functions: &[S], index: &SymbolIndex) -> Resolution {
        let mut resolution = Resolution::default();

        for function in functions {
            let name = strip_clone_suffix(function.as_ref());
            if self.filter.is_excluded(name) {
                tracing::debug!(%name, "excluded by prefix");
                resolution.excluded.push(name.to_string());
                continue;
            }
            match index.get(name) {
                Some(variants) => {
                    tracing::debug!(%name, count = variants.len(), "found");
                    resolution.imports.extend(variants.iter().cloned());
                }
                None => {
                    tracing::debug!(%name, "not found (not an export?)");
                    resolution.missing.push(name.to_string());
                }
            }
        }

        tracing::info!(
            imports = resolution.imports.len(),
            excluded = resolution.excluded.len(),
            missing = resolution.missing.len(),
            "imports resolved"
        );
        resolution
    }
}

/// Reads a JSON array of function names.
pub fn read_function_list(path: &Path) -> Result<Vec<String>, ResolverError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Renders `imports` as `'["a","b"]'`.
///
/// The shape is consumed verbatim by the build, so an empty list still
/// renders as `'[""]'`.
///
/// ```
/// # use resolver::render_import_literal;
/// assert_eq!(render_import_literal(&["a", "b"]), r#"'["a","b"]'"#);
/// ```
pub fn render_import_literal<S: AsRef<str>>(imports: &[S]) -> String {
    let joined = imports
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\",\"");
    format!("'[\"{}\"]'", joined)
}

/// Writes the rendered literal without a trailing newline.
pub fn write_import_literal<S: AsRef<str>>(imports: &[S], path: &Path) -> Result<(), ResolverError> {
    std::fs::write(path, render_import_literal(imports))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn index() -> SymbolIndex {
        let mut index = SymbolIndex::new();
        index.insert("Foo::bar()", "env.foo_export");
        index.insert("Foo::bar()", "env.foo_export_alias");
        index.insert("Baz::qux()", "env.qux");
        index.insert("std::vector<int>::push_back", "env.push_back");
        index.insert("MT32Emu::Synth::render()", "env.render");
        index
    }

    fn default_filter() -> ExclusionFilter {
        ExclusionFilter::new(["std::", "MT32Emu::"]).unwrap()
    }

    #[test]
    fn test_all_variants_are_appended() {
        let resolution = Resolver::new(default_filter()).resolve(&["Foo::bar()", "Baz::qux()"], &index());
        assert_eq!(
            resolution.imports,
            vec!["env.foo_export", "env.foo_export_alias", "env.qux"]
        );
    }

    #[test]
    fn test_excluded_prefix_never_resolves() {
        let functions = ["std::vector<int>::push_back", "MT32Emu::Synth::render()", "Baz::qux()"];
        let resolution = Resolver::new(default_filter()).resolve(&functions, &index());

        assert_eq!(resolution.imports, vec!["env.qux"]);
        assert_eq!(resolution.excluded.len(), 2);
        assert!(!resolution.imports.iter().any(|i| i == "env.push_back"));
    }

    #[test]
    fn test_without_filter_std_is_kept() {
        let resolution = Resolver::new(ExclusionFilter::none().unwrap())
            .resolve(&["std::vector<int>::push_back"], &index());
        assert_eq!(resolution.imports, vec!["env.push_back"]);
    }

    #[test]
    fn test_missing_names_are_skipped() {
        let resolution = Resolver::new(default_filter()).resolve(&["internal_only()", "Baz::qux()"], &index());
        assert_eq!(resolution.imports, vec!["env.qux"]);
        assert_eq!(resolution.missing, vec!["internal_only()"]);
    }

    #[test]
    fn test_duplicates_are_kept_and_order_is_deterministic() {
        let functions = ["Baz::qux()", "Foo::bar()", "Baz::qux()"];
        let resolver = Resolver::new(default_filter());
        let first = resolver.resolve(&functions, &index());
        let second = resolver.resolve(&functions, &index());
        assert_eq!(first, second);
        assert_eq!(
            first.imports,
            vec!["env.qux", "env.foo_export", "env.foo_export_alias", "env.qux"]
        );
    }

    #[test]
    fn test_clone_suffix_is_dropped_before_lookup() {
        let functions = ["Baz::qux().1", "std::vector<int>::push_back.1", "Foo::bar().1.1"];
        let resolution = Resolver::new(default_filter()).resolve(&functions, &index());
        assert_eq!(resolution.imports, vec!["env.qux"]);
        assert_eq!(resolution.excluded, vec!["std::vector<int>::push_back"]);
        assert_eq!(resolution.missing, vec!["Foo::bar().1"]);
    }

    #[test]
    fn test_prefix_match_is_anchored() {
        let filter = default_filter();
        assert!(filter.is_excluded("std::"));
        assert!(!filter.is_excluded("void std::sort()"));
        assert!(!filter.is_excluded("Foo::std::bar()"));
    }

    #[test]
    fn test_empty_prefixes_are_dropped() {
        let filter = ExclusionFilter::new(["", "std::"]).unwrap();
        assert_eq!(filter.prefixes(), ["std::"]);
        assert!(!filter.is_excluded("Foo::bar()"));
    }

    #[test]
    fn test_render_two_elements() {
        assert_eq!(render_import_literal(&["a", "b"]), "'[\"a\",\"b\"]'");
    }

    #[test]
    fn test_render_single_and_empty() {
        assert_eq!(render_import_literal(&["env.f"]), "'[\"env.f\"]'");
        assert_eq!(render_import_literal::<&str>(&[]), "'[\"\"]'");
    }

    #[test]
    fn test_read_function_list_and_write_literal() {
        let mut list = NamedTempFile::new().unwrap();
        write!(list, "[\n  \"Foo::bar()\",\n  \"Baz::qux()\"\n]").unwrap();
        let functions = read_function_list(list.path()).unwrap();
        assert_eq!(functions, vec!["Foo::bar()", "Baz::qux()"]);

        let resolution = Resolver::new(default_filter()).resolve(&functions, &index());
        let out = NamedTempFile::new().unwrap();
        write_import_literal(&resolution.imports, out.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(out.path()).unwrap(),
            "'[\"env.foo_export\",\"env.foo_export_alias\",\"env.qux\"]'"
        );
    }

    #[test]
    fn test_read_function_list_rejects_objects() {
        let mut list = NamedTempFile::new().unwrap();
        write!(list, "{{\"a\": 1}}").unwrap();
        assert!(matches!(
            read_function_list(list.path()),
            Err(ResolverError::JsonError(_))
        ));
    }
}
