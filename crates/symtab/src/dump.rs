//! Line grammar of the module introspection dump (`wasm-objdump -x` style).
//!
//! Only export entries are of interest:
//!
//! ```text
//!  - func[3] <_ZN3Foo3barEv> -> "foo_export"
//!  - memory[0] -> "memory"
//! ```
//!
//! Globals, function and import listings share the leading ` - ` but are
//! reported as [`DumpLine::Ignored`].

use regex::Regex;
use std::sync::OnceLock;

/// Prefixes the linker puts in front of imported names.
pub const IMPORT_PREFIXES: &[&str] = &["env.", "GOT.func."];

/// One export entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    /// Entity kind (`func`, `memory`, `global`, ...).
    pub kind: String,
    pub index: u32,
    /// Linker symbol from the `<...>` annotation, when present.
    pub symbol: Option<String>,
    /// Quoted export name.
    pub name: String,
}

impl ExportEntry {
    /// Name to demangle: the annotation if present, else the export name.
    pub fn mangled(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpLine {
    Blank,
    Export(ExportEntry),
    Ignored(String),
}

fn export_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^ - (\w+)\[(\d+)\](?: <([$\w.]+)>)? -> "([$\w.]+)"$"#)
            .expect("export line pattern is valid")
    })
}

impl DumpLine {
    pub fn parse(raw: &str) -> Self {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            return DumpLine::Blank;
        }

        let Some(caps) = export_pattern().captures(line) else {
            return DumpLine::Ignored(line.trim().to_string());
        };
        let Ok(index) = caps[2].parse::<u32>() else {
            return DumpLine::Ignored(line.trim().to_string());
        };

        DumpLine::Export(ExportEntry {
            kind: caps[1].to_string(),
            index,
            symbol: caps.get(3).map(|m| m.as_str().to_string()),
            name: caps[4].to_string(),
        })
    }
}

/// Strips leading [`IMPORT_PREFIXES`], repeatedly.
///
/// ```
/// # use symtab::dump::strip_import_prefix;
/// assert_eq!(strip_import_prefix("env.GOT.func.foo"), "foo");
/// assert_eq!(strip_import_prefix("environ"), "environ");
/// ```
pub fn strip_import_prefix(name: &str) -> &str {
    let mut name = name;
    while let Some(rest) = IMPORT_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
    {
        name = rest;
    }
    name
}
