//! # Symbol Table Indexer
//!
//! Builds a demangled-name → export-name index from a module introspection
//! dump. Several mangled symbols can demangle to the same readable name, so
//! each key maps to a deduplicated list of variants in first-seen order.
//!
//! Dump lines outside the export grammar are reported and skipped; indexing
//! never fails on content, only on I/O.

pub mod demangle;
pub mod dump;

pub use demangle::{Demangler, ItaniumDemangler};
pub use dump::{DumpLine, ExportEntry};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SymtabError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// How export names are stored as variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantPrefix {
    /// `env.<name>`, the form the asyncify imports list expects.
    #[default]
    Env,
    /// The export name with import prefixes removed.
    Bare,
}

impl VariantPrefix {
    pub fn apply(self, name: &str) -> String {
        let name = dump::strip_import_prefix(name);
        match self {
            VariantPrefix::Env => format!("env.{}", name),
            VariantPrefix::Bare => name.to_string(),
        }
    }
}

/// Demangled name → variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `variant` under `demangled` unless it is already listed.
    ///
    /// ```
    /// # use symtab::SymbolIndex;
    /// let mut index = SymbolIndex::new();
    /// index.insert("f()", "A");
    /// index.insert("f()", "B");
    /// index.insert("f()", "A");
    /// assert_eq!(index.get("f()").unwrap(), ["A", "B"]);
    /// ```
    pub fn insert(&mut self, demangled: impl Into<String>, variant: impl Into<String>) {
        let variant = variant.into();
        let variants = self.entries.entry(demangled.into()).or_default();
        if !variants.contains(&variant) {
            variants.push(variant);
        }
    }

    pub fn get(&self, demangled: &str) -> Option<&[String]> {
        self.entries.get(demangled).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dumps the index as a pretty-printed JSON object.
    pub fn write_json(&self, path: &Path) -> Result<(), SymtabError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Result of indexing one dump.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub index: SymbolIndex,
    /// Export lines consumed.
    pub exports: usize,
    /// Non-blank lines outside the export grammar.
    pub ignored: Vec<String>,
}

pub struct SymbolIndexer<D = ItaniumDemangler> {
    demangler: D,
    prefix: VariantPrefix,
}

impl SymbolIndexer<ItaniumDemangler> {
    pub fn itanium(prefix: VariantPrefix) -> Self {
        Self::new(ItaniumDemangler, prefix)
    }
}

impl<D: Demangler> SymbolIndexer<D> {
    pub fn new(demangler: D, prefix: VariantPrefix) -> Self {
        Self { demangler, prefix }
    }

    pub fn index_lines<I, S>(&self, lines: I) -> IndexReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = IndexReport::default();
        for line in lines {
            self.feed(&mut report, line.as_ref());
        }
        self.finish(report)
    }

    /// Streams lines from `reader`. Bytes that are not UTF-8 are replaced,
    /// so only I/O failures end the run.
    pub fn index_reader<R: BufRead>(&self, mut reader: R) -> Result<IndexReport, SymtabError> {
        let mut report = IndexReport::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            self.feed(&mut report, &String::from_utf8_lossy(&buf));
        }
        Ok(self.finish(report))
    }

    pub fn index_file(&self, path: &Path) -> Result<IndexReport, SymtabError> {
        let file = File::open(path)?;
        self.index_reader(BufReader::new(file))
    }

    fn feed(&self, report: &mut IndexReport, raw: &str) {
        match DumpLine::parse(raw) {
            DumpLine::Blank => {}
            DumpLine::Export(entry) => {
                let demangled = self
                    .demangler
                    .demangle(dump::strip_import_prefix(entry.mangled()));
                let variant = self.prefix.apply(&entry.name);
                tracing::trace!(
                    kind = %entry.kind,
                    index = entry.index,
                    %demangled,
                    %variant,
                    "export"
                );
                report.index.insert(demangled, variant);
                report.exports += 1;
            }
            DumpLine::Ignored(text) => {
                tracing::debug!(%text, "ignoring dump line");
                report.ignored.push(text);
            }
        }
    }

    fn finish(&self, report: IndexReport) -> IndexReport {
        tracing::info!(
            exports = report.exports,
            symbols = report.index.len(),
            ignored = report.ignored.len(),
            "symbol index built"
        );
        report
    }
}
