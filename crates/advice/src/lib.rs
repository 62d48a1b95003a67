//! # Advice Parser
//!
//! Reads the asyncify advice log emitted by the compiler and extracts:
//! - `callees`: callee → callers ("caller can change the state due to callee"),
//! - `functions`: every distinct instrumented function name.
//!
//! The log is machine-generated, so any line that is not an advice line
//! stops the run with an [`AdviceError`].

pub mod line;
pub mod stats;
pub mod unescape;

pub use line::{AdvisoryLine, LineError};
pub use stats::CallerStats;

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Errors from advice parsing. Line numbers are 1-based.
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("File corrupt: line {line} is not an asyncify advice line: {text:?}")]
    MissingMarker { line: usize, text: String },
    #[error("File corrupt: line {line} has an unrecognized advice shape: {text:?}")]
    UnrecognizedShape { line: usize, text: String },
    #[error("Unresolved escape {sequence:?} on line {line}: {text:?}")]
    UnresolvedEscape {
        line: usize,
        sequence: String,
        text: String,
    },
    #[error("Empty function name on line {line}")]
    EmptyName { line: usize },
}

/// Which advice line shapes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Caller/callee lines only; import and unknown advice lines are skipped.
    Strict,
    /// Caller/callee, initial-scan and import lines; anything else is fatal.
    Permissive,
}

impl ParseMode {
    pub fn default_order(self) -> FunctionOrder {
        match self {
            ParseMode::Strict => FunctionOrder::Encounter,
            ParseMode::Permissive => FunctionOrder::Sorted,
        }
    }
}

/// Ordering of the deduplicated function list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOrder {
    /// First-seen order.
    Encounter,
    /// Lexicographic order.
    Sorted,
}

/// Output of one parser run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdviceReport {
    /// Callee → callers in encounter order (duplicates kept).
    pub callees: BTreeMap<String, Vec<String>>,
    /// Deduplicated instrumented function names.
    pub functions: Vec<String>,
    /// Advice lines that were recognized but skipped.
    pub ignored: Vec<String>,
    /// Non-blank lines consumed.
    pub lines_read: usize,
}

impl AdviceReport {
    pub fn callers_of(&self, callee: &str) -> &[String] {
        self.callees.get(callee).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats(&self) -> CallerStats {
        CallerStats::from_callees(&self.callees)
    }

    /// Writes `functions` as a pretty-printed JSON array.
    pub fn write_functions(&self, path: &Path) -> Result<(), AdviceError> {
        let json = serde_json::to_string_pretty(&self.functions)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Single-pass advice log parser.
///
/// # Examples
/// ```
/// # use advice::{AdviceParser, ParseMode};
/// let report = AdviceParser::new(ParseMode::Strict)
///     .parse_lines(["[asyncify] Foo::bar() can change the state due to Baz::qux()"])
///     .unwrap();
/// assert_eq!(report.functions, vec!["Foo::bar()", "Baz::qux()"]);
/// assert_eq!(report.callers_of("Baz::qux()"), ["Foo::bar()"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AdviceParser {
    mode: ParseMode,
    order: FunctionOrder,
}

impl AdviceParser {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            order: mode.default_order(),
        }
    }

    pub fn with_order(mut self, order: FunctionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn parse_lines<I, S>(&self, lines: I) -> Result<AdviceReport, AdviceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut acc = Accumulator::default();
        for (idx, line) in lines.into_iter().enumerate() {
            acc.feed(self.mode, idx + 1, line.as_ref())?;
        }
        Ok(acc.finish(self.order))
    }

    /// Streams lines from `reader`; stops at the first I/O or parse error.
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<AdviceReport, AdviceError> {
        let mut acc = Accumulator::default();
        for (idx, line) in reader.lines().enumerate() {
            acc.feed(self.mode, idx + 1, &line?)?;
        }
        Ok(acc.finish(self.order))
    }

    pub fn parse_file(&self, path: &Path) -> Result<AdviceReport, AdviceError> {
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }
}

#[derive(Default)]
struct Accumulator {
    callees: BTreeMap<String, Vec<String>>,
    functions: Vec<String>,
    seen: HashSet<String>,
    ignored: Vec<String>,
    lines_read: usize,
}

impl Accumulator {
    fn feed(&mut self, mode: ParseMode, line_no: usize, raw: &str) -> Result<(), AdviceError> {
        let parsed = AdvisoryLine::parse(raw).map_err(|e| match e {
            LineError::MissingMarker => AdviceError::MissingMarker {
                line: line_no,
                text: raw.to_string(),
            },
            LineError::UnresolvedEscape { sequence } => AdviceError::UnresolvedEscape {
                line: line_no,
                sequence,
                text: raw.to_string(),
            },
            LineError::EmptyName => AdviceError::EmptyName { line: line_no },
        })?;
        let Some(parsed) = parsed else {
            return Ok(());
        };
        self.lines_read += 1;

        match (parsed, mode) {
            (AdvisoryLine::DueTo { caller, callee }, _) => {
                tracing::trace!(%caller, %callee, "advice edge");
                self.remember(&caller);
                self.remember(&callee);
                self.callees.entry(callee).or_default().push(caller);
            }
            (AdvisoryLine::InitialScan { name }, _) => {
                self.remember(&name);
                self.callees
                    .entry(line::INITIAL_SCAN.to_string())
                    .or_default()
                    .push(name);
            }
            (AdvisoryLine::Import { name }, ParseMode::Permissive) => {
                self.remember(&name);
            }
            (AdvisoryLine::Import { name }, ParseMode::Strict) => {
                tracing::warn!(line = line_no, %name, "ignoring import advice line");
                self.ignored.push(raw.trim().to_string());
            }
            (AdvisoryLine::Other(text), ParseMode::Strict) => {
                tracing::warn!(line = line_no, %text, "ignoring advice line");
                self.ignored.push(raw.trim().to_string());
            }
            (AdvisoryLine::Other(text), ParseMode::Permissive) => {
                return Err(AdviceError::UnrecognizedShape {
                    line: line_no,
                    text,
                });
            }
        }
        Ok(())
    }

    fn remember(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.functions.push(name.to_string());
        }
    }

    fn finish(self, order: FunctionOrder) -> AdviceReport {
        let mut functions = self.functions;
        if order == FunctionOrder::Sorted {
            functions.sort();
        }
        tracing::info!(
            lines = self.lines_read,
            functions = functions.len(),
            callees = self.callees.len(),
            ignored = self.ignored.len(),
            "advice log parsed"
        );
        AdviceReport {
            callees: self.callees,
            functions,
            ignored: self.ignored,
            lines_read: self.lines_read,
        }
    }
}
