//! Shape recognition for a single advice log line.

use crate::unescape::{strip_clone_suffix, unescape};

/// Prefix every advice line carries.
pub const MARKER: &str = "[asyncify] ";
/// Connective between a caller and the callee that makes it change state.
pub const DUE_TO: &str = "can change the state due to";
/// Trailer of a line naming an import that changes state.
pub const IMPORT_TRAILER: &str = "is an import that can change the state";
/// Pseudo-callee reported for functions found during the initial scan.
pub const INITIAL_SCAN: &str = "initial scan";

/// One recognized advice line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvisoryLine {
    /// `<caller> can change the state due to <callee>`
    DueTo { caller: String, callee: String },
    /// `<name> can change the state due to initial scan`
    InitialScan { name: String },
    /// `<name> is an import that can change the state`
    Import { name: String },
    /// Marker present, but none of the shapes above.
    Other(String),
}

/// Why a line could not be turned into an [`AdvisoryLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    MissingMarker,
    UnresolvedEscape { sequence: String },
    EmptyName,
}

impl AdvisoryLine {
    /// Parses one raw line. Blank lines yield `Ok(None)`.
    ///
    /// ```
    /// # use advice::AdvisoryLine;
    /// let line = AdvisoryLine::parse("[asyncify] main can change the state due to emscripten_sleep")
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(
    ///     line,
    ///     AdvisoryLine::DueTo { caller: "main".into(), callee: "emscripten_sleep".into() }
    /// );
    /// ```
    pub fn parse(raw: &str) -> Result<Option<Self>, LineError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let rest = raw
            .strip_prefix(MARKER)
            .ok_or(LineError::MissingMarker)?
            .trim();

        if let Some((left, right)) = rest.split_once(DUE_TO) {
            let caller = clean_name(left)?;
            let right = right.trim();
            if right == INITIAL_SCAN {
                return Ok(Some(AdvisoryLine::InitialScan { name: caller }));
            }
            let callee = clean_name(right)?;
            return Ok(Some(AdvisoryLine::DueTo { caller, callee }));
        }

        if let Some(left) = rest.strip_suffix(IMPORT_TRAILER) {
            return Ok(Some(AdvisoryLine::Import {
                name: clean_name(left)?,
            }));
        }

        Ok(Some(AdvisoryLine::Other(rest.to_string())))
    }
}

fn clean_name(raw: &str) -> Result<String, LineError> {
    let unescaped = unescape(raw.trim()).map_err(|e| LineError::UnresolvedEscape {
        sequence: e.sequence,
    })?;
    let name = strip_clone_suffix(unescaped.trim());
    if name.is_empty() {
        return Err(LineError::EmptyName);
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AdvisoryLine {
        AdvisoryLine::parse(raw).unwrap().unwrap()
    }

    #[test]
    fn test_due_to_line() {
        assert_eq!(
            parse("[asyncify] Foo::bar() can change the state due to Baz::qux()"),
            AdvisoryLine::DueTo {
                caller: "Foo::bar()".into(),
                callee: "Baz::qux()".into(),
            }
        );
    }

    #[test]
    fn test_escaped_names_are_decoded() {
        assert_eq!(
            parse(r"[asyncify] Foo::bar\28int\2c\20char\29 can change the state due to Baz::qux\28\29.1"),
            AdvisoryLine::DueTo {
                caller: "Foo::bar(int, char)".into(),
                callee: "Baz::qux()".into(),
            }
        );
    }

    #[test]
    fn test_initial_scan_line() {
        assert_eq!(
            parse("[asyncify] emscripten_sleep can change the state due to initial scan"),
            AdvisoryLine::InitialScan {
                name: "emscripten_sleep".into()
            }
        );
    }

    #[test]
    fn test_import_line() {
        assert_eq!(
            parse("[asyncify] env.invoke_vi is an import that can change the state"),
            AdvisoryLine::Import {
                name: "env.invoke_vi".into()
            }
        );
    }

    #[test]
    fn test_other_line_keeps_text() {
        assert_eq!(
            parse("[asyncify] removing instrumentation from foo"),
            AdvisoryLine::Other("removing instrumentation from foo".into())
        );
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(AdvisoryLine::parse("").unwrap(), None);
        assert_eq!(AdvisoryLine::parse("   \r").unwrap(), None);
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(
            AdvisoryLine::parse("warning: something else").unwrap_err(),
            LineError::MissingMarker
        );
        assert_eq!(
            AdvisoryLine::parse("[asyncify]no-space").unwrap_err(),
            LineError::MissingMarker
        );
    }

    #[test]
    fn test_unknown_escape_is_an_error() {
        assert_eq!(
            AdvisoryLine::parse(r"[asyncify] a\7e can change the state due to b").unwrap_err(),
            LineError::UnresolvedEscape {
                sequence: r"\7e".into()
            }
        );
    }

    #[test]
    fn test_empty_caller_is_an_error() {
        assert_eq!(
            AdvisoryLine::parse("[asyncify]  can change the state due to b").unwrap_err(),
            LineError::EmptyName
        );
    }
}
