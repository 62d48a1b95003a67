//! Escape decoding for names in the advice log.
//!
//! The compiler writes function names with a handful of characters hex-escaped
//! (`\20` for a space, `\28` for `(`, ...). Only the codes in [`ESCAPES`] are
//! known; anything else left behind a backslash is an error, never dropped.

/// Known two-digit escape codes and the characters they stand for.
pub const ESCAPES: &[(&str, char)] = &[
    ("20", ' '),
    ("28", '('),
    ("29", ')'),
    ("2c", ','),
    ("5b", '['),
    ("5d", ']'),
];

/// Suffix some toolchains append to cloned or duplicated functions.
pub const CLONE_SUFFIX: &str = ".1";

/// A backslash sequence outside the escape table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEscape {
    /// The offending sequence, backslash included (may be truncated at end of input).
    pub sequence: String,
}

/// Resolves every escape sequence in `s`.
///
/// Strings without a backslash come back unchanged.
///
/// # Examples
/// ```
/// # use advice::unescape::unescape;
/// assert_eq!(unescape(r"Foo::bar\28int\29").unwrap(), "Foo::bar(int)");
/// assert_eq!(unescape("plain").unwrap(), "plain");
/// assert!(unescape(r"bad\7e").is_err());
/// ```
pub fn unescape(s: &str) -> Result<String, UnresolvedEscape> {
    if !s.contains('\\') {
        return Ok(s.to_string());
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let code = after.get(..2).unwrap_or(after);
        match ESCAPES.iter().find(|(c, _)| *c == code) {
            Some((_, ch)) => {
                out.push(*ch);
                rest = &after[2..];
            }
            None => {
                return Err(UnresolvedEscape {
                    sequence: format!("\\{}", code),
                });
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Removes a single trailing [`CLONE_SUFFIX`].
///
/// ```
/// # use advice::unescape::strip_clone_suffix;
/// assert_eq!(strip_clone_suffix("Foo::bar().1"), "Foo::bar()");
/// assert_eq!(strip_clone_suffix("Foo::bar().1.1"), "Foo::bar().1");
/// assert_eq!(strip_clone_suffix("vec11"), "vec11");
/// ```
pub fn strip_clone_suffix(name: &str) -> &str {
    name.strip_suffix(CLONE_SUFFIX).unwrap_or(name)
}
