//! Itanium C++ ABI demangling.

use cpp_demangle::{DemangleOptions, Symbol};

pub trait Demangler {
    /// Returns the readable form of `symbol`, or `symbol` itself when it is
    /// not a mangled name.
    fn demangle(&self, symbol: &str) -> String;
}

/// Prefixes of Itanium encodings. `cpp_demangle` also accepts bare type
/// encodings, so `f` would otherwise come back as `float`.
const ITANIUM_PREFIXES: &[&str] = &["_Z", "__Z"];

/// `c++filt` equivalent backed by `cpp_demangle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItaniumDemangler;

impl Demangler for ItaniumDemangler {
    fn demangle(&self, symbol: &str) -> String {
        if !ITANIUM_PREFIXES.iter().any(|p| symbol.starts_with(p)) {
            return symbol.to_string();
        }
        Symbol::new(symbol)
            .ok()
            .and_then(|sym| sym.demangle(&DemangleOptions::default()).ok())
            .unwrap_or_else(|| symbol.to_string())
    }
}

impl<F> Demangler for F
where
    F: Fn(&str) -> String,
{
    fn demangle(&self, symbol: &str) -> String {
        self(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demangles_nested_name() {
        assert_eq!(ItaniumDemangler.demangle("_ZN3Foo3barEv"), "Foo::bar()");
    }

    #[test]
    fn test_demangles_parameters() {
        assert_eq!(ItaniumDemangler.demangle("_Z3addii"), "add(int, int)");
    }

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(ItaniumDemangler.demangle("main"), "main");
        assert_eq!(ItaniumDemangler.demangle("emscripten_sleep"), "emscripten_sleep");
    }

    #[test]
    fn test_type_shaped_names_pass_through() {
        for name in ["f", "g", "i", "v", "a", "b", "Ss", "St"] {
            assert_eq!(ItaniumDemangler.demangle(name), name);
        }
    }
}
