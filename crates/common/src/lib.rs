//! Shared configuration for the asyncify import toolkit.
//!
//! - [`rules`]: library-prefix exclusion rules for the import resolver.
//! - [`logging`]: `tracing` subscriber setup shared by every binary.

pub mod logging;
pub mod rules;

pub use logging::{LogFormat, LogLevel, LogOptions};
pub use rules::{ExclusionRules, RulesError};
