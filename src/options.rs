//! Parsing options shared across the Blocked Dataset Codec, Loader-Table
//! Codec, and Link Engine.

/// Parsing mode: how anomalies listed in spec §7 as "Reported but
/// non-fatal" are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Anomalies (unknown table type, unknown block type, library-module
    /// name collision, ...) are hard errors.
    Strict,
    /// Anomalies are downgraded to a logged warning and parsing continues
    /// with a best-effort value.
    Permissive,
}

impl Default for ParseMode {
    fn default() -> Self {
        ParseMode::Strict
    }
}

impl ParseMode {
    pub(crate) fn is_permissive(&self) -> bool {
        matches!(self, ParseMode::Permissive)
    }
}

/// Options controlling how the codec and link engine react to malformed or
/// unusual input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// The parsing mode to use.
    pub parse_mode: ParseMode,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            parse_mode: ParseMode::Strict,
        }
    }
}

impl ParseOptions {
    /// Creates new `ParseOptions` with default (strict) settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// `ParseOptions` with permissive mode enabled.
    pub fn permissive() -> Self {
        ParseOptions {
            parse_mode: ParseMode::Permissive,
        }
    }

    /// `ParseOptions` with strict mode enabled.
    pub fn strict() -> Self {
        ParseOptions {
            parse_mode: ParseMode::Strict,
        }
    }

    pub(crate) fn is_permissive(&self) -> bool {
        self.parse_mode.is_permissive()
    }
}

/// Helper trait easing permissive-mode fallbacks: when permissive, log the
/// error at `warn` and substitute a default/provided value; otherwise
/// propagate the original error.
pub(crate) trait Permissive<T, E> {
    fn or_permissive(self, opts: &ParseOptions, context: &str, value: T) -> core::result::Result<T, E>;
}

impl<T, E: core::fmt::Display> Permissive<T, E> for core::result::Result<T, E> {
    fn or_permissive(self, opts: &ParseOptions, context: &str, value: T) -> core::result::Result<T, E> {
        self.or_else(|e| {
            if opts.is_permissive() {
                #[cfg(feature = "log")]
                log::warn!("{context}: {e}, continuing with fallback value");
                Ok(value)
            } else {
                Err(e)
            }
        })
    }
}
