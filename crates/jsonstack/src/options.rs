#![allow(clippy::struct_excessive_bools)]

/// Number of significant digits above which `DecimalMode::Auto` promotes a
/// decimal literal to a [`BigNumber`](crate::BigNumber).
pub const DEFAULT_FLOAT_DIGITS: u32 = 15;

/// Deepest container nesting accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// How decimal literals (numbers with a fraction or an exponent) are
/// materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalMode {
    /// Promote to a big number when the literal has more significant digits
    /// than [`ParserOptions::float_digits`], otherwise parse an exact `f64`.
    #[default]
    Auto,
    /// Always produce a correctly rounded `f64` parsed from the literal text.
    Float,
    /// Compute `mantissa × 10^exp` from the accumulated digits. This may
    /// differ from the correctly rounded value in the last bit.
    Fast,
    /// Always produce a big number.
    Big,
}

/// Configuration options for the scanner.
///
/// # Examples
///
/// ```rust
/// use jsonstack::{ParserOptions, Scanner};
///
/// let options = ParserOptions {
///     allow_comments: true,
///     allow_nan: true,
///     ..Default::default()
/// };
/// let scanner = Scanner::new(options);
/// ```
///
/// # Default
///
/// All flags default to `false`, `decimal_mode` to [`DecimalMode::Auto`] and
/// `float_digits` to [`DEFAULT_FLOAT_DIGITS`] and `max_depth` to
/// [`DEFAULT_MAX_DEPTH`].
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Whether `// line` and `/* block */` comments may appear wherever
    /// whitespace may.
    pub allow_comments: bool,

    /// Whether the literals `NaN`, `Infinity` and `-Infinity` are accepted.
    ///
    /// When `false`, these literals raise a numeric error.
    pub allow_nan: bool,

    /// Whether malformed Unicode inside strings is tolerated.
    ///
    /// When `true`, lone or truncated surrogate escapes and invalid UTF-8
    /// decode to U+FFFD, and a string still open at end of input is closed.
    pub allow_invalid_unicode: bool,

    /// Whether multiple whitespace-separated documents may follow each other
    /// in one stream, as in JSON Lines.
    ///
    /// ```json
    /// {"a":1} {"a":2}
    /// ```
    pub allow_multiple_values: bool,

    /// How decimal literals are materialized.
    pub decimal_mode: DecimalMode,

    /// Significant digit threshold for [`DecimalMode::Auto`].
    pub float_digits: u32,

    /// Deepest container nesting accepted; opening one more container raises
    /// [`StructuralError::TooDeep`](crate::StructuralError::TooDeep).
    pub max_depth: usize,

    #[cfg(any(test, feature = "fuzzing"))]
    /// Panic on errors instead of returning them.
    ///
    /// Enabled only in test builds to produce backtraces on parse failures.
    pub panic_on_error: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_comments: false,
            allow_nan: false,
            allow_invalid_unicode: false,
            allow_multiple_values: false,
            decimal_mode: DecimalMode::Auto,
            float_digits: DEFAULT_FLOAT_DIGITS,
            max_depth: DEFAULT_MAX_DEPTH,
            #[cfg(any(test, feature = "fuzzing"))]
            panic_on_error: false,
        }
    }
}

/// Configuration options for the value builder.
#[derive(Debug, Clone, Copy)]
pub struct BuilderOptions {
    /// Whether object keys are formed through the interner.
    ///
    /// # Default
    ///
    /// `true`
    pub cache_keys: bool,

    /// Whether string values short enough to be cache-eligible are formed
    /// through the interner.
    ///
    /// # Default
    ///
    /// `false`
    pub cache_strings: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            cache_keys: true,
            cache_strings: false,
        }
    }
}
