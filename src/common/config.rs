/// Nesting limit applied when nothing else is configured.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Knobs for [crate::Decoder] and the typed unmarshal entry points in
/// [crate::de].
///
/// ```
/// use bencodec::DecoderConfig;
///
/// let config = DecoderConfig::default().with_max_depth(16).with_strict(true);
/// assert_eq!(config.max_depth, 16);
/// assert!(config.strict);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum number of nested lists/dicts before decoding fails with
    /// [crate::Error::NestingTooDeep].
    pub max_depth: usize,
    /// Unmarshal only. When false (the default) a record field whose value has
    /// the wrong shape, or whose key is absent, is left at its zero value.
    /// When true the mismatch fails with [crate::Error::TypeMismatch] and
    /// absent keys follow serde's own rules (`#[serde(default)]`, `Option`).
    pub strict: bool,
}

impl DecoderConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}
