/// Default maximum length of a request target.
pub const DEFAULT_MAX_URL_LENGTH: usize = 8 * 1024;

/// Default maximum length of a header name.
pub const DEFAULT_MAX_HEADER_NAME_LENGTH: usize = 1024;

/// Default maximum length of a header value (after folding).
pub const DEFAULT_MAX_HEADER_VALUE_LENGTH: usize = 8 * 1024;

/// Default maximum number of headers and trailers in one message.
pub const DEFAULT_MAX_HEADERS: usize = 100;

/// Default maximum size of a single chunk in a chunked body.
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Limits and strictness knobs for a [`Parser`][crate::Parser].
///
/// ```
/// use trickle::Config;
///
/// let config = Config::new()
///     .with_max_url_length(2048)
///     .with_strict_line_terminators(false);
///
/// assert_eq!(config.max_url_length(), 2048);
/// assert!(!config.strict_line_terminators());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    max_url_length: usize,
    max_header_name_length: usize,
    max_header_value_length: usize,
    max_headers: usize,
    max_chunk_size: u64,
    strict_line_terminators: bool,
    reject_ambiguous_length: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_url_length: DEFAULT_MAX_URL_LENGTH,
            max_header_name_length: DEFAULT_MAX_HEADER_NAME_LENGTH,
            max_header_value_length: DEFAULT_MAX_HEADER_VALUE_LENGTH,
            max_headers: DEFAULT_MAX_HEADERS,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            strict_line_terminators: true,
            reject_ambiguous_length: false,
        }
    }
}

impl Config {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_url_length(mut self, len: usize) -> Self {
        self.max_url_length = len;
        self
    }

    #[must_use]
    pub fn with_max_header_name_length(mut self, len: usize) -> Self {
        self.max_header_name_length = len;
        self
    }

    /// Also bounds the reason phrase of a status line.
    #[must_use]
    pub fn with_max_header_value_length(mut self, len: usize) -> Self {
        self.max_header_value_length = len;
        self
    }

    /// Headers and trailers count towards the same maximum.
    #[must_use]
    pub fn with_max_headers(mut self, count: usize) -> Self {
        self.max_headers = count;
        self
    }

    #[must_use]
    pub fn with_max_chunk_size(mut self, size: u64) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Require CRLF line terminators. When `false`, a bare LF is accepted
    /// anywhere a CRLF is expected.
    #[must_use]
    pub fn with_strict_line_terminators(mut self, strict: bool) -> Self {
        self.strict_line_terminators = strict;
        self
    }

    /// Fail messages carrying both `Content-Length` and chunked
    /// `Transfer-Encoding` instead of letting chunked win.
    #[must_use]
    pub fn with_reject_ambiguous_length(mut self, reject: bool) -> Self {
        self.reject_ambiguous_length = reject;
        self
    }

    pub fn max_url_length(&self) -> usize {
        self.max_url_length
    }

    pub fn max_header_name_length(&self) -> usize {
        self.max_header_name_length
    }

    pub fn max_header_value_length(&self) -> usize {
        self.max_header_value_length
    }

    pub fn max_headers(&self) -> usize {
        self.max_headers
    }

    pub fn max_chunk_size(&self) -> u64 {
        self.max_chunk_size
    }

    pub fn strict_line_terminators(&self) -> bool {
        self.strict_line_terminators
    }

    pub fn reject_ambiguous_length(&self) -> bool {
        self.reject_ambiguous_length
    }
}
