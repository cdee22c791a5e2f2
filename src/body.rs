use http::Method;

use crate::error::Grammar;
use crate::header::HeadInfo;
use crate::{Config, Error};

/// How the body following a message head is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStrategy {
    /// No body is expected either due to the status, method or absent
    /// framing headers.
    NoBody,
    /// Delimited by content-length.
    Length(u64),
    /// Chunked transfer encoding
    Chunked,
    /// Expect remote to close at end of body.
    CloseDelimited,
}

/// Outcome of body selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Selection {
    pub strategy: BodyStrategy,
    /// Framing headers were present but overruled by method or status.
    pub skipped: bool,
    pub upgrade: bool,
}

impl BodyStrategy {
    pub(crate) fn for_request(
        method: Option<&Method>,
        head: &HeadInfo,
        config: &Config,
    ) -> Result<Selection, Error> {
        let is_connect = method == Some(&Method::CONNECT);
        let upgrade = is_connect || (head.upgrade && head.connection_upgrade);

        // A request transfer-encoding without chunked as the final coding
        // leaves no way of finding the end of the body.
        if head.transfer_encoding && !head.chunked {
            return Err(Error::InvalidGrammar(Grammar::TransferEncoding));
        }

        let strategy = match Self::header_defined(head, config)? {
            // Request bodies cannot be close delimited.
            Self::CloseDelimited => Self::NoBody,
            r => r,
        };

        Ok(Selection {
            strategy,
            skipped: false,
            upgrade,
        })
    }

    pub(crate) fn for_response(
        request_method: Option<&Method>,
        status_code: u16,
        head: &HeadInfo,
        config: &Config,
    ) -> Result<Selection, Error> {
        let is_success = (200..=299).contains(&status_code);
        let is_informational = (100..=199).contains(&status_code);
        let is_connect = request_method == Some(&Method::CONNECT);

        let upgrade = status_code == 101 || (is_success && is_connect);

        let has_no_body =
            // https://datatracker.ietf.org/doc/html/rfc2616#section-4.3
            // All responses to the HEAD request method
            // MUST NOT include a message-body, even though the presence of entity-
            // header fields might lead one to believe they do.
            request_method == Some(&Method::HEAD) ||
            // A client MUST ignore any Content-Length or Transfer-Encoding
            // header fields received in a successful response to CONNECT.
            is_success && is_connect ||
            // All 1xx (informational), 204 (no content), and 304 (not modified) responses
            // MUST NOT include a message-body.
            is_informational ||
            matches!(status_code, 204 | 304);

        if has_no_body {
            let skipped = head.content_length.is_some() || head.transfer_encoding;
            return Ok(Selection {
                strategy: Self::NoBody,
                skipped,
                upgrade,
            });
        }

        // https://datatracker.ietf.org/doc/html/rfc2616#section-4.3
        // All other responses do include a message-body, although it MAY be of zero length.
        let strategy = if head.transfer_encoding && !head.chunked {
            Self::CloseDelimited
        } else {
            Self::header_defined(head, config)?
        };

        Ok(Selection {
            strategy,
            skipped: false,
            upgrade,
        })
    }

    fn header_defined(head: &HeadInfo, config: &Config) -> Result<Self, Error> {
        if head.chunked {
            if head.content_length.is_some() && config.reject_ambiguous_length() {
                return Err(Error::InvalidGrammar(Grammar::AmbiguousLength));
            }

            // https://datatracker.ietf.org/doc/html/rfc2616#section-4.4
            // Messages MUST NOT include both a Content-Length header field and a
            // non-identity transfer-coding. If the message does include a non-
            // identity transfer-coding, the Content-Length MUST be ignored.
            return Ok(Self::Chunked);
        }

        if let Some(len) = head.content_length {
            return Ok(Self::Length(len));
        }

        Ok(Self::CloseDelimited)
    }

    /// The end of the body is only known when the connection closes.
    pub fn needs_eof(&self) -> bool {
        matches!(self, Self::CloseDelimited)
    }
}
