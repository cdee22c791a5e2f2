use core::fmt;

use thiserror::Error;

/// Errors raised while parsing.
///
/// Every error is terminal for the message being parsed. The parser emits it
/// as [`Event::Error`][crate::Event::Error], returns it from the call that
/// detected it, and refuses further input until [`Parser::reset`][crate::Parser::reset].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("invalid grammar in {0}")]
    InvalidGrammar(Grammar),

    #[error("invalid chunk size")]
    InvalidChunkSize,

    #[error("{0} exceeds configured maximum length")]
    TokenTooLong(Token),

    #[error("more headers than configured maximum")]
    TooManyHeaders,

    #[error("stream ended before message was complete")]
    UnexpectedEof,

    #[error("parser already failed, reset required")]
    ParseAlreadyFailed,
}

impl Error {
    /// Short, stable name of the error kind.
    pub fn name(&self) -> &'static str {
        match self {
            Error::InvalidGrammar(_) => "InvalidGrammar",
            Error::InvalidChunkSize => "InvalidChunkSize",
            Error::TokenTooLong(_) => "TokenTooLong",
            Error::TooManyHeaders => "TooManyHeaders",
            Error::UnexpectedEof => "UnexpectedEof",
            Error::ParseAlreadyFailed => "ParseAlreadyFailed",
        }
    }
}

/// The grammar construct an [`Error::InvalidGrammar`] was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Method,
    Url,
    Version,
    Status,
    HeaderName,
    HeaderValue,
    /// CR not followed by LF, or bare LF in strict mode.
    LineEnding,
    ContentLength,
    TransferEncoding,
    /// Both content-length and chunked, with `reject_ambiguous_length` set.
    AmbiguousLength,
    /// Missing CRLF after chunk data.
    ChunkData,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grammar::Method => "method",
            Grammar::Url => "url",
            Grammar::Version => "http version",
            Grammar::Status => "status code",
            Grammar::HeaderName => "header name",
            Grammar::HeaderValue => "header value",
            Grammar::LineEnding => "line ending",
            Grammar::ContentLength => "content-length",
            Grammar::TransferEncoding => "transfer-encoding",
            Grammar::AmbiguousLength => "content-length with chunked transfer-encoding",
            Grammar::ChunkData => "chunk data",
        };
        f.write_str(s)
    }
}

/// The token an [`Error::TokenTooLong`] was raised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Method,
    Url,
    Reason,
    HeaderName,
    HeaderValue,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Token::Method => "method",
            Token::Url => "url",
            Token::Reason => "reason phrase",
            Token::HeaderName => "header name",
            Token::HeaderValue => "header value",
        };
        f.write_str(s)
    }
}
