use core::fmt;

use crate::Error;

/// Parse events in production order.
///
/// A message produces `MessageBegin`, then the start line (`Method` + `Url`
/// for requests, `Status` for responses), then `HeaderField`/`HeaderValue`
/// pairs, `HeadersComplete`, any number of `BodyChunk`, trailers as further
/// `HeaderField`/`HeaderValue` pairs, and finally `MessageComplete`. An
/// `Error` can end the stream at any point.
///
/// The borrowed data is only valid for the duration of the sink call. It
/// points either into the chunk handed to `feed` or into the parser's token
/// buffer, which is reused for the next token.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    MessageBegin,
    /// Raw method token, i.e. `GET`.
    Method(&'a [u8]),
    /// Raw request target, not normalized.
    Url(&'a [u8]),
    /// Response status line.
    Status { code: u16, reason: &'a [u8] },
    /// Header name with the casing it was sent with.
    HeaderField(&'a [u8]),
    /// Header value. Leading and trailing spaces and tabs are stripped,
    /// everything in between is passed on byte for byte. Folded lines are
    /// joined with a single space.
    HeaderValue(&'a [u8]),
    HeadersComplete(Flags),
    /// A piece of body. Chunked framing is removed. `is_final` is set on the
    /// piece delivering the last byte of a content-length delimited body.
    BodyChunk { data: &'a [u8], is_final: bool },
    MessageComplete,
    Error(Error),
}

impl<'a> Event<'a> {
    /// Copy the event out of the parser's buffers.
    pub fn to_owned_event(&self) -> OwnedEvent {
        match *self {
            Event::MessageBegin => OwnedEvent::MessageBegin,
            Event::Method(v) => OwnedEvent::Method(v.to_vec()),
            Event::Url(v) => OwnedEvent::Url(v.to_vec()),
            Event::Status { code, reason } => OwnedEvent::Status {
                code,
                reason: reason.to_vec(),
            },
            Event::HeaderField(v) => OwnedEvent::HeaderField(v.to_vec()),
            Event::HeaderValue(v) => OwnedEvent::HeaderValue(v.to_vec()),
            Event::HeadersComplete(f) => OwnedEvent::HeadersComplete(f),
            Event::BodyChunk { data, is_final } => OwnedEvent::BodyChunk {
                data: data.to_vec(),
                is_final,
            },
            Event::MessageComplete => OwnedEvent::MessageComplete,
            Event::Error(e) => OwnedEvent::Error(e),
        }
    }
}

/// Owned copy of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedEvent {
    MessageBegin,
    Method(Vec<u8>),
    Url(Vec<u8>),
    Status { code: u16, reason: Vec<u8> },
    HeaderField(Vec<u8>),
    HeaderValue(Vec<u8>),
    HeadersComplete(Flags),
    BodyChunk { data: Vec<u8>, is_final: bool },
    MessageComplete,
    Error(Error),
}

/// Receiver of parse events.
///
/// Called synchronously from inside `feed`, in production order. Implemented
/// for closures and for `Vec<OwnedEvent>`, which acts as a queue the caller
/// drains between calls.
pub trait Sink {
    fn event(&mut self, event: Event<'_>);
}

impl<F> Sink for F
where
    F: FnMut(Event<'_>),
{
    fn event(&mut self, event: Event<'_>) {
        self(event)
    }
}

impl Sink for Vec<OwnedEvent> {
    fn event(&mut self, event: Event<'_>) {
        self.push(event.to_owned_event());
    }
}

bitflags::bitflags! {
    /// Properties of a message head, reported with
    /// [`Event::HeadersComplete`] and by [`Parser::flags`][crate::Parser::flags].
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// Body uses chunked transfer-encoding.
        const CHUNKED = 1 << 0;
        /// `Connection: keep-alive` was sent.
        const CONNECTION_KEEP_ALIVE = 1 << 1;
        /// `Connection: close` was sent.
        const CONNECTION_CLOSE = 1 << 2;
        /// Parsing trailers after the last chunk.
        const TRAILING = 1 << 3;
        /// The connection switches protocol after this head.
        const UPGRADE = 1 << 4;
        /// The response has no body regardless of its framing headers.
        const SKIP_BODY = 1 << 5;
    }
}

impl Flags {
    pub fn is_chunked(&self) -> bool {
        self.contains(Flags::CHUNKED)
    }

    pub fn is_upgrade(&self) -> bool {
        self.contains(Flags::UPGRADE)
    }
}

fn fmt_bytes(f: &mut fmt::DebugTuple<'_, '_>, v: &[u8]) {
    match core::str::from_utf8(v) {
        Ok(s) => f.field(&s),
        Err(_) => f.field(&v),
    };
}

impl<'a> fmt::Debug for Event<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::MessageBegin => write!(f, "MessageBegin"),
            Event::Method(v) => {
                let mut t = f.debug_tuple("Method");
                fmt_bytes(&mut t, v);
                t.finish()
            }
            Event::Url(v) => {
                let mut t = f.debug_tuple("Url");
                fmt_bytes(&mut t, v);
                t.finish()
            }
            Event::Status { code, reason } => f
                .debug_struct("Status")
                .field("code", code)
                .field("reason", &String::from_utf8_lossy(reason))
                .finish(),
            Event::HeaderField(v) => {
                let mut t = f.debug_tuple("HeaderField");
                fmt_bytes(&mut t, v);
                t.finish()
            }
            Event::HeaderValue(v) => {
                let mut t = f.debug_tuple("HeaderValue");
                fmt_bytes(&mut t, v);
                t.finish()
            }
            Event::HeadersComplete(flags) => f.debug_tuple("HeadersComplete").field(flags).finish(),
            Event::BodyChunk { data, is_final } => f
                .debug_struct("BodyChunk")
                .field("len", &data.len())
                .field("is_final", is_final)
                .finish(),
            Event::MessageComplete => write!(f, "MessageComplete"),
            Event::Error(e) => f.debug_tuple("Error").field(e).finish(),
        }
    }
}
