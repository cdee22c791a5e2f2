//! Incremental, sans-IO http/1.x message parser.
//!
//! trickle parses http/1.0 and http/1.1 requests and responses from bytes
//! handed to it in whatever pieces they arrive from the network. It never
//! performs IO itself. Each call to [`Parser::feed`] reports what it found as
//! [`Event`]s to a [`Sink`], and the sequence of events is the same no matter
//! how the input is split between calls.
//!
//! Events borrow from the input, or from a small buffer inside the parser for
//! tokens that straddle two chunks. Body data is always handed out straight
//! from the input, without copying.
//!
//! ```
//! use trickle::{Flags, Kind, OwnedEvent, Parser};
//!
//! let mut parser = Parser::new(Kind::Request);
//!
//! // Vec<OwnedEvent> is a sink that copies each event.
//! let mut events: Vec<OwnedEvent> = Vec::new();
//!
//! let consumed = parser.feed(b"GET /path HTTP/1.1\r\nHo", &mut events)?;
//! assert_eq!(consumed, 22);
//!
//! let consumed = parser.feed(b"st: example.com\r\n\r\n", &mut events)?;
//! assert_eq!(consumed, 19);
//!
//! assert_eq!(
//!     events,
//!     vec![
//!         OwnedEvent::MessageBegin,
//!         OwnedEvent::Method(b"GET".to_vec()),
//!         OwnedEvent::Url(b"/path".to_vec()),
//!         OwnedEvent::HeaderField(b"Host".to_vec()),
//!         OwnedEvent::HeaderValue(b"example.com".to_vec()),
//!         OwnedEvent::HeadersComplete(Flags::empty()),
//!         OwnedEvent::MessageComplete,
//!     ]
//! );
//!
//! assert!(parser.is_complete());
//! assert!(parser.should_keep_alive());
//!
//! // Ready for the next message on the same connection.
//! parser.reset();
//! # Ok::<(), trickle::Error>(())
//! ```
//!
//! # Bodies
//!
//! The body is delimited by, in order of precedence:
//!
//! 1. The method or status. Responses to `HEAD`, 1xx, 204 and 304 have no body.
//! 2. `Transfer-Encoding: chunked`. This wins over `Content-Length` unless
//!    [`Config::with_reject_ambiguous_length`] is set.
//! 3. `Content-Length`.
//! 4. Requests without either have no body. Responses read until the
//!    connection closes, which is signalled with [`Parser::finish`].
//!
//! # Limits
//!
//! Every token buffered by the parser is bounded, see [`Config`].

#[macro_use]
extern crate log;

// Re-export the types used in the parser API.
pub use http;

mod body;
mod chunk;
mod config;
mod cursor;
mod error;
mod event;
mod header;
mod parser;
mod util;

pub use body::BodyStrategy;
pub use config::Config;
pub use cursor::Position;
pub use error::{Error, Grammar, Token};
pub use event::{Event, Flags, OwnedEvent, Sink};
pub use parser::{Kind, Parser};
