use http::{Method, StatusCode, Version};

use crate::body::{BodyStrategy, Selection};
use crate::chunk::{Dechunker, Decoded};
use crate::cursor::{Cursor, Position};
use crate::error::{Grammar, Token};
use crate::header::{HeadInfo, HeaderKind};
use crate::util::{is_ows, is_tchar, is_url_char, is_value_char, TokenBuf};
use crate::{Config, Error, Event, Flags, Sink};

/// Upper bound for the method token, and the version token of a status line.
const MAX_METHOD_LENGTH: usize = 32;

const VERSION_PREFIX: &[u8] = b"HTTP/";

/// What kind of message the parser expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Request,
    Response,
    /// Decide on the first token. A message starting with `HTTP/` is a
    /// response, anything else a request.
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Start,
    MethodOrResponseVersion,
    Url,
    HttpVersion,
    RequestLineAlmostDone,
    StatusCode,
    Reason,
    StatusLineAlmostDone,
    HeaderFieldStart,
    HeaderFieldName,
    HeaderValueStart,
    HeaderValueText,
    HeaderValueAlmostDone,
    HeadersAlmostDone,
    /// Content-length body with this many bytes left.
    BodyIdentity(u64),
    /// Body until the connection closes.
    BodyIdentityEof,
    BodyChunked,
    MessageDone,
    Dead,
}

enum LineEnd {
    None,
    Cr,
    Lf,
}

/// Incremental http/1.x parser.
///
/// One parser handles one connection. Bytes are handed over with
/// [`Parser::feed`] in whatever pieces they arrive, and events are delivered
/// to a [`Sink`] before `feed` returns. The parser stops consuming input at
/// the end of each message; call [`Parser::reset`] to parse the next one.
///
/// ```
/// use trickle::{Event, Kind, Parser};
///
/// let mut parser = Parser::new(Kind::Response);
/// let mut body = Vec::new();
///
/// let mut sink = |event: Event<'_>| {
///     if let Event::BodyChunk { data, .. } = event {
///         body.extend_from_slice(data);
///     }
/// };
///
/// const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
///     Transfer-Encoding: chunked\r\n\r\n\
///     4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
///
/// // Feed the response one byte at a time.
/// for byte in RESPONSE.chunks(1) {
///     parser.feed(byte, &mut sink)?;
/// }
///
/// assert!(parser.is_complete());
/// assert_eq!(body, b"Wikipedia");
/// # Ok::<(), trickle::Error>(())
/// ```
#[derive(Debug)]
pub struct Parser {
    kind: Kind,
    initial_kind: Kind,
    config: Config,
    state: State,
    flags: Flags,
    token: TokenBuf,
    head: HeadInfo,
    /// Kind of the header whose value is being read.
    header_kind: HeaderKind,
    /// A header value line is complete, but might continue on a folded line.
    pending_value: bool,
    dechunker: Dechunker,
    method: Option<Method>,
    request_method: Option<Method>,
    version: Option<Version>,
    status_acc: u16,
    status_digits: u8,
    status: Option<StatusCode>,
    body: Option<BodyStrategy>,
    position: Position,
    error: Option<Error>,
}

impl Parser {
    /// Create a parser with default [`Config`].
    pub fn new(kind: Kind) -> Self {
        Self::with_config(kind, Config::default())
    }

    pub fn with_config(kind: Kind, config: Config) -> Self {
        Parser {
            kind,
            initial_kind: kind,
            config,
            state: State::Start,
            flags: Flags::empty(),
            token: TokenBuf::default(),
            head: HeadInfo::default(),
            header_kind: HeaderKind::Other,
            pending_value: false,
            dechunker: Dechunker::new(),
            method: None,
            request_method: None,
            version: None,
            status_acc: 0,
            status_digits: 0,
            status: None,
            body: None,
            position: Position::default(),
            error: None,
        }
    }

    pub fn request() -> Self {
        Self::new(Kind::Request)
    }

    pub fn response() -> Self {
        Self::new(Kind::Response)
    }

    /// Parse `input`, delivering events to `sink`.
    ///
    /// Returns the number of bytes consumed. All of `input` is consumed
    /// unless the message completes before its end, in which case the rest
    /// belongs to the next message (or a new protocol after an upgrade).
    /// Once the message is complete, further calls consume nothing until
    /// [`Parser::reset`].
    ///
    /// An error is delivered to the sink as [`Event::Error`] and returned.
    /// It leaves the parser failed, and every further call returns
    /// [`Error::ParseAlreadyFailed`].
    pub fn feed<S: Sink + ?Sized>(&mut self, input: &[u8], sink: &mut S) -> Result<usize, Error> {
        match self.state {
            State::Dead => return Err(Error::ParseAlreadyFailed),
            State::MessageDone => return Ok(0),
            _ => {}
        }

        let mut cur = Cursor::new(input, self.position);
        let result = self.run(&mut cur, sink);
        self.position = cur.position();

        if result.is_ok() && cur.has_more() {
            trace!("Message done, {} bytes left unconsumed", cur.remaining());
        }

        match result {
            Ok(()) => Ok(cur.consumed()),
            Err(e) => Err(self.fail(e, sink)),
        }
    }

    /// Signal that the stream ended.
    ///
    /// Completes a body delimited by connection close. Between messages this
    /// does nothing. Anywhere else the message is cut short, which is an
    /// [`Error::UnexpectedEof`].
    pub fn finish<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<(), Error> {
        match self.state {
            State::Dead => Err(Error::ParseAlreadyFailed),
            State::Start | State::MessageDone => Ok(()),
            State::BodyIdentityEof => {
                self.message_complete(sink);
                Ok(())
            }
            _ => Err(self.fail(Error::UnexpectedEof, sink)),
        }
    }

    /// Return to the initial state to parse another message on the same
    /// connection. Configuration and buffer allocation are kept.
    pub fn reset(&mut self) {
        trace!("Reset parser");
        self.kind = self.initial_kind;
        self.state = State::Start;
        self.flags = Flags::empty();
        self.token.clear();
        self.head = HeadInfo::default();
        self.header_kind = HeaderKind::Other;
        self.pending_value = false;
        self.dechunker = Dechunker::new();
        self.method = None;
        self.request_method = None;
        self.version = None;
        self.status_acc = 0;
        self.status_digits = 0;
        self.status = None;
        self.body = None;
        self.position = Position::default();
        self.error = None;
    }

    /// Tell a response parser which method the request had.
    ///
    /// Responses to `HEAD` have no body, and a successful response to
    /// `CONNECT` is an upgrade. Cleared by [`Parser::reset`].
    pub fn set_request_method(&mut self, method: Method) {
        self.request_method = Some(method);
    }

    /// The kind of message. For [`Kind::Both`] this is resolved once the
    /// first token is read.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Request method, once the request line is read.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Http version, once the start line is read.
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Response status, once the status line is read.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    /// Value of the content-length header, if one was sent. Check
    /// [`Parser::body_strategy`] for whether it is in effect.
    pub fn content_length(&self) -> Option<u64> {
        self.head.content_length
    }

    /// How the body is delimited, once the headers are complete.
    pub fn body_strategy(&self) -> Option<BodyStrategy> {
        self.body
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The connection switches protocol after this message. Bytes following
    /// the head are not consumed.
    pub fn is_upgrade(&self) -> bool {
        self.flags.is_upgrade()
    }

    /// Whether the connection can be reused after this message.
    pub fn should_keep_alive(&self) -> bool {
        let keep_alive = if self.version == Some(Version::HTTP_11) {
            !self.head.connection_close
        } else if self.version == Some(Version::HTTP_10) {
            self.head.connection_keep_alive && !self.head.connection_close
        } else {
            return false;
        };

        let needs_eof = self.body.map(|b| b.needs_eof()).unwrap_or(false);

        keep_alive && !needs_eof
    }

    /// A message was read to completion.
    pub fn is_complete(&self) -> bool {
        self.state == State::MessageDone
    }

    pub fn is_failed(&self) -> bool {
        self.state == State::Dead
    }

    /// The error the parser failed with.
    pub fn error(&self) -> Option<Error> {
        self.error
    }

    /// Current position. After a failure this is the offending byte.
    pub fn position(&self) -> Position {
        self.position
    }

    fn run<S: Sink + ?Sized>(&mut self, cur: &mut Cursor<'_>, sink: &mut S) -> Result<(), Error> {
        while let Some(c) = cur.peek() {
            match self.state {
                State::MessageDone => break,
                State::BodyIdentity(left) => self.read_length(cur, left, sink),
                State::BodyIdentityEof => {
                    let data = cur.take(cur.remaining());
                    trace!("Read close delimited: {}", data.len());
                    sink.event(Event::BodyChunk {
                        data,
                        is_final: false,
                    });
                }
                State::BodyChunked => self.read_chunked(cur, sink)?,
                _ => {
                    self.step(c, sink)?;
                    cur.advance_by(1);
                }
            }
        }
        Ok(())
    }

    fn step<S: Sink + ?Sized>(&mut self, c: u8, sink: &mut S) -> Result<(), Error> {
        match self.state {
            State::Start => {
                // Tolerate empty lines ahead of the start line.
                if c == b'\r' || c == b'\n' {
                    return Ok(());
                }
                trace!("Message begin");
                sink.event(Event::MessageBegin);
                self.state = State::MethodOrResponseVersion;
                self.first_token(c, sink)?;
            }
            State::MethodOrResponseVersion => self.first_token(c, sink)?,
            State::Url => self.url(c, sink)?,
            State::HttpVersion => self.request_version(c)?,
            State::RequestLineAlmostDone => {
                expect_lf(c)?;
                self.request_line_done()?;
            }
            State::StatusCode => self.status_code_byte(c, sink)?,
            State::Reason => self.reason(c, sink)?,
            State::StatusLineAlmostDone => {
                expect_lf(c)?;
                self.status_line_done(sink);
            }
            State::HeaderFieldStart => self.header_field_start(c, sink)?,
            State::HeaderFieldName => self.header_field_name(c, sink)?,
            State::HeaderValueStart => self.header_value_start(c)?,
            State::HeaderValueText => self.header_value_text(c)?,
            State::HeaderValueAlmostDone => {
                expect_lf(c)?;
                self.header_value_line_done();
            }
            State::HeadersAlmostDone => {
                expect_lf(c)?;
                self.headers_done(sink)?;
            }
            State::BodyIdentity(_)
            | State::BodyIdentityEof
            | State::BodyChunked
            | State::MessageDone
            | State::Dead => unreachable!("step in state {:?}", self.state),
        }
        Ok(())
    }

    fn line_end(&self, c: u8) -> Result<LineEnd, Error> {
        match c {
            b'\r' => Ok(LineEnd::Cr),
            b'\n' if self.config.strict_line_terminators() => {
                Err(Error::InvalidGrammar(Grammar::LineEnding))
            }
            b'\n' => Ok(LineEnd::Lf),
            _ => Ok(LineEnd::None),
        }
    }

    // *************** START LINE ***************

    fn first_token<S: Sink + ?Sized>(&mut self, c: u8, sink: &mut S) -> Result<(), Error> {
        if c == b' ' {
            return self.first_token_done(sink);
        }

        let ok = match self.kind {
            Kind::Request => is_tchar(c),
            Kind::Response => version_char_ok(self.token.len(), c),
            Kind::Both => is_tchar(c) || c == b'/',
        };

        if !ok {
            let grammar = if self.kind == Kind::Response {
                Grammar::Version
            } else {
                Grammar::Method
            };
            return Err(Error::InvalidGrammar(grammar));
        }

        self.token.push(c, MAX_METHOD_LENGTH, Token::Method)
    }

    fn first_token_done<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<(), Error> {
        let token = self.token.as_bytes();

        if token.is_empty() {
            return Err(Error::InvalidGrammar(Grammar::Method));
        }

        let is_response = match self.kind {
            Kind::Request => false,
            Kind::Response => true,
            Kind::Both => token.starts_with(VERSION_PREFIX),
        };

        if is_response {
            self.version = Some(parse_version(token)?);
            self.kind = Kind::Response;
            self.state = State::StatusCode;
        } else {
            if token.contains(&b'/') {
                return Err(Error::InvalidGrammar(Grammar::Method));
            }
            let method =
                Method::from_bytes(token).map_err(|_| Error::InvalidGrammar(Grammar::Method))?;
            sink.event(Event::Method(token));
            self.method = Some(method);
            self.kind = Kind::Request;
            self.state = State::Url;
        }

        self.token.clear();
        Ok(())
    }

    fn url<S: Sink + ?Sized>(&mut self, c: u8, sink: &mut S) -> Result<(), Error> {
        if c == b' ' {
            if self.token.is_empty() {
                return Err(Error::InvalidGrammar(Grammar::Url));
            }
            sink.event(Event::Url(self.token.as_bytes()));
            self.token.clear();
            self.state = State::HttpVersion;
            return Ok(());
        }

        if !is_url_char(c) {
            return Err(Error::InvalidGrammar(Grammar::Url));
        }

        self.token.push(c, self.config.max_url_length(), Token::Url)
    }

    fn request_version(&mut self, c: u8) -> Result<(), Error> {
        match self.line_end(c)? {
            LineEnd::Cr => self.state = State::RequestLineAlmostDone,
            LineEnd::Lf => self.request_line_done()?,
            LineEnd::None => {
                if !version_char_ok(self.token.len(), c) {
                    return Err(Error::InvalidGrammar(Grammar::Version));
                }
                self.token.push_unchecked(c);
            }
        }
        Ok(())
    }

    fn request_line_done(&mut self) -> Result<(), Error> {
        self.version = Some(parse_version(self.token.as_bytes())?);
        self.token.clear();
        self.state = State::HeaderFieldStart;
        Ok(())
    }

    fn status_code_byte<S: Sink + ?Sized>(&mut self, c: u8, sink: &mut S) -> Result<(), Error> {
        if self.status_digits < 3 {
            if !c.is_ascii_digit() {
                return Err(Error::InvalidGrammar(Grammar::Status));
            }
            self.status_acc = self.status_acc * 10 + (c - b'0') as u16;
            self.status_digits += 1;

            if self.status_digits == 3 && self.status_acc < 100 {
                return Err(Error::InvalidGrammar(Grammar::Status));
            }
            return Ok(());
        }

        if c == b' ' {
            self.state = State::Reason;
            return Ok(());
        }

        // The reason phrase is optional.
        match self.line_end(c)? {
            LineEnd::Cr => self.state = State::StatusLineAlmostDone,
            LineEnd::Lf => self.status_line_done(sink),
            LineEnd::None => return Err(Error::InvalidGrammar(Grammar::Status)),
        }
        Ok(())
    }

    fn reason<S: Sink + ?Sized>(&mut self, c: u8, sink: &mut S) -> Result<(), Error> {
        match self.line_end(c)? {
            LineEnd::Cr => self.state = State::StatusLineAlmostDone,
            LineEnd::Lf => self.status_line_done(sink),
            LineEnd::None => {
                if !is_value_char(c) {
                    return Err(Error::InvalidGrammar(Grammar::Status));
                }
                let max = self.config.max_header_value_length();
                self.token.push(c, max, Token::Reason)?;
            }
        }
        Ok(())
    }

    fn status_line_done<S: Sink + ?Sized>(&mut self, sink: &mut S) {
        sink.event(Event::Status {
            code: self.status_acc,
            reason: self.token.as_bytes(),
        });
        // 100..=999 is checked as the digits arrive.
        self.status = StatusCode::from_u16(self.status_acc).ok();
        self.token.clear();
        self.state = State::HeaderFieldStart;
    }

    // *************** HEADERS ***************

    fn header_field_start<S: Sink + ?Sized>(&mut self, c: u8, sink: &mut S) -> Result<(), Error> {
        let max_value = self.config.max_header_value_length();

        if is_ows(c) {
            if !self.pending_value {
                // Whitespace ahead of the first header name.
                return Err(Error::InvalidGrammar(Grammar::HeaderName));
            }

            // obs-fold, the previous value continues on this line.
            self.pending_value = false;
            self.token.trim_end_ows();
            if !self.token.is_empty() {
                self.token.push(b' ', max_value, Token::HeaderValue)?;
            }
            self.state = State::HeaderValueStart;
            return Ok(());
        }

        if self.pending_value {
            self.header_value_done(sink)?;
        }

        match self.line_end(c)? {
            LineEnd::Cr => self.state = State::HeadersAlmostDone,
            LineEnd::Lf => self.headers_done(sink)?,
            LineEnd::None => {
                if !is_tchar(c) {
                    return Err(Error::InvalidGrammar(Grammar::HeaderName));
                }

                self.head.count += 1;
                if self.head.count > self.config.max_headers() {
                    return Err(Error::TooManyHeaders);
                }

                let max_name = self.config.max_header_name_length();
                self.token.push(c, max_name, Token::HeaderName)?;
                self.state = State::HeaderFieldName;
            }
        }
        Ok(())
    }

    fn header_field_name<S: Sink + ?Sized>(&mut self, c: u8, sink: &mut S) -> Result<(), Error> {
        if c == b':' {
            let name = self.token.as_bytes();
            sink.event(Event::HeaderField(name));

            // Trailers never change how the message is framed.
            self.header_kind = if self.flags.contains(Flags::TRAILING) {
                HeaderKind::Other
            } else {
                HeaderKind::classify(name)
            };

            self.token.clear();
            self.state = State::HeaderValueStart;
            return Ok(());
        }

        // This also rejects whitespace between name and colon.
        if !is_tchar(c) {
            return Err(Error::InvalidGrammar(Grammar::HeaderName));
        }

        let max_name = self.config.max_header_name_length();
        self.token.push(c, max_name, Token::HeaderName)
    }

    fn header_value_start(&mut self, c: u8) -> Result<(), Error> {
        if is_ows(c) {
            return Ok(());
        }
        self.state = State::HeaderValueText;
        self.header_value_text(c)
    }

    fn header_value_text(&mut self, c: u8) -> Result<(), Error> {
        match self.line_end(c)? {
            LineEnd::Cr => self.state = State::HeaderValueAlmostDone,
            LineEnd::Lf => self.header_value_line_done(),
            LineEnd::None => {
                if !is_value_char(c) {
                    return Err(Error::InvalidGrammar(Grammar::HeaderValue));
                }
                let max_value = self.config.max_header_value_length();
                self.token.push(c, max_value, Token::HeaderValue)?;
            }
        }
        Ok(())
    }

    fn header_value_line_done(&mut self) {
        // The value is only complete once we know the next line is not
        // a continuation.
        self.pending_value = true;
        self.state = State::HeaderFieldStart;
    }

    fn header_value_done<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<(), Error> {
        self.pending_value = false;
        self.token.trim_end_ows();

        let value = self.token.as_bytes();
        sink.event(Event::HeaderValue(value));
        self.head.record(self.header_kind, value)?;

        self.token.clear();
        Ok(())
    }

    fn headers_done<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<(), Error> {
        if self.flags.contains(Flags::TRAILING) {
            self.message_complete(sink);
            return Ok(());
        }

        let Selection {
            strategy,
            skipped,
            upgrade,
        } = match self.kind {
            Kind::Request => {
                BodyStrategy::for_request(self.method.as_ref(), &self.head, &self.config)?
            }
            Kind::Response | Kind::Both => BodyStrategy::for_response(
                self.request_method.as_ref(),
                self.status_acc,
                &self.head,
                &self.config,
            )?,
        };

        let mut flags = self.head.flags();
        if strategy == BodyStrategy::Chunked {
            flags.insert(Flags::CHUNKED);
        }
        if upgrade {
            flags.insert(Flags::UPGRADE);
        }
        if skipped {
            flags.insert(Flags::SKIP_BODY);
        }

        self.flags = flags;
        self.body = Some(strategy);

        trace!("Headers complete: {:?} {:?}", strategy, flags);
        sink.event(Event::HeadersComplete(flags));

        if upgrade {
            debug!("Upgrade, stop consuming after head");
            self.message_complete(sink);
            return Ok(());
        }

        match strategy {
            BodyStrategy::NoBody | BodyStrategy::Length(0) => self.message_complete(sink),
            BodyStrategy::Length(len) => self.state = State::BodyIdentity(len),
            BodyStrategy::Chunked => {
                self.dechunker = Dechunker::new();
                self.state = State::BodyChunked;
            }
            BodyStrategy::CloseDelimited => self.state = State::BodyIdentityEof,
        }

        Ok(())
    }

    // *************** BODY ***************

    fn read_length<S: Sink + ?Sized>(&mut self, cur: &mut Cursor<'_>, left: u64, sink: &mut S) {
        let left_usize = left.min(usize::MAX as u64) as usize;

        let data = cur.take(left_usize);
        let left = left - data.len() as u64;

        trace!("Read body: {}, left: {}", data.len(), left);

        sink.event(Event::BodyChunk {
            data,
            is_final: left == 0,
        });

        if left == 0 {
            self.message_complete(sink);
        } else {
            self.state = State::BodyIdentity(left);
        }
    }

    fn read_chunked<S: Sink + ?Sized>(
        &mut self,
        cur: &mut Cursor<'_>,
        sink: &mut S,
    ) -> Result<(), Error> {
        match self.dechunker.advance(cur, &mut self.token, &self.config)? {
            Some(Decoded::Data(data)) => sink.event(Event::BodyChunk {
                data,
                is_final: false,
            }),
            Some(Decoded::LastChunk) => {
                trace!("Last chunk, reading trailers");
                self.flags.insert(Flags::TRAILING);
                self.state = State::HeaderFieldStart;
            }
            None => {}
        }
        Ok(())
    }

    fn message_complete<S: Sink + ?Sized>(&mut self, sink: &mut S) {
        debug!("Message complete");
        sink.event(Event::MessageComplete);
        self.state = State::MessageDone;
    }

    fn fail<S: Sink + ?Sized>(&mut self, e: Error, sink: &mut S) -> Error {
        debug!("Parse failed at {:?}: {}", self.position, e);
        sink.event(Event::Error(e));
        self.state = State::Dead;
        self.error = Some(e);
        e
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> State {
        self.state
    }
}

fn expect_lf(c: u8) -> Result<(), Error> {
    if c != b'\n' {
        return Err(Error::InvalidGrammar(Grammar::LineEnding));
    }
    Ok(())
}

/// Check byte `c` at index `idx` of a `HTTP/x.y` version token.
fn version_char_ok(idx: usize, c: u8) -> bool {
    match idx {
        0..=4 => c == VERSION_PREFIX[idx],
        5 | 7 => c.is_ascii_digit(),
        6 => c == b'.',
        _ => false,
    }
}

fn parse_version(v: &[u8]) -> Result<Version, Error> {
    match v {
        b"HTTP/1.1" => Ok(Version::HTTP_11),
        b"HTTP/1.0" => Ok(Version::HTTP_10),
        _ => Err(Error::InvalidGrammar(Grammar::Version)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::OwnedEvent;
    use crate::OwnedEvent::{
        BodyChunk, HeaderField, HeaderValue, HeadersComplete, MessageBegin, MessageComplete,
        Method, Status, Url,
    };

    fn parse(kind: Kind, input: &[u8]) -> (Parser, Vec<OwnedEvent>, Result<usize, Error>) {
        parse_with(Parser::new(kind), input)
    }

    fn parse_with(mut p: Parser, input: &[u8]) -> (Parser, Vec<OwnedEvent>, Result<usize, Error>) {
        let mut events = Vec::new();
        let r = p.feed(input, &mut events);
        (p, events, r)
    }

    fn v(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn test_simple_get() -> Result<(), Error> {
        let input = b"GET /path?q=1 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let (p, events, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        assert_eq!(
            events,
            vec![
                MessageBegin,
                Method(v("GET")),
                Url(v("/path?q=1")),
                HeaderField(v("Host")),
                HeaderValue(v("example.com")),
                HeadersComplete(Flags::empty()),
                MessageComplete,
            ]
        );
        assert!(p.is_complete());
        assert_eq!(p.method(), Some(&http::Method::GET));
        assert_eq!(p.version(), Some(Version::HTTP_11));
        assert_eq!(p.body_strategy(), Some(BodyStrategy::NoBody));
        assert!(p.should_keep_alive());
        Ok(())
    }

    #[test]
    fn test_content_length_upper_case() -> Result<(), Error> {
        let input = b"POST /a HTTP/1.1\r\nCONTENT-LENGTH: 5\r\n\r\nhello";
        let (p, events, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        assert_eq!(
            &events[3..],
            &[
                HeaderField(v("CONTENT-LENGTH")),
                HeaderValue(v("5")),
                HeadersComplete(Flags::empty()),
                BodyChunk {
                    data: v("hello"),
                    is_final: true
                },
                MessageComplete,
            ]
        );
        assert_eq!(p.content_length(), Some(5));
        Ok(())
    }

    #[test]
    fn test_stops_at_message_end() -> Result<(), Error> {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 2\r\n\r\nokGET";
        let (mut p, _, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len() - 3);

        // Nothing more is consumed until reset.
        let mut events = Vec::new();
        assert_eq!(p.feed(b"GET", &mut events)?, 0);
        assert!(events.is_empty());
        Ok(())
    }

    #[test]
    fn test_chunked_response() -> Result<(), Error> {
        let input = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
            4\r\nWiki\r\n5\r\npedia\r\nE\r\n in\r\n\r\nchunks.\r\n0\r\n\r\n";
        let (p, events, r) = parse(Kind::Response, input);
        assert_eq!(r?, input.len());

        let body: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                BodyChunk { data, .. } => Some(data.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(body, b"Wikipedia in\r\n\r\nchunks.");

        assert_eq!(
            events[..3],
            [
                MessageBegin,
                Status {
                    code: 200,
                    reason: v("OK")
                },
                HeaderField(v("Transfer-Encoding")),
            ]
        );
        assert_eq!(events.last(), Some(&MessageComplete));
        assert!(p.flags().is_chunked());
        assert!(p.flags().contains(Flags::TRAILING));
        assert_eq!(p.status_code(), Some(StatusCode::OK));
        Ok(())
    }

    #[test]
    fn test_chunked_wins_over_content_length() -> Result<(), Error> {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 100\r\n\
            Transfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n";
        let (p, events, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        assert_eq!(p.body_strategy(), Some(BodyStrategy::Chunked));
        assert!(events.contains(&BodyChunk {
            data: v("abc"),
            is_final: false
        }));
        Ok(())
    }

    #[test]
    fn test_trailers() -> Result<(), Error> {
        let input = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n\
            0\r\nExpires: never\r\nContent-Length: x\r\n\r\n";
        let (_, events, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        // Content-length in trailers has no say on framing.
        assert_eq!(
            &events[events.len() - 5..],
            &[
                HeaderField(v("Expires")),
                HeaderValue(v("never")),
                HeaderField(v("Content-Length")),
                HeaderValue(v("x")),
                MessageComplete,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_invalid_header_byte() {
        let (p, events, r) = parse(Kind::Request, b"GET / HTTP/1.1\r\nHo\x01st: x\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::HeaderName)));
        assert_eq!(
            events.last(),
            Some(&OwnedEvent::Error(Error::InvalidGrammar(Grammar::HeaderName)))
        );
        assert!(p.is_failed());
        assert_eq!(p.error(), Some(Error::InvalidGrammar(Grammar::HeaderName)));
        assert_eq!(p.position().line, 2);
        assert_eq!(p.position().column, 3);
        assert_eq!(p.position().offset, 18);
    }

    #[test]
    fn test_dead_after_error() {
        let (mut p, _, r) = parse(Kind::Request, b"G\x01");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Method)));

        let mut events = Vec::new();
        assert_eq!(
            p.feed(b"GET / HTTP/1.1\r\n", &mut events),
            Err(Error::ParseAlreadyFailed)
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_control_byte_as_method() {
        let (mut p, events, r) = parse(Kind::Request, b"\x01GET / HTTP/1.1\r\n\r\n");
        let err = Error::InvalidGrammar(Grammar::Method);
        assert_eq!(r, Err(err));
        assert_eq!(events, vec![MessageBegin, OwnedEvent::Error(err)]);
        assert!(p.is_failed());

        let mut events = Vec::new();
        assert_eq!(
            p.feed(b"GET / HTTP/1.1\r\n\r\n", &mut events),
            Err(Error::ParseAlreadyFailed)
        );
        assert!(events.is_empty());
        assert_eq!(p.position().offset, 0);
    }

    #[test]
    fn test_huge_content_length() -> Result<(), Error> {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\nab";
        let (p, events, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        assert_eq!(p.content_length(), Some(u64::MAX));
        assert_eq!(
            events.last(),
            Some(&BodyChunk {
                data: v("ab"),
                is_final: false
            })
        );
        assert_eq!(p.state(), State::BodyIdentity(u64::MAX - 2));
        Ok(())
    }

    #[test]
    fn test_huge_chunk_size() -> Result<(), Error> {
        let config = Config::new().with_max_chunk_size(u64::MAX);
        let p = Parser::with_config(Kind::Request, config);
        let input = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n\
            ffffffffffffffff\r\nab";
        let (p, events, r) = parse_with(p, input);
        assert_eq!(r?, input.len());
        assert_eq!(
            events.last(),
            Some(&BodyChunk {
                data: v("ab"),
                is_final: false
            })
        );
        assert!(!p.is_complete());
        Ok(())
    }

    #[test]
    fn test_position_skips_body_lines() -> Result<(), Error> {
        let input = b"POST / HTTP/1.1\r\nContent-Length: 6\r\n\r\na\nb\nc\n";
        let (p, _, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        let pos = p.position();
        assert_eq!(pos.line, 4);
        assert_eq!(pos.offset, input.len() as u64);
        Ok(())
    }

    #[test]
    fn test_folded_header() -> Result<(), Error> {
        let input = b"GET / HTTP/1.1\r\nX-Long: a  \r\n   b\r\n\tc\r\n\r\n";
        let (_, events, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        assert_eq!(events[4], HeaderValue(v("a b c")));
        Ok(())
    }

    #[test]
    fn test_header_value_whitespace() -> Result<(), Error> {
        let input = b"GET / HTTP/1.1\r\nX-Pad: \t a \t b  \t\r\n\r\n";
        let (_, events, r) = parse(Kind::Request, input);
        assert_eq!(r?, input.len());
        assert_eq!(events[4], HeaderValue(b"a \t b".to_vec()));
        Ok(())
    }

    #[test]
    fn test_fold_on_first_line() {
        let (_, _, r) = parse(Kind::Request, b"GET / HTTP/1.1\r\n X: y\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::HeaderName)));
    }

    #[test]
    fn test_empty_header_value() -> Result<(), Error> {
        let (_, events, r) = parse(Kind::Request, b"GET / HTTP/1.1\r\nX-Empty:\r\n\r\n");
        r?;
        assert_eq!(events[4], HeaderValue(vec![]));
        Ok(())
    }

    #[test]
    fn test_space_before_colon() {
        let (_, _, r) = parse(Kind::Request, b"GET / HTTP/1.1\r\nHost : x\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::HeaderName)));
    }

    #[test]
    fn test_leading_empty_lines() -> Result<(), Error> {
        let (p, events, r) = parse(Kind::Request, b"\r\n\r\nGET / HTTP/1.1\r\n\r\n");
        r?;
        assert_eq!(events[0], MessageBegin);
        assert!(p.is_complete());
        Ok(())
    }

    #[test]
    fn test_bad_method() {
        let (_, _, r) = parse(Kind::Request, b"G@T / HTTP/1.1\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Method)));

        let (_, _, r) = parse(Kind::Request, b" GET / HTTP/1.1\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Method)));
    }

    #[test]
    fn test_method_too_long() {
        let mut input = vec![b'A'; 40];
        input.extend_from_slice(b" / HTTP/1.1\r\n\r\n");
        let (_, _, r) = parse(Kind::Request, &input);
        assert_eq!(r, Err(Error::TokenTooLong(Token::Method)));
    }

    #[test]
    fn test_url_too_long() {
        let p = Parser::with_config(Kind::Request, Config::new().with_max_url_length(4));
        let (_, _, r) = parse_with(p, b"GET /abcdef HTTP/1.1\r\n\r\n");
        assert_eq!(r, Err(Error::TokenTooLong(Token::Url)));
    }

    #[test]
    fn test_bad_version() {
        let (_, _, r) = parse(Kind::Request, b"GET / HTTP/2.0\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Version)));

        let (_, _, r) = parse(Kind::Request, b"GET / HTTX/1.1\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Version)));

        let (_, _, r) = parse(Kind::Response, b"HTTP/1.1x 200 OK\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Version)));
    }

    #[test]
    fn test_bad_status() {
        let (_, _, r) = parse(Kind::Response, b"HTTP/1.1 2x0 OK\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Status)));

        let (_, _, r) = parse(Kind::Response, b"HTTP/1.1 099 OK\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Status)));

        let (_, _, r) = parse(Kind::Response, b"HTTP/1.1 2000 OK\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::Status)));
    }

    #[test]
    fn test_status_without_reason() -> Result<(), Error> {
        let (p, events, r) = parse(Kind::Response, b"HTTP/1.1 204\r\n\r\n");
        r?;
        assert_eq!(
            events[1],
            Status {
                code: 204,
                reason: vec![]
            }
        );
        assert!(p.is_complete());
        Ok(())
    }

    #[test]
    fn test_bare_lf() -> Result<(), Error> {
        let (_, _, r) = parse(Kind::Request, b"GET / HTTP/1.1\nHost: x\n\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::LineEnding)));

        let config = Config::new().with_strict_line_terminators(false);
        let p = Parser::with_config(Kind::Request, config);
        let input = b"GET / HTTP/1.1\nHost: x\n\n";
        let (p, events, r) = parse_with(p, input);
        assert_eq!(r?, input.len());
        assert_eq!(events[4], HeaderValue(v("x")));
        assert!(p.is_complete());
        Ok(())
    }

    #[test]
    fn test_cr_without_lf() {
        let (_, _, r) = parse(Kind::Request, b"GET / HTTP/1.1\rX");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::LineEnding)));
    }

    #[test]
    fn test_too_many_headers() {
        let p = Parser::with_config(Kind::Request, Config::new().with_max_headers(2));
        let (_, _, r) = parse_with(p, b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n");
        assert_eq!(r, Err(Error::TooManyHeaders));
    }

    #[test]
    fn test_header_value_too_long() {
        let config = Config::new().with_max_header_value_length(3);
        let p = Parser::with_config(Kind::Request, config);
        let (_, _, r) = parse_with(p, b"GET / HTTP/1.1\r\nA: 1234\r\n\r\n");
        assert_eq!(r, Err(Error::TokenTooLong(Token::HeaderValue)));
    }

    #[test]
    fn test_both_detects_kind() -> Result<(), Error> {
        let (p, _, r) = parse(Kind::Both, b"HTTP/1.0 200 OK\r\nContent-Length: 0\r\n\r\n");
        r?;
        assert_eq!(p.kind(), Kind::Response);
        assert_eq!(p.version(), Some(Version::HTTP_10));

        let (mut p, _, r) = parse(Kind::Both, b"DELETE /x HTTP/1.1\r\n\r\n");
        r?;
        assert_eq!(p.kind(), Kind::Request);
        p.reset();
        assert_eq!(p.kind(), Kind::Both);
        Ok(())
    }

    #[test]
    fn test_response_to_head() -> Result<(), Error> {
        let mut p = Parser::response();
        p.set_request_method(http::Method::HEAD);
        let input = b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n";
        let (p, events, r) = parse_with(p, input);
        assert_eq!(r?, input.len());
        assert!(p.is_complete());
        assert!(p.flags().contains(Flags::SKIP_BODY));
        assert!(!events.iter().any(|e| matches!(e, BodyChunk { .. })));
        Ok(())
    }

    #[test]
    fn test_close_delimited_finish() -> Result<(), Error> {
        let (mut p, events, r) = parse(Kind::Response, b"HTTP/1.1 200 OK\r\n\r\nsome body");
        r?;
        assert_eq!(
            events.last(),
            Some(&BodyChunk {
                data: v("some body"),
                is_final: false
            })
        );
        assert!(!p.should_keep_alive());

        let mut events = Vec::new();
        p.finish(&mut events)?;
        assert_eq!(events, vec![MessageComplete]);
        assert!(p.is_complete());
        Ok(())
    }

    #[test]
    fn test_finish_mid_message() {
        let (mut p, _, _) = parse(Kind::Request, b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nab");
        let mut events = Vec::new();
        assert_eq!(p.finish(&mut events), Err(Error::UnexpectedEof));
        assert_eq!(events, vec![OwnedEvent::Error(Error::UnexpectedEof)]);
        assert!(p.is_failed());
    }

    #[test]
    fn test_finish_between_messages() -> Result<(), Error> {
        let mut p = Parser::request();
        let mut events = Vec::new();
        p.finish(&mut events)?;
        assert!(events.is_empty());
        Ok(())
    }

    #[test]
    fn test_upgrade_stops_after_head() -> Result<(), Error> {
        let head = b"GET /chat HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n";
        let mut input = head.to_vec();
        input.extend_from_slice(b"\x81\x05hello");

        let (p, events, r) = parse(Kind::Request, &input);
        assert_eq!(r?, head.len());
        assert!(p.is_upgrade());
        assert_eq!(
            &events[events.len() - 2..],
            &[HeadersComplete(Flags::UPGRADE), MessageComplete]
        );
        Ok(())
    }

    #[test]
    fn test_switching_protocols() -> Result<(), Error> {
        let (p, _, r) = parse(
            Kind::Response,
            b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: h2c\r\n\r\n",
        );
        r?;
        assert!(p.is_upgrade());
        Ok(())
    }

    #[test]
    fn test_keep_alive() -> Result<(), Error> {
        let (p, _, r) = parse(Kind::Request, b"GET / HTTP/1.0\r\n\r\n");
        r?;
        assert!(!p.should_keep_alive());

        let (p, _, r) = parse(Kind::Request, b"GET / HTTP/1.0\r\nConnection: keep-alive\r\n\r\n");
        r?;
        assert!(p.should_keep_alive());
        assert!(p.flags().contains(Flags::CONNECTION_KEEP_ALIVE));

        let (p, _, r) = parse(Kind::Request, b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n");
        r?;
        assert!(!p.should_keep_alive());
        assert!(p.flags().contains(Flags::CONNECTION_CLOSE));
        Ok(())
    }

    #[test]
    fn test_bad_content_length() {
        let (_, _, r) = parse(Kind::Request, b"POST / HTTP/1.1\r\nContent-Length: 1x\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::ContentLength)));

        let (_, _, r) = parse(
            Kind::Request,
            b"POST / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 1\r\n\r\n",
        );
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::ContentLength)));
    }

    #[test]
    fn test_request_non_chunked_te() {
        let (_, _, r) = parse(Kind::Request, b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n");
        assert_eq!(r, Err(Error::InvalidGrammar(Grammar::TransferEncoding)));
    }

    #[test]
    fn test_reset_is_idempotent() -> Result<(), Error> {
        let input = b"POST /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc";

        let mut p = Parser::request();
        let mut first = Vec::new();
        p.feed(input, &mut first)?;

        p.reset();
        p.reset();
        assert_eq!(p.state(), State::Start);
        assert_eq!(p.position(), Position::default());

        let mut second = Vec::new();
        p.feed(input, &mut second)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_reset_after_error() -> Result<(), Error> {
        let (mut p, _, r) = parse(Kind::Request, b"\x01");
        assert!(r.is_err());
        p.reset();
        assert!(!p.is_failed());
        assert_eq!(p.error(), None);

        let mut events = Vec::new();
        p.feed(b"GET / HTTP/1.1\r\n\r\n", &mut events)?;
        assert!(p.is_complete());
        Ok(())
    }

    #[test]
    fn test_byte_by_byte() -> Result<(), Error> {
        let input = b"PUT /f HTTP/1.1\r\nContent-Length: 4\r\nX: a\r\n b\r\n\r\nbody";
        let mut p = Parser::request();
        let mut events = Vec::new();
        for b in input.chunks(1) {
            assert_eq!(p.feed(b, &mut events)?, 1);
        }
        assert!(p.is_complete());
        assert!(events.contains(&HeaderValue(v("a b"))));
        let body: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                BodyChunk { data, .. } => Some(data.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(body, b"body");
        Ok(())
    }
}
