use crate::error::Grammar;
use crate::util::{compare_lowercase_ascii, split_list, trim_ows};
use crate::{Error, Flags};

/// Headers the parser acts upon. Everything else is passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderKind {
    ContentLength,
    TransferEncoding,
    Connection,
    Upgrade,
    Other,
}

impl HeaderKind {
    pub fn classify(name: &[u8]) -> Self {
        // Cheap length filter before comparing.
        match name.len() {
            7 if compare_lowercase_ascii(name, "upgrade") => HeaderKind::Upgrade,
            10 if compare_lowercase_ascii(name, "connection") => HeaderKind::Connection,
            14 if compare_lowercase_ascii(name, "content-length") => HeaderKind::ContentLength,
            17 if compare_lowercase_ascii(name, "transfer-encoding") => {
                HeaderKind::TransferEncoding
            }
            _ => HeaderKind::Other,
        }
    }
}

/// Protocol facts gathered from the headers of one message.
///
/// Header names and values themselves are never stored, they are handed to
/// the sink as soon as they are complete.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct HeadInfo {
    pub count: usize,
    pub content_length: Option<u64>,
    /// A transfer-encoding header was seen.
    pub transfer_encoding: bool,
    /// The last transfer-coding is chunked.
    pub chunked: bool,
    pub connection_close: bool,
    pub connection_keep_alive: bool,
    pub connection_upgrade: bool,
    pub upgrade: bool,
}

impl HeadInfo {
    /// Take note of a completed header.
    pub fn record(&mut self, kind: HeaderKind, value: &[u8]) -> Result<(), Error> {
        match kind {
            HeaderKind::ContentLength => {
                if self.content_length.is_some() {
                    return Err(Error::InvalidGrammar(Grammar::ContentLength));
                }
                self.content_length = Some(parse_content_length(value)?);
            }
            HeaderKind::TransferEncoding => {
                // Header can repeat. Only the final coding decides.
                self.transfer_encoding = true;
                if let Some(last) = split_list(value).last() {
                    self.chunked = compare_lowercase_ascii(last, "chunked");
                }
            }
            HeaderKind::Connection => {
                for token in split_list(value) {
                    if compare_lowercase_ascii(token, "close") {
                        self.connection_close = true;
                    } else if compare_lowercase_ascii(token, "keep-alive") {
                        self.connection_keep_alive = true;
                    } else if compare_lowercase_ascii(token, "upgrade") {
                        self.connection_upgrade = true;
                    }
                }
            }
            HeaderKind::Upgrade => {
                self.upgrade = true;
            }
            HeaderKind::Other => {}
        }
        Ok(())
    }

    pub fn flags(&self) -> Flags {
        let mut flags = Flags::empty();
        if self.connection_keep_alive {
            flags.insert(Flags::CONNECTION_KEEP_ALIVE);
        }
        if self.connection_close {
            flags.insert(Flags::CONNECTION_CLOSE);
        }
        flags
    }
}

fn parse_content_length(value: &[u8]) -> Result<u64, Error> {
    const ERR: Error = Error::InvalidGrammar(Grammar::ContentLength);

    let value = trim_ows(value);

    if value.is_empty() {
        return Err(ERR);
    }

    let mut n: u64 = 0;
    for c in value {
        if !c.is_ascii_digit() {
            return Err(ERR);
        }
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add((c - b'0') as u64))
            .ok_or(ERR)?;
    }

    Ok(n)
}
