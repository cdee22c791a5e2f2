use crate::error::{Error, Token};

/// Compare `a` to an already lowercased ascii `lowercased`.
pub(crate) fn compare_lowercase_ascii(a: &[u8], lowercased: &str) -> bool {
    let b = lowercased.as_bytes();

    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).all(|(a, b)| a.to_ascii_lowercase() == *b)
}

/// Iterate the comma separated, whitespace trimmed elements of a header value.
pub(crate) fn split_list(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value
        .split(|c| *c == b',')
        .map(trim_ows)
        .filter(|v| !v.is_empty())
}

pub(crate) fn trim_ows(mut v: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = v {
        v = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = v {
        v = rest;
    }
    v
}

/// tchar as of RFC 9110 5.6.2.
pub(crate) fn is_tchar(c: u8) -> bool {
    matches!(
        c,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
        | b'^' | b'_' | b'`' | b'|' | b'~'
    ) || c.is_ascii_alphanumeric()
}

/// Bytes allowed in a request-target. We don't validate the URL structure,
/// only that it contains no whitespace or control characters.
pub(crate) fn is_url_char(c: u8) -> bool {
    matches!(c, 0x21..=0x7e | 0x80..=0xff)
}

/// field-vchar, SP and HTAB. Also used for the reason phrase.
pub(crate) fn is_value_char(c: u8) -> bool {
    matches!(c, b'\t' | 0x20..=0x7e | 0x80..=0xff)
}

pub(crate) fn is_ows(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Accumulation buffer for the token currently being parsed.
///
/// The allocation survives [`TokenBuf::clear`], so a parser reused for
/// several messages settles on a buffer as large as its longest token.
#[derive(Debug, Default)]
pub(crate) struct TokenBuf {
    buf: Vec<u8>,
}

impl TokenBuf {
    pub fn push(&mut self, c: u8, max: usize, token: Token) -> Result<(), Error> {
        if self.buf.len() >= max {
            return Err(Error::TokenTooLong(token));
        }
        self.buf.push(c);
        Ok(())
    }

    /// Push without a limit check. Caller bounds the length.
    pub fn push_unchecked(&mut self, c: u8) {
        self.buf.push(c);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn trim_end_ows(&mut self) {
        while matches!(self.buf.last(), Some(c) if is_ows(*c)) {
            self.buf.pop();
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
