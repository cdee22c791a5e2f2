/// Position in the byte stream of one message, for diagnostics.
///
/// Lines and columns are 1-based and cover the head, chunk framing and
/// trailers. Body data does not move them. The offset is 0-based and counts
/// every byte consumed since the parser was created or last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: u64,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl Position {
    fn track(&mut self, bytes: &[u8]) {
        self.offset += bytes.len() as u64;

        match bytes.iter().rposition(|c| *c == b'\n') {
            Some(last) => {
                let lines = bytes.iter().filter(|c| **c == b'\n').count() as u32;
                self.line = self.line.saturating_add(lines);
                self.column = (bytes.len() - last) as u32;
            }
            None => {
                self.column = self.column.saturating_add(bytes.len() as u32);
            }
        }
    }
}

/// Read position in the chunk handed to one `feed` call.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    position: Position,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8], position: Position) -> Self {
        Cursor {
            buf,
            pos: 0,
            position,
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn has_more(&self) -> bool {
        self.pos < self.buf.len()
    }

    pub fn advance_by(&mut self, n: usize) {
        let end = self.pos + n.min(self.remaining());
        self.position.track(&self.buf[self.pos..end]);
        self.pos = end;
    }

    /// Consume up to `n` bytes of body data and return them.
    ///
    /// Body bytes only move the offset. Line and column describe the head,
    /// chunk framing and trailers.
    pub fn take(&mut self, n: usize) -> &'a [u8] {
        let start = self.pos;
        let end = start + n.min(self.remaining());
        self.position.offset += (end - start) as u64;
        self.pos = end;
        &self.buf[start..end]
    }

    /// Bytes consumed so far in this chunk.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn position(&self) -> Position {
        self.position
    }
}
