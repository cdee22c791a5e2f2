use crate::cursor::Cursor;
use crate::error::Grammar;
use crate::util::TokenBuf;
use crate::{Config, Error};

/// Upper bound for a chunk size line including extensions.
const MAX_SIZE_LINE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dechunker {
    /// Hex size and optional extensions, accumulated in the token buffer.
    Size,
    /// Saw CR after the size line.
    SizeLf,
    /// Bytes of chunk data left.
    Chunk(u64),
    /// Expect CR after chunk data.
    CrLf,
    /// Expect LF after chunk data.
    Lf,
}

pub(crate) enum Decoded<'a> {
    /// Chunk data, without framing.
    Data(&'a [u8]),
    /// The zero sized chunk. Trailers or the final empty line follows.
    LastChunk,
}

impl Dechunker {
    pub fn new() -> Self {
        Dechunker::Size
    }

    /// Drive the framing forward by at most one token.
    ///
    /// Returns `None` when the step produced nothing for the caller.
    pub fn advance<'a>(
        &mut self,
        cur: &mut Cursor<'a>,
        line: &mut TokenBuf,
        config: &Config,
    ) -> Result<Option<Decoded<'a>>, Error> {
        let Some(c) = cur.peek() else {
            return Ok(None);
        };

        let strict = config.strict_line_terminators();

        match *self {
            Dechunker::Size => match c {
                b'\r' => {
                    cur.advance_by(1);
                    *self = Dechunker::SizeLf;
                }
                b'\n' if strict => return Err(Error::InvalidGrammar(Grammar::LineEnding)),
                b'\n' => {
                    cur.advance_by(1);
                    return self.size_line_done(line, config);
                }
                _ => {
                    if line.is_empty() && !c.is_ascii_hexdigit() {
                        return Err(Error::InvalidChunkSize);
                    }
                    // Some sanity check for how long the chunk line is
                    if line.len() >= MAX_SIZE_LINE {
                        return Err(Error::InvalidChunkSize);
                    }
                    line.push_unchecked(c);
                    cur.advance_by(1);
                }
            },

            Dechunker::SizeLf => {
                if c != b'\n' {
                    return Err(Error::InvalidGrammar(Grammar::LineEnding));
                }
                cur.advance_by(1);
                return self.size_line_done(line, config);
            }

            Dechunker::Chunk(left) => {
                // Read the smallest amount of input or length left of chunk.
                let left_usize = left.min(usize::MAX as u64) as usize;
                let data = cur.take(left_usize);
                let left = left - data.len() as u64;

                *self = if left == 0 {
                    Dechunker::CrLf
                } else {
                    Dechunker::Chunk(left)
                };

                trace!("Read chunk data: {}", data.len());
                return Ok(Some(Decoded::Data(data)));
            }

            Dechunker::CrLf => match c {
                b'\r' => {
                    cur.advance_by(1);
                    *self = Dechunker::Lf;
                }
                b'\n' if !strict => {
                    cur.advance_by(1);
                    *self = Dechunker::Size;
                }
                _ => return Err(Error::InvalidGrammar(Grammar::ChunkData)),
            },

            Dechunker::Lf => {
                if c != b'\n' {
                    return Err(Error::InvalidGrammar(Grammar::ChunkData));
                }
                cur.advance_by(1);
                *self = Dechunker::Size;
            }
        }

        Ok(None)
    }

    fn size_line_done<'a>(
        &mut self,
        line: &mut TokenBuf,
        config: &Config,
    ) -> Result<Option<Decoded<'a>>, Error> {
        if line.is_empty() {
            return Err(Error::InvalidChunkSize);
        }

        // httparse wants the line terminated.
        line.extend(b"\r\n");
        let parsed = httparse::parse_chunk_size(line.as_bytes());
        line.clear();

        let size = match parsed {
            Ok(httparse::Status::Complete((_, size))) => size,
            _ => return Err(Error::InvalidChunkSize),
        };

        if size > config.max_chunk_size() {
            return Err(Error::InvalidChunkSize);
        }

        trace!("Chunk size: {}", size);

        if size == 0 {
            *self = Dechunker::Size;
            return Ok(Some(Decoded::LastChunk));
        }

        *self = Dechunker::Chunk(size);
        Ok(None)
    }
}
