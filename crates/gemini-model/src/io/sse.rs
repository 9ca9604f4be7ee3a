use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only the `data` field is surfaced. Carriage returns are dropped on the
/// way in, so both LF and CRLF framed streams parse the same.
pub struct Sse {
    buf: String,
    // Trailing bytes of a UTF-8 sequence split across chunks.
    pending: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            pending: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete events from the buffer before reading more.
            while let Some(event) = self.try_parse_event()? {
                if let Some(data) = event {
                    return Ok(Some(data));
                }
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                return Ok(None);
            };
            self.pending.extend_from_slice(&bytes);
            self.decode_pending()?;
        }
    }

    fn decode_pending(&mut self) -> Result<(), Error> {
        let valid_len = match str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.pending.split_off(valid_len);
        let valid = std::mem::replace(&mut self.pending, rest);
        let decoded =
            String::from_utf8(valid).map_err(|_| Error::InvalidPayload)?;
        self.buf.extend(decoded.chars().filter(|c| *c != '\r'));
        Ok(())
    }

    /// Returns `Ok(None)` when the buffer has no complete event yet, and
    /// `Ok(Some(None))` for a complete event without any data line.
    fn try_parse_event(&mut self) -> Result<Option<Option<String>>, Error> {
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        let Some(eol_idx) = self.buf.find("\n\n") else {
            return Ok(None);
        };

        let mut data: Option<String> = None;
        for line in self.buf[..eol_idx].lines() {
            if line.starts_with(':') {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(Error::InvalidPayload);
            };
            if name != "data" {
                trace!("skipping sse field: {name}");
                continue;
            }
            let value = value.strip_prefix(' ').unwrap_or(value);
            match &mut data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => data = Some(value.to_owned()),
            }
        }

        // Consume the bytes from the buffer.
        self.buf.drain(..eol_idx + 2);

        Ok(Some(data))
    }
}
