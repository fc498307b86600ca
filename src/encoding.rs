//! Incremental decoding of caller-supplied byte streams.
//!
//! Every parser sees UTF-8 regardless of the configured source encoding.
//! [`DecodingReader`] keeps the conversion streaming so the line-oriented
//! parsers never buffer more than one input chunk.

use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

/// Resolve a WHATWG encoding label to a decoder.
///
/// `None` or an unrecognized label falls back to UTF-8.
pub(crate) fn resolve(label: Option<&str>) -> &'static Encoding {
    label
        .and_then(|l| Encoding::for_label(l.trim().as_bytes()))
        .unwrap_or(UTF_8)
}

/// `Read` adapter converting bytes in any supported encoding to UTF-8.
///
/// The underlying stream is borrowed and never closed, so callers keep
/// control of its lifetime. A leading BOM is consumed by the decoder and
/// does not appear in the output; undecodable sequences become U+FFFD.
pub(crate) struct DecodingReader<'r> {
    input: &'r mut dyn Read,
    decoder: Decoder,
    in_buf: [u8; 4096],
    in_pos: usize,
    in_cap: usize,
    out_buf: [u8; 8192],
    out_pos: usize,
    out_cap: usize,
    eof: bool,
    finished: bool,
}

impl<'r> DecodingReader<'r> {
    pub(crate) fn new(input: &'r mut dyn Read, encoding: &'static Encoding) -> Self {
        Self {
            input,
            decoder: encoding.new_decoder(),
            in_buf: [0; 4096],
            in_pos: 0,
            in_cap: 0,
            out_buf: [0; 8192],
            out_pos: 0,
            out_cap: 0,
            eof: false,
            finished: false,
        }
    }

    /// Refill the decoded-output buffer from the underlying stream.
    fn fill_out(&mut self) -> io::Result<()> {
        self.out_pos = 0;
        self.out_cap = 0;
        if self.finished {
            return Ok(());
        }
        loop {
            if self.in_pos == self.in_cap && !self.eof {
                let n = self.input.read(&mut self.in_buf)?;
                self.in_pos = 0;
                self.in_cap = n;
                self.eof = n == 0;
            }
            let last = self.eof && self.in_pos == self.in_cap;
            let (result, read, written, _) = self.decoder.decode_to_utf8(
                &self.in_buf[self.in_pos..self.in_cap],
                &mut self.out_buf,
                last,
            );
            self.in_pos += read;
            if last && result == CoderResult::InputEmpty {
                self.finished = true;
            }
            if written > 0 || self.finished {
                self.out_cap = written;
                return Ok(());
            }
            // Nothing decoded yet (mid-sequence at a chunk boundary);
            // loop for more input.
        }
    }
}

impl Read for DecodingReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.out_pos == self.out_cap {
            self.fill_out()?;
        }
        let n = (self.out_cap - self.out_pos).min(out.len());
        out[..n].copy_from_slice(&self.out_buf[self.out_pos..self.out_pos + n]);
        self.out_pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::{DecodingReader, resolve};

    fn decode_all(bytes: &[u8], label: Option<&str>) -> String {
        let mut input: &[u8] = bytes;
        let mut reader = DecodingReader::new(&mut input, resolve(label));
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_all("héllo".as_bytes(), None), "héllo");
    }

    #[test]
    fn unknown_label_falls_back_to_utf8() {
        assert_eq!(decode_all(b"plain", Some("no-such-encoding")), "plain");
    }

    #[test]
    fn windows_1252_decodes() {
        assert_eq!(decode_all(b"Caf\xE9", Some("windows-1252")), "Café");
    }

    #[test]
    fn utf8_bom_is_consumed() {
        assert_eq!(decode_all(b"\xEF\xBB\xBFid", None), "id");
    }

    #[test]
    fn multibyte_input_larger_than_one_chunk_survives() {
        let text = "é".repeat(10_000);
        assert_eq!(decode_all(text.as_bytes(), None), text);
    }
}
