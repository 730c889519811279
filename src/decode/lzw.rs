//! Variable-width LZW decompression for GIF image data.

use std::io::{self, Read};

const MAX_CODES: usize = 4096;
const MAX_CODE_SIZE: u8 = 12;

/// Largest minimum code size accepted from an image descriptor.
pub const MAX_MIN_CODE_SIZE: u8 = 11;

/// Reads little-endian, LSB-first bit fields.
pub struct BitReader<R> {
    input: R,
    bit_buffer: u64,
    bits_in_buffer: u8,
}

impl<R: Read> BitReader<R> {
    pub fn new(input: R) -> Self {
        Self { input, bit_buffer: 0, bits_in_buffer: 0 }
    }

    /// Read `n` bits (at most 16). `Ok(None)` means the input ended cleanly.
    pub fn read_bits(&mut self, n: u8) -> io::Result<Option<u16>> {
        debug_assert!(n <= 16);
        while self.bits_in_buffer < n {
            let mut byte = [0u8; 1];
            if self.input.read(&mut byte)? == 0 {
                return Ok(None);
            }
            self.bit_buffer |= (byte[0] as u64) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
        }

        let result = (self.bit_buffer & ((1u64 << n) - 1)) as u16;
        self.bit_buffer >>= n;
        self.bits_in_buffer -= n;
        Ok(Some(result))
    }

    pub fn into_inner(self) -> R {
        self.input
    }
}

/// One dictionary string: the code it extends plus its last byte.
///
/// `first` and `len` are cached so a string can be written front to back
/// without a scratch stack.
#[derive(Debug, Clone, Copy)]
struct Entry {
    prefix: u16,
    last: u8,
    first: u8,
    len: u16,
}

/// GIF flavored LZW decoder.
///
/// Decoding is resumable: [`LzwDecoder::decode`] can be called repeatedly
/// with small buffers, and a string that does not fit is carried over to the
/// next call.
pub struct LzwDecoder<R> {
    bits: BitReader<R>,
    min_code_size: u8,
    code_size: u8,
    table: Vec<Entry>,
    previous: Option<u16>,
    pending: Vec<u8>,
    pending_pos: usize,
    ended: bool,
}

impl<R: Read> LzwDecoder<R> {
    /// `min_code_size` must be in `1..=MAX_MIN_CODE_SIZE`.
    pub fn new(reader: R, min_code_size: u8) -> io::Result<Self> {
        if min_code_size == 0 || min_code_size > MAX_MIN_CODE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid LZW minimum code size {}", min_code_size),
            ));
        }

        let roots = 1u16 << min_code_size;
        let mut table = Vec::with_capacity(MAX_CODES);
        table.extend((0..roots).map(|i| Entry { prefix: 0, last: i as u8, first: i as u8, len: 1 }));
        // Clear and end codes occupy two slots but never expand
        table.extend([Entry { prefix: 0, last: 0, first: 0, len: 0 }; 2]);

        Ok(Self {
            bits: BitReader::new(reader),
            min_code_size,
            code_size: min_code_size + 1,
            table,
            previous: None,
            pending: Vec::with_capacity(MAX_CODES),
            pending_pos: 0,
            ended: false,
        })
    }

    fn clear_code(&self) -> u16 {
        1 << self.min_code_size
    }

    fn end_code(&self) -> u16 {
        self.clear_code() + 1
    }

    fn reset(&mut self) {
        self.table.truncate(self.end_code() as usize + 1);
        self.code_size = self.min_code_size + 1;
        self.previous = None;
    }

    /// Decode into `buf`, returning how many indices were written.
    ///
    /// Fewer than `buf.len()` means the data ended (end code or end of
    /// input); every later call returns 0. An undefined code is an
    /// `InvalidData` error.
    pub fn decode(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            if self.pending_pos == self.pending.len() && !self.next_string()? {
                break;
            }
            let available = &self.pending[self.pending_pos..];
            let n = available.len().min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&available[..n]);
            written += n;
            self.pending_pos += n;
        }
        Ok(written)
    }

    /// Read codes until one expands to a string in `pending`.
    fn next_string(&mut self) -> io::Result<bool> {
        while !self.ended {
            let Some(code) = self.bits.read_bits(self.code_size)? else {
                self.ended = true;
                break;
            };
            if code == self.clear_code() {
                self.reset();
                continue;
            }
            if code == self.end_code() {
                self.ended = true;
                break;
            }

            let next = self.table.len() as u16;
            let previous = self.previous;
            let first = match previous {
                _ if code < next => {
                    self.expand(code);
                    self.table[code as usize].first
                }
                // KwKwK: the code is the one about to be defined
                Some(previous) if code == next => {
                    self.expand(previous);
                    let first = self.table[previous as usize].first;
                    self.pending.push(first);
                    first
                }
                _ => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid LZW code {}", code),
                    ))
                }
            };

            if let Some(previous) = previous {
                self.define(previous, first);
            }
            self.previous = Some(code);
            return Ok(true);
        }
        Ok(false)
    }

    /// Write the string for `code` into `pending`.
    fn expand(&mut self, code: u16) {
        let len = self.table[code as usize].len as usize;
        self.pending.clear();
        self.pending.resize(len, 0);
        self.pending_pos = 0;

        let mut cursor = code;
        for slot in self.pending.iter_mut().rev() {
            let entry = self.table[cursor as usize];
            *slot = entry.last;
            cursor = entry.prefix;
        }
    }

    /// Add `previous + byte` to the table, widening codes when it fills up.
    fn define(&mut self, previous: u16, byte: u8) {
        if self.table.len() >= MAX_CODES {
            return;
        }
        let base = self.table[previous as usize];
        self.table.push(Entry { prefix: previous, last: byte, first: base.first, len: base.len + 1 });
        if self.table.len() >= 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
            self.code_size += 1;
        }
    }

    pub fn into_inner(self) -> R {
        self.bits.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Pack codes LSB-first at a fixed width.
    fn pack(codes: &[u16], width: u8) -> Vec<u8> {
        let mut out = Vec::new();
        let mut acc: u32 = 0;
        let mut bits = 0;
        for &code in codes {
            acc |= (code as u32) << bits;
            bits += width;
            while bits >= 8 {
                out.push(acc as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
        if bits > 0 {
            out.push(acc as u8);
        }
        out
    }

    #[test]
    fn test_bit_reader_lsb_first() {
        let mut reader = BitReader::new(Cursor::new(vec![0b1010_1100, 0b0000_0001]));
        assert_eq!(reader.read_bits(3).unwrap(), Some(0b100));
        assert_eq!(reader.read_bits(3).unwrap(), Some(0b101));
        assert_eq!(reader.read_bits(3).unwrap(), Some(0b110));
        assert_eq!(reader.read_bits(8).unwrap(), None);
    }

    #[test]
    fn test_decode_literals() {
        // min size 2: clear=4, end=5, codes are 3 bits wide
        let data = pack(&[4, 1, 2, 4, 3, 0, 5], 3);
        let mut decoder = LzwDecoder::new(Cursor::new(data), 2).unwrap();
        let mut buf = [9u8; 4];
        assert_eq!(decoder.decode(&mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 0]);
    }

    #[test]
    fn test_decode_dictionary_entries() {
        // 1,1 defines code 6 = [1,1]; code 6 expands it
        let data = pack(&[4, 1, 6, 5], 3);
        let mut decoder = LzwDecoder::new(Cursor::new(data), 2).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(decoder.decode(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 1, 1]);
    }

    #[test]
    fn test_decode_kwkwk_code() {
        // Code 6 arrives before it is defined: it must be [2, 2]
        let data = pack(&[4, 2, 6, 5], 3);
        let mut decoder = LzwDecoder::new(Cursor::new(data), 2).unwrap();
        let mut buf = [0u8; 3];
        assert_eq!(decoder.decode(&mut buf).unwrap(), 3);
        assert_eq!(buf, [2, 2, 2]);
    }

    #[test]
    fn test_code_width_grows_when_table_fills() {
        // 1, 2, 3 define codes 6 and 7; the table then holds 8 entries so
        // the following codes are 4 bits wide.
        let mut data = Vec::new();
        let mut acc: u32 = 0;
        let mut bits = 0;
        for (code, width) in [(4u16, 3u32), (1, 3), (2, 3), (3, 3), (6, 4), (8, 4), (5, 4)] {
            acc |= (code as u32) << bits;
            bits += width;
            while bits >= 8 {
                data.push(acc as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
        assert_eq!(bits, 0);

        let mut decoder = LzwDecoder::new(Cursor::new(data), 2).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(decoder.decode(&mut buf).unwrap(), 7);
        // 6 = [1, 2], then 8 = [3, 1] was defined by the step before
        assert_eq!(buf, [1, 2, 3, 1, 2, 3, 1, 0]);
    }

    #[test]
    fn test_decode_resumes_across_calls() {
        let data = pack(&[4, 1, 6, 6, 5], 3);
        let mut decoder = LzwDecoder::new(Cursor::new(data), 2).unwrap();
        let mut first = [0u8; 2];
        let mut rest = [0u8; 8];
        assert_eq!(decoder.decode(&mut first).unwrap(), 2);
        assert_eq!(decoder.decode(&mut rest).unwrap(), 3);
        assert_eq!(first, [1, 1]);
        assert_eq!(&rest[..3], &[1, 1, 1]);
        // Ended streams stay ended
        assert_eq!(decoder.decode(&mut rest).unwrap(), 0);
    }

    #[test]
    fn test_decode_short_data() {
        let data = pack(&[4, 2, 5], 3);
        let mut decoder = LzwDecoder::new(Cursor::new(data), 2).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(decoder.decode(&mut buf).unwrap(), 1);
    }

    #[test]
    fn test_decode_invalid_code() {
        let data = pack(&[4, 7], 3);
        let mut decoder = LzwDecoder::new(Cursor::new(data), 2).unwrap();
        let mut buf = [0u8; 4];
        let err = decoder.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_invalid_min_code_size() {
        assert!(LzwDecoder::new(Cursor::new(Vec::new()), 0).is_err());
        assert!(LzwDecoder::new(Cursor::new(Vec::new()), 12).is_err());
    }
}
