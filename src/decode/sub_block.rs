use std::io::{self, Read};

/// Reads the payload of a GIF data sub-block chain as one contiguous stream.
///
/// The wrapped reader must be positioned on the first size byte. Reading
/// stops at the zero-length terminator block. Running out of input before the
/// terminator is an `UnexpectedEof` error.
pub struct SubBlockReader<'a, R> {
    reader: &'a mut R,
    remaining_in_block: usize,
    finished: bool,
}

impl<'a, R: Read> SubBlockReader<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self { reader, remaining_in_block: 0, finished: false }
    }

    /// Consume whatever is left of the chain, including the terminator.
    pub fn drain(&mut self) -> io::Result<()> {
        io::copy(self, &mut io::sink())?;
        Ok(())
    }
}

impl<'a, R: Read> Read for SubBlockReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.finished || buf.is_empty() {
            return Ok(0);
        }

        if self.remaining_in_block == 0 {
            let mut size_byte = [0u8; 1];
            if self.reader.read(&mut size_byte)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended before the sub-block terminator",
                ));
            }
            if size_byte[0] == 0 {
                self.finished = true;
                return Ok(0);
            }
            self.remaining_in_block = size_byte[0] as usize;
        }

        let max_read = buf.len().min(self.remaining_in_block);
        let read_amount = self.reader.read(&mut buf[..max_read])?;
        if read_amount == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream truncated inside a data sub-block",
            ));
        }
        self.remaining_in_block -= read_amount;
        Ok(read_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_across_blocks() {
        let mut cursor = Cursor::new(vec![2, b'a', b'b', 1, b'c', 0, 0xFF]);
        let mut payload = Vec::new();
        SubBlockReader::new(&mut cursor).read_to_end(&mut payload).unwrap();
        assert_eq!(payload, b"abc");
        // Positioned right after the terminator
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_empty_chain() {
        let mut cursor = Cursor::new(vec![0u8]);
        let mut payload = Vec::new();
        SubBlockReader::new(&mut cursor).read_to_end(&mut payload).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_missing_terminator_is_error() {
        let mut cursor = Cursor::new(vec![2, b'a', b'b']);
        let mut payload = Vec::new();
        let err = SubBlockReader::new(&mut cursor).read_to_end(&mut payload).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_truncated_block_is_error() {
        let mut cursor = Cursor::new(vec![5, b'a']);
        let mut payload = Vec::new();
        assert!(SubBlockReader::new(&mut cursor).read_to_end(&mut payload).is_err());
    }

    #[test]
    fn test_drain_skips_rest() {
        let mut cursor = Cursor::new(vec![3, 1, 2, 3, 2, 4, 5, 0, 0x3B]);
        let mut reader = SubBlockReader::new(&mut cursor);
        let mut first = [0u8; 2];
        reader.read_exact(&mut first).unwrap();
        reader.drain().unwrap();
        assert_eq!(cursor.position(), 8);
    }
}
