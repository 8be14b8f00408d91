// crates/lazulite-binary/src/io.rs
use crate::error::{BinaryError, Result};
use bytes::{Buf, BufMut, Bytes};

/// Checks that the buffer has enough remaining bytes and errors out if not.
macro_rules! check_remaining {
    ($buf:expr, $len:expr) => {
        let needed = $len;
        let remaining = $buf.remaining();
        if remaining < needed {
            return Err(BinaryError::UnexpectedEof { needed, remaining });
        }
    };
}

/// Extension trait over `bytes::Buf` with bounds-checked little-endian reads.
pub trait BinaryReader: Buf {
    /// Reads a single `u8` byte.
    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        check_remaining!(self, 1);
        Ok(self.get_u8())
    }

    /// Reads a `u16` in little-endian format.
    #[inline]
    fn read_u16_le(&mut self) -> Result<u16> {
        check_remaining!(self, 2);
        Ok(self.get_u16_le())
    }

    /// Reads a `u32` in little-endian format.
    #[inline]
    fn read_u32_le(&mut self) -> Result<u32> {
        check_remaining!(self, 4);
        Ok(self.get_u32_le())
    }

    /// Reads a byte slice with a fixed length.
    /// Returns a `Bytes` handle which avoids copying when possible.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        check_remaining!(self, len);
        Ok(self.copy_to_bytes(len))
    }
}

// Every `Buf` gets the checked reads.
impl<T: Buf> BinaryReader for T {}

/// Extension trait over `bytes::BufMut` with little-endian writes.
///
/// Writes into growable buffers cannot fail; the `Result` return keeps the
/// call sites uniform with the read side.
pub trait BinaryWriter: BufMut {
    /// Writes a single `u8` byte.
    #[inline]
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put_u8(value);
        Ok(())
    }

    /// Writes a `u16` in little-endian format.
    #[inline]
    fn write_u16_le(&mut self, value: u16) -> Result<()> {
        self.put_u16_le(value);
        Ok(())
    }

    /// Writes a `u32` in little-endian format.
    #[inline]
    fn write_u32_le(&mut self, value: u32) -> Result<()> {
        self.put_u32_le(value);
        Ok(())
    }

    /// Writes a raw byte slice with no length prefix.
    #[inline]
    fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.put_slice(value);
        Ok(())
    }
}

impl<T: BufMut> BinaryWriter for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_u8_round_trip() {
        let mut writer = BytesMut::new();
        writer.write_u8(0xAB).unwrap();
        writer.write_u8(0x00).unwrap();

        let mut reader = writer.freeze();
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
        assert_eq!(reader.read_u8().unwrap(), 0x00);
        assert!(matches!(
            reader.read_u8(),
            Err(BinaryError::UnexpectedEof { needed: 1, remaining: 0 })
        ));
    }

    #[test]
    fn test_u16_le_layout() {
        let value: u16 = 0xABCD;
        // LE: CD AB
        let mut writer = BytesMut::new();
        writer.write_u16_le(value).unwrap();
        assert_eq!(writer.as_ref(), &[0xCD, 0xAB]);

        let mut reader = writer.freeze();
        assert_eq!(reader.read_u16_le().unwrap(), value);
    }

    #[test]
    fn test_u32_le_layout() {
        let value: u32 = 0x1234_5678;
        // LE: 78 56 34 12
        let mut writer = BytesMut::new();
        writer.write_u32_le(value).unwrap();
        assert_eq!(writer.as_ref(), &[0x78, 0x56, 0x34, 0x12]);

        let mut reader = writer.freeze();
        assert_eq!(reader.read_u32_le().unwrap(), value);
    }

    #[test]
    fn test_read_bytes() {
        let mut writer = BytesMut::new();
        writer.write_bytes(b"lazulite").unwrap();

        let mut reader = writer.freeze();
        assert_eq!(reader.read_bytes(4).unwrap().as_ref(), b"lazu");
        assert!(matches!(
            reader.read_bytes(5),
            Err(BinaryError::UnexpectedEof { needed: 5, remaining: 4 })
        ));
        assert_eq!(reader.read_bytes(4).unwrap().as_ref(), b"lite");
    }

    #[test]
    fn test_partial_multibyte_read() {
        let mut reader = Bytes::from_static(&[0x01, 0x02, 0x03]);
        assert!(matches!(
            reader.read_u32_le(),
            Err(BinaryError::UnexpectedEof { needed: 4, remaining: 3 })
        ));
        // A failed read must not consume anything.
        assert_eq!(reader.read_u16_le().unwrap(), 0x0201);
    }
}
