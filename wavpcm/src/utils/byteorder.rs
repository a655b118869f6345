use std::io::{self, Read};

use crate::utils::errors::StreamError;

pub trait ReadBytesLe: Sized {
    fn read_le<R: Read + ?Sized>(reader: &mut R) -> Result<Self, StreamError>;
}

pub trait ReadBytesBe: Sized {
    fn read_be<R: Read + ?Sized>(reader: &mut R) -> Result<Self, StreamError>;
}

pub trait WriteBytesLe {
    fn write_le(&self, dst: &mut Vec<u8>);
}

/// Fills `buf` completely or reports how many bytes the stream had left.
///
/// A short read is never zero-padded.
pub fn read_exact_or_truncated<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), StreamError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(StreamError::Truncated {
                    needed: buf.len(),
                    got: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Advances the stream by `count` bytes without interpreting them.
pub fn skip_bytes<R: Read + ?Sized>(reader: &mut R, count: u64) -> Result<(), StreamError> {
    let skipped = io::copy(&mut reader.take(count), &mut io::sink())?;
    if skipped < count {
        return Err(StreamError::Truncated {
            needed: count as usize,
            got: skipped as usize,
        });
    }
    Ok(())
}

macro_rules! impl_num_le_be {
    ($($t:ty),+) => { $(
        impl ReadBytesLe for $t {
            #[inline]
            fn read_le<R: Read + ?Sized>(reader: &mut R) -> Result<Self, StreamError> {
                let mut buf = [0u8; size_of::<$t>()];
                read_exact_or_truncated(reader, &mut buf)?;
                Ok(<$t>::from_le_bytes(buf))
            }
        }
        impl ReadBytesBe for $t {
            #[inline]
            fn read_be<R: Read + ?Sized>(reader: &mut R) -> Result<Self, StreamError> {
                let mut buf = [0u8; size_of::<$t>()];
                read_exact_or_truncated(reader, &mut buf)?;
                Ok(<$t>::from_be_bytes(buf))
            }
        }
        impl WriteBytesLe for $t { #[inline] fn write_le(&self, dst: &mut Vec<u8>) { dst.extend_from_slice(&self.to_le_bytes()); }}
    )+ }
}

impl_num_le_be!(u16, i16, u32, i32);

macro_rules! impl_write_only {
    ($($t:ty),+) => { $(
        impl WriteBytesLe for $t { #[inline] fn write_le(&self, dst: &mut Vec<u8>) { dst.extend_from_slice(&self.to_le_bytes()); }}
    )+ }
}

impl_write_only!(u8, i8, f32);

impl<T: WriteBytesLe> WriteBytesLe for [T] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

impl<T: WriteBytesLe, const N: usize> WriteBytesLe for [T; N] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.as_slice().write_le(dst);
    }
}

impl<T: WriteBytesLe> WriteBytesLe for Vec<T> {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.as_slice().write_le(dst);
    }
}

/// Concatenates the little-endian encodings of every argument.
#[macro_export]
macro_rules! join_bytes_le {
    ( $($value:expr),+ $(,)? ) => {{
        let mut vec = Vec::<u8>::new();
        $( $crate::utils::byteorder::WriteBytesLe::write_le(&$value, &mut vec); )+
        vec
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_both_orders() -> Result<(), StreamError> {
        let mut cursor = Cursor::new([0x52, 0x49, 0x46, 0x46, 0x34, 0x12, 0xFE, 0xFF]);

        assert_eq!(u32::read_be(&mut cursor)?, 0x5249_4646);
        assert_eq!(u16::read_le(&mut cursor)?, 0x1234);
        assert_eq!(i16::read_le(&mut cursor)?, -2);

        let mut cursor = Cursor::new([0x01, 0x00, 0x00, 0x80]);
        assert_eq!(i32::read_le(&mut cursor)?, i32::MIN + 1);
        Ok(())
    }

    #[test]
    fn short_read_is_an_error() {
        let mut cursor = Cursor::new([0xAA, 0xBB, 0xCC]);
        match u32::read_le(&mut cursor) {
            Err(StreamError::Truncated { needed, got }) => {
                assert_eq!(needed, 4);
                assert_eq!(got, 3);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn skip_past_end_reports_shortfall() {
        let mut cursor = Cursor::new(vec![0u8; 10]);
        assert!(skip_bytes(&mut cursor, 6).is_ok());
        assert_eq!(cursor.position(), 6);
        assert!(matches!(
            skip_bytes(&mut cursor, 8),
            Err(StreamError::Truncated { needed: 8, got: 4 })
        ));
    }

    #[test]
    fn join_le_matches_reader() -> Result<(), StreamError> {
        let bytes = join_bytes_le!(0x1234u16, -2i16, 0xABCD_EF01u32, *b"TEST");
        assert_eq!(
            bytes,
            [0x34, 0x12, 0xFE, 0xFF, 0x01, 0xEF, 0xCD, 0xAB, b'T', b'E', b'S', b'T']
        );

        let mut cursor = Cursor::new(bytes);
        assert_eq!(u16::read_le(&mut cursor)?, 0x1234);
        assert_eq!(i16::read_le(&mut cursor)?, -2);
        assert_eq!(u32::read_le(&mut cursor)?, 0xABCD_EF01);
        assert_eq!(u32::read_be(&mut cursor)?, 0x5445_5354);
        Ok(())
    }
}
