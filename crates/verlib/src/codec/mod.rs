//! Binary codec for version library records.
//!
//! Every record starts with a flag byte. Its bits say which optional values
//! follow and how many bytes each integer occupies, so the width of a value is
//! chosen per value when encoding rather than implied by the platform. A file
//! written for a 32-bit target decodes the same on a 64-bit reader.
//!
//! All integers are little-endian. Strings are a 7-bit-group length prefix
//! followed by UTF-8 bytes.

mod cached;
mod instances;
mod records;

use std::io::{Read, Write};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::record::RecordKind;

pub use cached::{decode_cached_values, encode_cached_values, run_markers};
pub use instances::{InstanceFlags, OwnerFlags, decode_instance_list, encode_instance_list};
pub use records::{FieldFlags, FunctionFlags, GlobalFlags, RegistrationFlags, TypeFlags};

/// Upper bound on speculative preallocation driven by counts read from a file
pub(crate) const PREALLOC_LIMIT: usize = 256;

/// A record kind with a symmetric binary encoding.
///
/// `decode(encode(r)) == r` holds for every record; re-encoding a decoded
/// record may choose narrower widths than the original stream did.
pub trait Record: Sized {
    const KIND: RecordKind;

    fn decode<R: Read>(reader: &mut R) -> Result<Self>;

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()>;
}

/// Decode a count-prefixed sequence of records
pub fn decode_list<T: Record, R: Read>(reader: &mut R) -> Result<Vec<T>> {
    let count = read_count(reader, T::KIND)?;
    let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
    for _ in 0..count {
        items.push(T::decode(reader)?);
    }
    Ok(items)
}

/// Encode a count-prefixed sequence of records
pub fn encode_list<T: Record, W: Write>(writer: &mut W, items: &[T]) -> Result<()> {
    write_count(writer, items.len())?;
    for item in items {
        item.encode(writer)?;
    }
    Ok(())
}

/// Read an i32 element count, rejecting negative values
pub(crate) fn read_count<R: Read>(reader: &mut R, kind: RecordKind) -> Result<usize> {
    let count = reader.read_i32::<LE>()?;
    usize::try_from(count)
        .map_err(|_| Error::malformed(format!("Negative {} count: {}", kind, count)))
}

pub(crate) fn write_count<W: Write>(writer: &mut W, count: usize) -> Result<()> {
    let count = i32::try_from(count)
        .map_err(|_| Error::malformed(format!("Too many elements to encode: {}", count)))?;
    writer.write_i32::<LE>(count)?;
    Ok(())
}

/// Read a length-prefixed UTF-8 string
pub(crate) fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_7bit_len(reader)?;

    let mut bytes = Vec::with_capacity(len.min(4096));
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(Error::malformed(format!(
            "String truncated: expected {} bytes, got {}",
            len,
            bytes.len()
        )));
    }

    String::from_utf8(bytes).map_err(|e| Error::malformed(format!("Invalid UTF-8 string: {}", e)))
}

pub(crate) fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let mut len = u32::try_from(value.len())
        .ok()
        .filter(|&l| l <= i32::MAX as u32)
        .ok_or_else(|| Error::malformed(format!("String too long: {} bytes", value.len())))?;

    while len >= 0x80 {
        writer.write_u8((len as u8) | 0x80)?;
        len >>= 7;
    }
    writer.write_u8(len as u8)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn read_7bit_len<R: Read>(reader: &mut R) -> Result<usize> {
    let mut value: u32 = 0;
    for shift in (0..28).step_by(7) {
        let byte = reader.read_u8()?;
        value |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(value as usize);
        }
    }

    // fifth group holds bits 28..31 only; bit 31 would make the length negative
    let byte = reader.read_u8()?;
    if byte > 0x07 {
        return Err(Error::malformed("Bad 7-bit encoded string length"));
    }
    value |= u32::from(byte) << 28;
    Ok(value as usize)
}

/// Narrowest of the three widths used for small non-negative offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OffsetWidth {
    Byte,
    Short,
    Full,
}

impl OffsetWidth {
    pub(crate) fn of(value: i32) -> Self {
        match value {
            0..=0xFF => Self::Byte,
            0x100..=0xFFFF => Self::Short,
            _ => Self::Full,
        }
    }
}

pub(crate) fn read_offset<R: Read>(reader: &mut R, width: OffsetWidth) -> Result<i32> {
    Ok(match width {
        OffsetWidth::Byte => i32::from(reader.read_u8()?),
        OffsetWidth::Short => i32::from(reader.read_u16::<LE>()?),
        OffsetWidth::Full => reader.read_i32::<LE>()?,
    })
}

pub(crate) fn write_offset<W: Write>(writer: &mut W, value: i32, width: OffsetWidth) -> Result<()> {
    match width {
        OffsetWidth::Byte => writer.write_u8(value as u8)?,
        OffsetWidth::Short => writer.write_u16::<LE>(value as u16)?,
        OffsetWidth::Full => writer.write_i32::<LE>(value)?,
    }
    Ok(())
}
