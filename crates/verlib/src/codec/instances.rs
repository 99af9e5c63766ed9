//! Type instance lists, keyed by owner id.
//!
//! Each list is preceded by an owner entry whose flag byte narrows both the
//! element count and the owner id.

use std::io::{Read, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};

use super::{OffsetWidth, PREALLOC_LIMIT, Record, read_offset, write_offset};
use crate::error::{Error, Result};
use crate::record::{RecordKind, TypeInstanceInfo};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OwnerFlags: u8 {
        /// count stored as i32 instead of u8
        const COUNT_WIDE = 0x01;
        const ID_SHORT = 0x02;
        const ID_BYTE = 0x04;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InstanceFlags: u8 {
        const BEGIN = 0x01;
        const BEGIN_BYTE = 0x02;
        const BEGIN_SHORT = 0x04;
        const END = 0x08;
        const END_BYTE = 0x10;
        const END_SHORT = 0x20;
        const TYPE_SHORT = 0x40;
        const TYPE_MEDIUM = 0x80;
    }
}

fn offset_flags(value: Option<i32>, present: InstanceFlags, byte: InstanceFlags, short: InstanceFlags) -> InstanceFlags {
    match value.map(OffsetWidth::of) {
        Some(OffsetWidth::Byte) => present | byte,
        Some(OffsetWidth::Short) => present | short,
        Some(OffsetWidth::Full) => present,
        None => InstanceFlags::empty(),
    }
}

fn offset_width(flags: InstanceFlags, byte: InstanceFlags, short: InstanceFlags) -> OffsetWidth {
    if flags.contains(byte) {
        OffsetWidth::Byte
    } else if flags.contains(short) {
        OffsetWidth::Short
    } else {
        OffsetWidth::Full
    }
}

impl Record for TypeInstanceInfo {
    const KIND: RecordKind = RecordKind::TypeInstanceList;

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = InstanceFlags::from_bits_retain(reader.read_u8()?);

        let begin_offset = if flags.contains(InstanceFlags::BEGIN) {
            let width = offset_width(flags, InstanceFlags::BEGIN_BYTE, InstanceFlags::BEGIN_SHORT);
            Some(read_offset(reader, width)?)
        } else {
            None
        };

        let end_offset = if flags.contains(InstanceFlags::END) {
            let width = offset_width(flags, InstanceFlags::END_BYTE, InstanceFlags::END_SHORT);
            Some(read_offset(reader, width)?)
        } else {
            None
        };

        let type_id = if flags.contains(InstanceFlags::TYPE_SHORT) {
            u64::from(reader.read_u16::<LE>()?)
        } else if flags.contains(InstanceFlags::TYPE_MEDIUM) {
            u64::from(reader.read_u32::<LE>()?)
        } else {
            reader.read_u64::<LE>()?
        };

        Ok(Self {
            begin_offset,
            end_offset,
            type_id: (type_id != 0).then_some(type_id),
        })
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut flags = offset_flags(
            self.begin_offset,
            InstanceFlags::BEGIN,
            InstanceFlags::BEGIN_BYTE,
            InstanceFlags::BEGIN_SHORT,
        ) | offset_flags(
            self.end_offset,
            InstanceFlags::END,
            InstanceFlags::END_BYTE,
            InstanceFlags::END_SHORT,
        );

        let type_id = self.type_id.unwrap_or(0);
        if type_id <= 0xFFFF {
            flags |= InstanceFlags::TYPE_SHORT;
        } else if type_id <= u64::from(u32::MAX) {
            flags |= InstanceFlags::TYPE_MEDIUM;
        }

        writer.write_u8(flags.bits())?;

        if let Some(begin) = self.begin_offset {
            let width = offset_width(flags, InstanceFlags::BEGIN_BYTE, InstanceFlags::BEGIN_SHORT);
            write_offset(writer, begin, width)?;
        }
        if let Some(end) = self.end_offset {
            let width = offset_width(flags, InstanceFlags::END_BYTE, InstanceFlags::END_SHORT);
            write_offset(writer, end, width)?;
        }

        if flags.contains(InstanceFlags::TYPE_SHORT) {
            writer.write_u16::<LE>(type_id as u16)?;
        } else if flags.contains(InstanceFlags::TYPE_MEDIUM) {
            writer.write_u32::<LE>(type_id as u32)?;
        } else {
            writer.write_u64::<LE>(type_id)?;
        }
        Ok(())
    }
}

/// Decode one owner entry and its instance list
pub fn decode_instance_list<R: Read>(reader: &mut R) -> Result<(u32, Vec<TypeInstanceInfo>)> {
    let flags = OwnerFlags::from_bits_retain(reader.read_u8()?);

    let count = if flags.contains(OwnerFlags::COUNT_WIDE) {
        let count = reader.read_i32::<LE>()?;
        usize::try_from(count).map_err(|_| {
            Error::malformed(format!("Negative type instance count: {}", count))
        })?
    } else {
        usize::from(reader.read_u8()?)
    };

    let owner = if flags.contains(OwnerFlags::ID_SHORT) {
        u32::from(reader.read_u16::<LE>()?)
    } else if flags.contains(OwnerFlags::ID_BYTE) {
        u32::from(reader.read_u8()?)
    } else {
        reader.read_u32::<LE>()?
    };

    let mut list = Vec::with_capacity(count.min(PREALLOC_LIMIT / 4));
    for _ in 0..count {
        list.push(TypeInstanceInfo::decode(reader)?);
    }

    Ok((owner, list))
}

/// Encode one owner entry and its instance list
pub fn encode_instance_list<W: Write>(
    writer: &mut W,
    owner: u32,
    list: &[TypeInstanceInfo],
) -> Result<()> {
    let mut flags = OwnerFlags::empty();
    flags.set(OwnerFlags::COUNT_WIDE, list.len() > 0xFF);
    if owner <= 0xFF {
        flags |= OwnerFlags::ID_BYTE;
    } else if owner <= 0xFFFF {
        flags |= OwnerFlags::ID_SHORT;
    }

    writer.write_u8(flags.bits())?;

    if flags.contains(OwnerFlags::COUNT_WIDE) {
        let count = i32::try_from(list.len()).map_err(|_| {
            Error::malformed(format!("Too many type instances: {}", list.len()))
        })?;
        writer.write_i32::<LE>(count)?;
    } else {
        writer.write_u8(list.len() as u8)?;
    }

    if flags.contains(OwnerFlags::ID_SHORT) {
        writer.write_u16::<LE>(owner as u16)?;
    } else if flags.contains(OwnerFlags::ID_BYTE) {
        writer.write_u8(owner as u8)?;
    } else {
        writer.write_u32::<LE>(owner)?;
    }

    for info in list {
        info.encode(writer)?;
    }
    Ok(())
}
