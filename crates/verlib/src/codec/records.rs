//! Flag tables and codecs for the stand-alone record kinds.

use std::io::{Read, Write};

use bitflags::bitflags;
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};

use super::{
    OffsetWidth, Record, decode_list, encode_list, read_offset, read_string, write_offset,
    write_string,
};
use crate::error::{Error, Result};
use crate::record::{
    FieldRecord, FunctionRecord, GlobalRecord, RecordKind, RegistrationRecord, TypeRecord,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TypeFlags: u8 {
        const VTABLE = 0x01;
        /// vtable stored as u64 instead of u32
        const VTABLE_WIDE = 0x02;
        const SIZE = 0x04;
        const ID_WIDE = 0x08;
        const FIELDS = 0x10;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u8 {
        const BEGIN = 0x01;
        /// begin stored as i32 instead of u16
        const BEGIN_WIDE = 0x02;
        const SHORT_NAME = 0x04;
        const TYPE_NAME = 0x08;
        /// id stored as u16 (or u8 with `ID_BYTE`) instead of u32
        const ID_NARROW = 0x10;
        const ID_BYTE = 0x20;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GlobalFlags: u8 {
        const BEGIN_WIDE = 0x01;
        const SHORT_NAME = 0x02;
        const TYPE_NAME = 0x04;
        const ID_WIDE = 0x08;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FunctionFlags: u8 {
        const BEGIN_WIDE = 0x01;
        /// end stored in full; otherwise a u16 delta from begin
        const END_EXPLICIT = 0x02;
        const END_WIDE = 0x04;
        const SHORT_NAME = 0x08;
        const FULL_NAME = 0x10;
        const ID_WIDE = 0x20;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegistrationFlags: u8 {
        const INTERFACE_SHORT = 0x01;
        const IMPLEMENTATION_SHORT = 0x02;
        const VTABLE = 0x04;
        const OFFSET = 0x08;
        const OFFSET_BYTE = 0x10;
        const OFFSET_SHORT = 0x20;
    }
}

fn read_u32_or_u64<R: Read>(reader: &mut R, wide: bool) -> Result<u64> {
    Ok(if wide {
        reader.read_u64::<LE>()?
    } else {
        u64::from(reader.read_u32::<LE>()?)
    })
}

fn write_u32_or_u64<W: Write>(writer: &mut W, value: u64, wide: bool) -> Result<()> {
    if wide {
        writer.write_u64::<LE>(value)?;
    } else {
        writer.write_u32::<LE>(value as u32)?;
    }
    Ok(())
}

fn is_wide(value: u64) -> bool {
    value > u64::from(u32::MAX)
}

fn write_opt_string<W: Write>(writer: &mut W, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        write_string(writer, value)?;
    }
    Ok(())
}

impl Record for TypeRecord {
    const KIND: RecordKind = RecordKind::Type;

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = TypeFlags::from_bits_retain(reader.read_u8()?);

        let vtable = if flags.contains(TypeFlags::VTABLE) {
            Some(read_u32_or_u64(reader, flags.contains(TypeFlags::VTABLE_WIDE))?)
        } else {
            None
        };

        let name = read_string(reader)?;
        let size = if flags.contains(TypeFlags::SIZE) {
            Some(reader.read_i32::<LE>()?)
        } else {
            None
        };

        let id = read_u32_or_u64(reader, flags.contains(TypeFlags::ID_WIDE))?;
        let fields = if flags.contains(TypeFlags::FIELDS) {
            Some(decode_list::<FieldRecord, _>(reader)?)
        } else {
            None
        };

        Ok(Self {
            id,
            vtable,
            name,
            size,
            fields,
        })
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut flags = TypeFlags::empty();
        if let Some(vtable) = self.vtable {
            flags |= TypeFlags::VTABLE;
            flags.set(TypeFlags::VTABLE_WIDE, is_wide(vtable));
        }
        flags.set(TypeFlags::SIZE, self.size.is_some());
        flags.set(TypeFlags::ID_WIDE, is_wide(self.id));
        flags.set(TypeFlags::FIELDS, self.fields.is_some());

        writer.write_u8(flags.bits())?;

        if let Some(vtable) = self.vtable {
            write_u32_or_u64(writer, vtable, flags.contains(TypeFlags::VTABLE_WIDE))?;
        }
        write_string(writer, &self.name)?;
        if let Some(size) = self.size {
            writer.write_i32::<LE>(size)?;
        }
        write_u32_or_u64(writer, self.id, flags.contains(TypeFlags::ID_WIDE))?;
        if let Some(fields) = &self.fields {
            encode_list(writer, fields)?;
        }
        Ok(())
    }
}

impl Record for FieldRecord {
    const KIND: RecordKind = RecordKind::Field;

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = FieldFlags::from_bits_retain(reader.read_u8()?);

        let begin = if flags.contains(FieldFlags::BEGIN) {
            Some(if flags.contains(FieldFlags::BEGIN_WIDE) {
                reader.read_i32::<LE>()?
            } else {
                i32::from(reader.read_u16::<LE>()?)
            })
        } else {
            None
        };

        let short_name = if flags.contains(FieldFlags::SHORT_NAME) {
            Some(read_string(reader)?)
        } else {
            None
        };
        let type_name = if flags.contains(FieldFlags::TYPE_NAME) {
            Some(read_string(reader)?)
        } else {
            None
        };

        let field_id = if !flags.contains(FieldFlags::ID_NARROW) {
            reader.read_u32::<LE>()?
        } else if flags.contains(FieldFlags::ID_BYTE) {
            u32::from(reader.read_u8()?)
        } else {
            u32::from(reader.read_u16::<LE>()?)
        };

        Ok(Self {
            field_id,
            begin,
            short_name,
            type_name,
        })
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut flags = FieldFlags::empty();
        if let Some(begin) = self.begin {
            flags |= FieldFlags::BEGIN;
            flags.set(FieldFlags::BEGIN_WIDE, !(0..=0xFFFF).contains(&begin));
        }
        flags.set(FieldFlags::SHORT_NAME, self.short_name.is_some());
        flags.set(FieldFlags::TYPE_NAME, self.type_name.is_some());
        if self.field_id <= 0xFF {
            flags |= FieldFlags::ID_NARROW | FieldFlags::ID_BYTE;
        } else if self.field_id <= 0xFFFF {
            flags |= FieldFlags::ID_NARROW;
        }

        writer.write_u8(flags.bits())?;

        if let Some(begin) = self.begin {
            if flags.contains(FieldFlags::BEGIN_WIDE) {
                writer.write_i32::<LE>(begin)?;
            } else {
                writer.write_u16::<LE>(begin as u16)?;
            }
        }
        write_opt_string(writer, self.short_name.as_deref())?;
        write_opt_string(writer, self.type_name.as_deref())?;

        if !flags.contains(FieldFlags::ID_NARROW) {
            writer.write_u32::<LE>(self.field_id)?;
        } else if flags.contains(FieldFlags::ID_BYTE) {
            writer.write_u8(self.field_id as u8)?;
        } else {
            writer.write_u16::<LE>(self.field_id as u16)?;
        }
        Ok(())
    }
}

impl Record for GlobalRecord {
    const KIND: RecordKind = RecordKind::Global;

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = GlobalFlags::from_bits_retain(reader.read_u8()?);

        let begin = read_u32_or_u64(reader, flags.contains(GlobalFlags::BEGIN_WIDE))?;
        let short_name = if flags.contains(GlobalFlags::SHORT_NAME) {
            Some(read_string(reader)?)
        } else {
            None
        };
        let type_name = if flags.contains(GlobalFlags::TYPE_NAME) {
            Some(read_string(reader)?)
        } else {
            None
        };
        let id = read_u32_or_u64(reader, flags.contains(GlobalFlags::ID_WIDE))?;

        Ok(Self {
            id,
            begin,
            short_name,
            type_name,
        })
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut flags = GlobalFlags::empty();
        flags.set(GlobalFlags::BEGIN_WIDE, is_wide(self.begin));
        flags.set(GlobalFlags::SHORT_NAME, self.short_name.is_some());
        flags.set(GlobalFlags::TYPE_NAME, self.type_name.is_some());
        flags.set(GlobalFlags::ID_WIDE, is_wide(self.id));

        writer.write_u8(flags.bits())?;

        write_u32_or_u64(writer, self.begin, flags.contains(GlobalFlags::BEGIN_WIDE))?;
        write_opt_string(writer, self.short_name.as_deref())?;
        write_opt_string(writer, self.type_name.as_deref())?;
        write_u32_or_u64(writer, self.id, flags.contains(GlobalFlags::ID_WIDE))?;
        Ok(())
    }
}

impl Record for FunctionRecord {
    const KIND: RecordKind = RecordKind::Function;

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = FunctionFlags::from_bits_retain(reader.read_u8()?);

        let begin = read_u32_or_u64(reader, flags.contains(FunctionFlags::BEGIN_WIDE))?;
        let end = if flags.contains(FunctionFlags::END_EXPLICIT) {
            read_u32_or_u64(reader, flags.contains(FunctionFlags::END_WIDE))?
        } else {
            let delta = reader.read_u16::<LE>()?;
            begin.checked_add(u64::from(delta)).ok_or_else(|| {
                Error::malformed(format!(
                    "Function end overflows: begin {:#x} + {:#x}",
                    begin, delta
                ))
            })?
        };

        let short_name = if flags.contains(FunctionFlags::SHORT_NAME) {
            Some(read_string(reader)?)
        } else {
            None
        };
        let full_name = if flags.contains(FunctionFlags::FULL_NAME) {
            Some(read_string(reader)?)
        } else {
            None
        };
        let id = read_u32_or_u64(reader, flags.contains(FunctionFlags::ID_WIDE))?;

        Ok(Self {
            id,
            begin,
            end,
            short_name,
            full_name,
        })
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut flags = FunctionFlags::empty();
        flags.set(FunctionFlags::BEGIN_WIDE, is_wide(self.begin));
        if self.end < self.begin || self.end - self.begin > 0xFFFF {
            flags |= FunctionFlags::END_EXPLICIT;
            flags.set(FunctionFlags::END_WIDE, is_wide(self.end));
        }
        flags.set(FunctionFlags::SHORT_NAME, self.short_name.is_some());
        flags.set(FunctionFlags::FULL_NAME, self.full_name.is_some());
        flags.set(FunctionFlags::ID_WIDE, is_wide(self.id));

        writer.write_u8(flags.bits())?;

        write_u32_or_u64(writer, self.begin, flags.contains(FunctionFlags::BEGIN_WIDE))?;
        if flags.contains(FunctionFlags::END_EXPLICIT) {
            write_u32_or_u64(writer, self.end, flags.contains(FunctionFlags::END_WIDE))?;
        } else {
            writer.write_u16::<LE>((self.end - self.begin) as u16)?;
        }
        write_opt_string(writer, self.short_name.as_deref())?;
        write_opt_string(writer, self.full_name.as_deref())?;
        write_u32_or_u64(writer, self.id, flags.contains(FunctionFlags::ID_WIDE))?;
        Ok(())
    }
}

impl Record for RegistrationRecord {
    const KIND: RecordKind = RecordKind::Registration;

    fn decode<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = RegistrationFlags::from_bits_retain(reader.read_u8()?);

        let interface_id = if flags.contains(RegistrationFlags::INTERFACE_SHORT) {
            u32::from(reader.read_u16::<LE>()?)
        } else {
            reader.read_u32::<LE>()?
        };
        let implementation_id = if flags.contains(RegistrationFlags::IMPLEMENTATION_SHORT) {
            u32::from(reader.read_u16::<LE>()?)
        } else {
            reader.read_u32::<LE>()?
        };

        let vtable_offset = if flags.contains(RegistrationFlags::VTABLE) {
            Some(reader.read_i32::<LE>()?)
        } else {
            None
        };

        let offset_in_type = if flags.contains(RegistrationFlags::OFFSET) {
            let width = if flags.contains(RegistrationFlags::OFFSET_BYTE) {
                OffsetWidth::Byte
            } else if flags.contains(RegistrationFlags::OFFSET_SHORT) {
                OffsetWidth::Short
            } else {
                OffsetWidth::Full
            };
            Some(read_offset(reader, width)?)
        } else {
            None
        };

        Ok(Self {
            interface_id,
            implementation_id,
            vtable_offset,
            offset_in_type,
        })
    }

    fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut flags = RegistrationFlags::empty();
        flags.set(RegistrationFlags::INTERFACE_SHORT, self.interface_id <= 0xFFFF);
        flags.set(
            RegistrationFlags::IMPLEMENTATION_SHORT,
            self.implementation_id <= 0xFFFF,
        );
        flags.set(RegistrationFlags::VTABLE, self.vtable_offset.is_some());
        let offset_width = self.offset_in_type.map(OffsetWidth::of);
        match offset_width {
            Some(OffsetWidth::Byte) => {
                flags |= RegistrationFlags::OFFSET | RegistrationFlags::OFFSET_BYTE
            }
            Some(OffsetWidth::Short) => {
                flags |= RegistrationFlags::OFFSET | RegistrationFlags::OFFSET_SHORT
            }
            Some(OffsetWidth::Full) => flags |= RegistrationFlags::OFFSET,
            None => {}
        }

        writer.write_u8(flags.bits())?;

        if flags.contains(RegistrationFlags::INTERFACE_SHORT) {
            writer.write_u16::<LE>(self.interface_id as u16)?;
        } else {
            writer.write_u32::<LE>(self.interface_id)?;
        }
        if flags.contains(RegistrationFlags::IMPLEMENTATION_SHORT) {
            writer.write_u16::<LE>(self.implementation_id as u16)?;
        } else {
            writer.write_u32::<LE>(self.implementation_id)?;
        }
        if let Some(vtable_offset) = self.vtable_offset {
            writer.write_i32::<LE>(vtable_offset)?;
        }
        if let (Some(offset), Some(width)) = (self.offset_in_type, offset_width) {
            write_offset(writer, offset, width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ID_BOUNDARIES: [u64; 9] = [
        0,
        0xFF,
        0x100,
        0xFFFF,
        0x1_0000,
        0xFFFF_FFFF,
        0x1_0000_0000,
        u64::MAX - 1,
        u64::MAX,
    ];

    fn roundtrip<T: Record + PartialEq + std::fmt::Debug>(record: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        record.encode(&mut buf).unwrap();
        let mut cursor = Cursor::new(&buf);
        let decoded = T::decode(&mut cursor).unwrap();
        assert_eq!(&decoded, record);
        assert_eq!(cursor.position() as usize, buf.len(), "trailing bytes");
        buf
    }

    #[test]
    fn test_type_record_boundaries() {
        for &id in &ID_BOUNDARIES {
            let buf = roundtrip(&TypeRecord::new(id, "TESForm"));
            let flags = TypeFlags::from_bits_retain(buf[0]);
            assert_eq!(flags.contains(TypeFlags::ID_WIDE), id > u64::from(u32::MAX));
        }
        roundtrip(&TypeRecord::new(1, "").with_vtable(0));
        roundtrip(&TypeRecord::new(1, "Wide").with_vtable(0x1_4000_0000));
        roundtrip(&TypeRecord::new(1, "Sized").with_size(-1));
        roundtrip(&TypeRecord::new(1, "NoFields").with_fields(Vec::new()));
    }

    #[test]
    fn test_type_record_with_fields() {
        let ty = TypeRecord::new(0x1234_5678_9A, "PlayerCharacter")
            .with_vtable(0x0166_0F40)
            .with_size(0xBE0)
            .with_fields(vec![
                FieldRecord {
                    field_id: 1,
                    begin: Some(0),
                    short_name: Some("vtable".to_string()),
                    type_name: Some("void**".to_string()),
                },
                FieldRecord {
                    field_id: 0x1_0000,
                    begin: Some(-8),
                    short_name: None,
                    type_name: None,
                },
            ]);
        let buf = roundtrip(&ty);
        let flags = TypeFlags::from_bits_retain(buf[0]);
        assert!(flags.contains(TypeFlags::VTABLE | TypeFlags::SIZE | TypeFlags::FIELDS));
        assert!(flags.contains(TypeFlags::ID_WIDE));
        assert!(!flags.contains(TypeFlags::VTABLE_WIDE));
    }

    #[test]
    fn test_field_id_widths() {
        let sizes: Vec<usize> = [0u32, 0xFF, 0x100, 0xFFFF, 0x1_0000, u32::MAX]
            .iter()
            .map(|&field_id| {
                roundtrip(&FieldRecord {
                    field_id,
                    ..Default::default()
                })
                .len()
            })
            .collect();
        // flag byte + id of 1, 1, 2, 2, 4, 4 bytes
        assert_eq!(sizes, vec![2, 2, 3, 3, 5, 5]);
    }

    #[test]
    fn test_field_begin_widths() {
        for begin in [0, 0xFFFF, 0x1_0000, -1, i32::MIN, i32::MAX] {
            roundtrip(&FieldRecord {
                field_id: 9,
                begin: Some(begin),
                short_name: Some("x".to_string()),
                type_name: Some("float".to_string()),
            });
        }
    }

    #[test]
    fn test_global_record_boundaries() {
        for &id in &ID_BOUNDARIES {
            for begin in [0, 0x02F2_6EF8, u64::from(u32::MAX), u64::MAX] {
                let buf = roundtrip(&GlobalRecord {
                    id,
                    begin,
                    short_name: Some("g_player".to_string()),
                    type_name: Some("PlayerCharacter*".to_string()),
                });
                let flags = GlobalFlags::from_bits_retain(buf[0]);
                assert_eq!(
                    flags.contains(GlobalFlags::ID_WIDE),
                    id > u64::from(u32::MAX),
                    "id {:#x}",
                    id
                );
                assert_eq!(flags.contains(GlobalFlags::BEGIN_WIDE), begin > u64::from(u32::MAX));
            }
        }
        let buf = roundtrip(&GlobalRecord {
            id: 1,
            begin: 2,
            short_name: None,
            type_name: None,
        });
        assert_eq!(buf.len(), 9);
    }

    #[test]
    fn test_function_end_delta_encoding() {
        let short = FunctionRecord::new(49978, 0x0084_6F20, 0x0084_7000);
        let buf = roundtrip(&short);
        let flags = FunctionFlags::from_bits_retain(buf[0]);
        assert!(!flags.contains(FunctionFlags::END_EXPLICIT));
        // flags + u32 begin + u16 delta + u32 id
        assert_eq!(buf.len(), 11);

        let exact_limit = FunctionRecord::new(1, 0x1000, 0x1000 + 0xFFFF);
        let buf = roundtrip(&exact_limit);
        assert!(!FunctionFlags::from_bits_retain(buf[0]).contains(FunctionFlags::END_EXPLICIT));

        let long = FunctionRecord::new(1, 0x1000, 0x1000 + 0x1_0000);
        let buf = roundtrip(&long);
        assert!(FunctionFlags::from_bits_retain(buf[0]).contains(FunctionFlags::END_EXPLICIT));
    }

    #[test]
    fn test_function_record_boundaries() {
        for &id in &ID_BOUNDARIES {
            let buf = roundtrip(&FunctionRecord::new(id, 0x1000, 0x1040).with_short_name("f"));
            let flags = FunctionFlags::from_bits_retain(buf[0]);
            assert_eq!(
                flags.contains(FunctionFlags::ID_WIDE),
                id > u64::from(u32::MAX),
                "id {:#x}",
                id
            );
        }

        roundtrip(&FunctionRecord::new(0, 0, 0));
        roundtrip(&FunctionRecord::new(1, 0x2000, 0x1000).with_short_name("Backwards"));
        roundtrip(&FunctionRecord::new(u64::MAX, u64::MAX - 1, u64::MAX).with_full_name("Edge"));
        roundtrip(
            &FunctionRecord::new(0x1_0000_0000, 0x1_4000_0000, 0x2_0000_0000)
                .with_short_name("Update")
                .with_full_name("PlayerCharacter::Update(float)"),
        );
    }

    #[test]
    fn test_function_end_overflow_is_malformed() {
        // begin = u64::MAX with a non-explicit end delta of 1
        let mut buf = vec![FunctionFlags::BEGIN_WIDE.bits()];
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());

        let err = FunctionRecord::decode(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[test]
    fn test_registration_record_boundaries() {
        for offset in [None, Some(0), Some(0xFF), Some(0x100), Some(0xFFFF), Some(0x1_0000), Some(-4)] {
            for vtable_offset in [None, Some(0), Some(0x10)] {
                roundtrip(&RegistrationRecord {
                    interface_id: 0xFFFF,
                    implementation_id: 0x1_0000,
                    vtable_offset,
                    offset_in_type: offset,
                });
            }
        }
    }

    #[test]
    fn test_registration_id_widths() {
        let ids = [0u32, 0xFF, 0x100, 0xFFFF, 0x1_0000, u32::MAX];
        for &interface_id in &ids {
            for &implementation_id in &ids {
                let buf = roundtrip(&RegistrationRecord {
                    interface_id,
                    implementation_id,
                    vtable_offset: None,
                    offset_in_type: None,
                });
                let flags = RegistrationFlags::from_bits_retain(buf[0]);
                assert_eq!(
                    flags.contains(RegistrationFlags::INTERFACE_SHORT),
                    interface_id <= 0xFFFF
                );
                assert_eq!(
                    flags.contains(RegistrationFlags::IMPLEMENTATION_SHORT),
                    implementation_id <= 0xFFFF
                );
                let id_bytes = |id: u32| if id <= 0xFFFF { 2 } else { 4 };
                assert_eq!(buf.len(), 1 + id_bytes(interface_id) + id_bytes(implementation_id));
            }
        }
    }

    #[test]
    fn test_truncated_record_is_io_error() {
        let mut buf = Vec::new();
        TypeRecord::new(7, "Truncated").encode(&mut buf).unwrap();
        buf.truncate(buf.len() - 2);
        let err = TypeRecord::decode(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
