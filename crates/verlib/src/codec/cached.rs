//! Run-length encoding of the cached value table.
//!
//! The table is a sparse sequence of optional i32 values. It is stored as the
//! total slot count followed by signed run markers: `+N` is followed by N
//! values, `-N` stands for N absent slots with no payload.

use std::io::{Read, Write};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};

use super::{PREALLOC_LIMIT, read_count, write_count};
use crate::error::{Error, Result};
use crate::record::RecordKind;

/// Signed run markers for `values`, maximal runs only
pub fn run_markers(values: &[Option<i32>]) -> Vec<i32> {
    let mut markers = Vec::new();
    let mut rest = values;

    while let Some(first) = rest.first() {
        let present = first.is_some();
        let len = rest
            .iter()
            .position(|v| v.is_some() != present)
            .unwrap_or(rest.len());

        // Runs longer than i32::MAX are split; the next run then shares the sign.
        let len = len.min(i32::MAX as usize);
        markers.push(if present { len as i32 } else { -(len as i32) });
        rest = &rest[len..];
    }

    markers
}

pub fn encode_cached_values<W: Write>(writer: &mut W, values: &[Option<i32>]) -> Result<()> {
    write_count(writer, values.len())?;

    let mut index = 0;
    for marker in run_markers(values) {
        writer.write_i32::<LE>(marker)?;
        let len = marker.unsigned_abs() as usize;
        if marker > 0 {
            for value in values[index..index + len].iter().flatten() {
                writer.write_i32::<LE>(*value)?;
            }
        }
        index += len;
    }
    Ok(())
}

pub fn decode_cached_values<R: Read>(reader: &mut R) -> Result<Vec<Option<i32>>> {
    let total = read_count(reader, RecordKind::CachedValue)?;
    let mut values = Vec::with_capacity(total.min(PREALLOC_LIMIT * 16));

    while values.len() < total {
        let marker = reader.read_i32::<LE>()?;
        if marker == 0 {
            return Err(Error::malformed("Cached value run of length zero"));
        }

        let len = marker.unsigned_abs() as usize;
        if len > total - values.len() {
            return Err(Error::malformed(format!(
                "Cached value run of {} overruns declared total {} at slot {}",
                len,
                total,
                values.len()
            )));
        }

        if marker > 0 {
            for _ in 0..len {
                values.push(Some(reader.read_i32::<LE>()?));
            }
        } else {
            values.resize(values.len() + len, None);
        }
    }

    Ok(values)
}
