//! Packing and unpacking of tuples as fixed-width byte records.

use crate::error::EncodingError;
use crate::types::{Domain, Schema, Tuple, Value};

use super::STR_FIELD_LEN;

/// Append the packed form of a single value to `out`.
///
/// Integers are written big-endian; floats are written as their IEEE-754 bit
/// pattern in little-endian byte order; `Char` keeps the low 8 bits of the
/// code point; `Str` occupies [`STR_FIELD_LEN`] bytes, NUL-padded, truncated
/// when longer.
pub fn pack_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::I8(v) => out.push(*v as u8),
        Value::I16(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::I32(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::I64(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::F32(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
        Value::F64(v) => out.extend_from_slice(&v.to_bits().to_le_bytes()),
        Value::Char(c) => out.push(*c as u32 as u8),
        Value::Str(s) => {
            let bytes = s.as_bytes();
            let len = bytes.len().min(STR_FIELD_LEN);
            out.extend_from_slice(&bytes[..len]);
            out.resize(out.len() + (STR_FIELD_LEN - len), 0x00);
        }
    }
}

/// Read one value of the given domain from `bytes` at `offset`.
///
/// Returns the value and the offset just past it.
pub fn unpack_value(
    domain: Domain,
    bytes: &[u8],
    offset: usize,
) -> Result<(Value, usize), EncodingError> {
    let width = domain.byte_width();
    let remaining = bytes.len().saturating_sub(offset);
    if remaining < width {
        return Err(EncodingError::TruncatedRecord {
            offset,
            needed: width,
            remaining,
        });
    }
    let field = &bytes[offset..offset + width];
    let value = match domain {
        Domain::I8 => Value::I8(field[0] as i8),
        Domain::I16 => Value::I16(i16::from_be_bytes([field[0], field[1]])),
        Domain::I32 => Value::I32(i32::from_be_bytes(field.try_into().unwrap())),
        Domain::I64 => Value::I64(i64::from_be_bytes(field.try_into().unwrap())),
        Domain::F32 => Value::F32(f32::from_bits(u32::from_le_bytes(field.try_into().unwrap()))),
        Domain::F64 => Value::F64(f64::from_bits(u64::from_le_bytes(field.try_into().unwrap()))),
        Domain::Char => Value::Char(field[0] as char),
        Domain::Str => {
            let end = field.iter().position(|&b| b == 0x00).unwrap_or(width);
            Value::Str(String::from_utf8_lossy(&field[..end]).into_owned())
        }
    };
    Ok((value, offset + width))
}

/// Pack a tuple into a record of exactly `schema.record_size()` bytes.
///
/// The tuple is assumed to have passed the schema's type check; packing is
/// positional and does not re-validate domains.
pub fn pack_tuple(schema: &Schema, tuple: &[Value]) -> Vec<u8> {
    let mut record = Vec::with_capacity(schema.record_size());
    for value in tuple {
        pack_value(value, &mut record);
    }
    record
}

/// Reconstruct a tuple from a packed record.
pub fn unpack_tuple(schema: &Schema, record: &[u8]) -> Result<Tuple, EncodingError> {
    let mut tuple = Vec::with_capacity(schema.len());
    let mut offset = 0;
    for attr in schema.attributes() {
        let (value, next) = unpack_value(attr.domain, record, offset)?;
        tuple.push(value);
        offset = next;
    }
    Ok(tuple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attribute;

    fn pack_one(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        pack_value(value, &mut out);
        out
    }

    // -----------------------------------------------------------------------
    // Byte-level format
    // -----------------------------------------------------------------------

    #[test]
    fn test_integers_are_big_endian() {
        assert_eq!(pack_one(&Value::I16(0x0102)), vec![0x01, 0x02]);
        assert_eq!(
            pack_one(&Value::I32(0x01020304)),
            vec![0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(
            pack_one(&Value::I64(0x0102030405060708)),
            vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
        assert_eq!(pack_one(&Value::I16(-2)), vec![0xFF, 0xFE]);
    }

    #[test]
    fn test_floats_are_little_endian_bit_patterns() {
        // 1.0f32 = 0x3F800000: low byte first.
        assert_eq!(pack_one(&Value::F32(1.0)), vec![0x00, 0x00, 0x80, 0x3F]);
        // 1.0f64 = 0x3FF0000000000000.
        assert_eq!(
            pack_one(&Value::F64(1.0)),
            vec![0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xF0, 0x3F]
        );
    }

    #[test]
    fn test_char_packs_low_byte() {
        assert_eq!(pack_one(&Value::Char('A')), vec![0x41]);
    }

    #[test]
    fn test_str_is_nul_padded_to_field_width() {
        let packed = pack_one(&Value::from("abc"));
        assert_eq!(packed.len(), STR_FIELD_LEN);
        assert_eq!(&packed[..3], b"abc");
        assert!(packed[3..].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_str_truncates_at_field_width() {
        let long = "x".repeat(80);
        let packed = pack_one(&Value::from(long.as_str()));
        assert_eq!(packed.len(), STR_FIELD_LEN);
        let (value, _) = unpack_value(Domain::Str, &packed, 0).unwrap();
        assert_eq!(value, Value::from("x".repeat(64).as_str()));
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[test]
    fn test_scalar_roundtrips() {
        let values = vec![
            Value::I8(-5),
            Value::I16(i16::MIN),
            Value::I32(123_456_789),
            Value::I64(i64::MAX),
            Value::F32(-0.25),
            Value::F64(std::f64::consts::PI),
            Value::Char('Z'),
            Value::from("Star_Wars"),
        ];
        for v in values {
            let packed = pack_one(&v);
            assert_eq!(packed.len(), v.domain().byte_width());
            let (back, consumed) = unpack_value(v.domain(), &packed, 0).unwrap();
            assert_eq!(back, v, "roundtrip failed for {v:?}");
            assert_eq!(consumed, packed.len());
        }
    }

    #[test]
    fn test_tuple_roundtrip() {
        let schema = Schema::new(
            vec![
                Attribute::new("title", Domain::Str),
                Attribute::new("year", Domain::I32),
                Attribute::new("length", Domain::I16),
                Attribute::new("genre", Domain::Char),
                Attribute::new("rating", Domain::F64),
            ],
            vec!["title".to_string()],
        )
        .unwrap();
        let tuple = vec![
            Value::from("Rogue_One"),
            Value::I32(2016),
            Value::I16(133),
            Value::Char('S'),
            Value::F64(7.8),
        ];
        let record = pack_tuple(&schema, &tuple);
        assert_eq!(record.len(), schema.record_size());
        let back = unpack_tuple(&schema, &record).unwrap();
        assert_eq!(back, tuple);
    }

    #[test]
    fn test_unpack_rejects_truncated_record() {
        let schema = Schema::new(
            vec![Attribute::new("n", Domain::I64)],
            vec!["n".to_string()],
        )
        .unwrap();
        let err = unpack_tuple(&schema, &[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, EncodingError::TruncatedRecord { .. }));
    }
}
