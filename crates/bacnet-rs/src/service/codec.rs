// crates/bacnet-rs/src/service/codec.rs
//! Shared helpers for encoding/decoding a [`PropertyValue`] against a context tag,
//! used by every service whose parameter list carries an application value wrapped
//! in an opening/closing context tag (§4.5, Clause 20.2.1.3.2).

use crate::hal::BacnetError;
use crate::object::PropertyValue;
use crate::primitive::*;
use crate::tag::{decode_tag, encode_closing_tag, encode_opening_tag, encode_tag, TagClass};

fn require(buffer: &[u8], len: usize) -> Result<(), BacnetError> {
    if buffer.len() < len {
        Err(BacnetError::BufferTooShort)
    } else {
        Ok(())
    }
}

fn context_decode_and_check(buffer: &[u8], expected: u32) -> Result<(usize, usize), BacnetError> {
    let (hdr, consumed) = decode_tag(buffer)?;
    if hdr.class != TagClass::Context || hdr.number != expected || !hdr.is_data() {
        return Err(BacnetError::InvalidTag);
    }
    Ok((consumed, hdr.length_value as usize))
}

/// Encodes an unsigned value under a context tag (used for property identifiers,
/// array indices, process identifiers, etc).
pub fn encode_context_unsigned(
    buffer: &mut [u8],
    context_tag: u32,
    value: u64,
) -> Result<usize, BacnetError> {
    let len = if value == 0 {
        1
    } else {
        ((64 - value.leading_zeros() as usize) + 7) / 8
    };
    let header_len = crate::tag::tag_encoded_len(context_tag, len as u32);
    require(buffer, header_len + len)?;
    let n = encode_tag(buffer, context_tag, TagClass::Context, len as u32)?;
    let be = value.to_be_bytes();
    buffer[n..n + len].copy_from_slice(&be[8 - len..]);
    Ok(n + len)
}

pub fn decode_context_unsigned(buffer: &[u8], context_tag: u32) -> Result<(u64, usize), BacnetError> {
    let (hdr_len, value_len) = context_decode_and_check(buffer, context_tag)?;
    if value_len == 0 || value_len > 8 {
        return Err(BacnetError::InvalidValue);
    }
    require(buffer, hdr_len + value_len)?;
    let mut acc = 0u64;
    for &b in &buffer[hdr_len..hdr_len + value_len] {
        acc = (acc << 8) | b as u64;
    }
    Ok((acc, hdr_len + value_len))
}

pub fn encode_context_object_id(
    buffer: &mut [u8],
    context_tag: u32,
    value: ObjectIdentifier,
) -> Result<usize, BacnetError> {
    let n = encode_tag(buffer, context_tag, TagClass::Context, 4)?;
    require(buffer, n + 4)?;
    let raw = ((value.object_type as u32 & 0x3FF) << 22) | (value.instance & 0x3F_FFFF);
    buffer[n..n + 4].copy_from_slice(&raw.to_be_bytes());
    Ok(n + 4)
}

pub fn decode_context_object_id(
    buffer: &[u8],
    context_tag: u32,
) -> Result<(ObjectIdentifier, usize), BacnetError> {
    let (hdr_len, value_len) = context_decode_and_check(buffer, context_tag)?;
    if value_len != 4 {
        return Err(BacnetError::InvalidValue);
    }
    require(buffer, hdr_len + 4)?;
    let bytes: [u8; 4] = buffer[hdr_len..hdr_len + 4].try_into().unwrap();
    let raw = u32::from_be_bytes(bytes);
    Ok((
        ObjectIdentifier::new(((raw >> 22) & 0x3FF) as u16, raw & 0x3F_FFFF),
        hdr_len + 4,
    ))
}

/// `true` if the next tag in `buffer` is a context tag numbered `context_tag` (used
/// to decide whether an OPTIONAL context-tagged parameter is present).
pub fn peek_context_tag(buffer: &[u8], context_tag: u32) -> bool {
    match decode_tag(buffer) {
        Ok((hdr, _)) => hdr.class == TagClass::Context && hdr.number == context_tag,
        Err(_) => false,
    }
}

pub fn encode_context_wrapped_value(
    buffer: &mut [u8],
    context_tag: u32,
    value: &PropertyValue,
) -> Result<usize, BacnetError> {
    let mut idx = encode_opening_tag(buffer, context_tag)?;
    idx += encode_property_value(&mut buffer[idx..], value)?;
    idx += encode_closing_tag(&mut buffer[idx..], context_tag)?;
    Ok(idx)
}

pub fn decode_context_wrapped_value(
    buffer: &[u8],
    context_tag: u32,
) -> Result<(PropertyValue, usize), BacnetError> {
    let (open, mut idx) = decode_tag(buffer)?;
    if open.class != TagClass::Context || open.number != context_tag || !open.is_opening() {
        return Err(BacnetError::InvalidTag);
    }
    let (value, consumed) = decode_property_value(&buffer[idx..])?;
    idx += consumed;
    let (close, close_len) = decode_tag(&buffer[idx..])?;
    if close.class != TagClass::Context || close.number != context_tag || !close.is_closing() {
        return Err(BacnetError::InvalidTag);
    }
    idx += close_len;
    Ok((value, idx))
}

pub fn encode_property_value(buffer: &mut [u8], value: &PropertyValue) -> Result<usize, BacnetError> {
    match value {
        PropertyValue::Null => encode_application_null(buffer),
        PropertyValue::Boolean(v) => encode_application_boolean(buffer, *v),
        PropertyValue::Unsigned(v) => encode_application_unsigned(buffer, *v),
        PropertyValue::Signed(v) => encode_application_signed(buffer, *v),
        PropertyValue::Real(v) => encode_application_real(buffer, *v),
        PropertyValue::Double(v) => encode_application_double(buffer, *v),
        PropertyValue::Enumerated(v) => encode_application_enumerated(buffer, *v),
        PropertyValue::CharacterString(v) => encode_application_character_string(buffer, v),
        PropertyValue::OctetString(v) => encode_application_octet_string(buffer, v),
        PropertyValue::BitString(v) => encode_application_bit_string(buffer, v),
        PropertyValue::Date(v) => encode_application_date(buffer, *v),
        PropertyValue::Time(v) => encode_application_time(buffer, *v),
        PropertyValue::ObjectIdentifier(v) => encode_application_object_id(buffer, *v),
        PropertyValue::ObjectIdentifierList(list) => {
            let mut idx = 0;
            for oid in list {
                idx += encode_application_object_id(&mut buffer[idx..], *oid)?;
            }
            Ok(idx)
        }
    }
}

/// Decodes a single application-tagged value by sniffing the tag number that leads
/// `buffer` (§8 property: the decoder never needs an out-of-band type hint for a
/// primitive value).
pub fn decode_property_value(buffer: &[u8]) -> Result<(PropertyValue, usize), BacnetError> {
    let (hdr, _) = decode_tag(buffer)?;
    if hdr.class != TagClass::Application {
        return Err(BacnetError::InvalidTag);
    }
    Ok(match hdr.number {
        TAG_NULL => {
            let n = decode_application_null(buffer)?;
            (PropertyValue::Null, n)
        }
        TAG_BOOLEAN => {
            let (v, n) = decode_application_boolean(buffer)?;
            (PropertyValue::Boolean(v), n)
        }
        TAG_UNSIGNED => {
            let (v, n) = decode_application_unsigned(buffer)?;
            (PropertyValue::Unsigned(v), n)
        }
        TAG_SIGNED => {
            let (v, n) = decode_application_signed(buffer)?;
            (PropertyValue::Signed(v), n)
        }
        TAG_REAL => {
            let (v, n) = decode_application_real(buffer)?;
            (PropertyValue::Real(v), n)
        }
        TAG_DOUBLE => {
            let (v, n) = decode_application_double(buffer)?;
            (PropertyValue::Double(v), n)
        }
        TAG_OCTET_STRING => {
            let (v, n) = decode_application_octet_string(buffer)?;
            (PropertyValue::OctetString(v), n)
        }
        TAG_CHARACTER_STRING => {
            let (v, n) = decode_application_character_string(buffer)?;
            (PropertyValue::CharacterString(v), n)
        }
        TAG_BIT_STRING => {
            let (v, n) = decode_application_bit_string(buffer)?;
            (PropertyValue::BitString(v), n)
        }
        TAG_ENUMERATED => {
            let (v, n) = decode_application_enumerated(buffer)?;
            (PropertyValue::Enumerated(v), n)
        }
        TAG_DATE => {
            let (v, n) = decode_application_date(buffer)?;
            (PropertyValue::Date(v), n)
        }
        TAG_TIME => {
            let (v, n) = decode_application_time(buffer)?;
            (PropertyValue::Time(v), n)
        }
        TAG_OBJECT_ID => {
            let (v, n) = decode_application_object_id(buffer)?;
            (PropertyValue::ObjectIdentifier(v), n)
        }
        _ => return Err(BacnetError::InvalidTag),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wrapped_real_round_trip() {
        let mut buf = [0u8; 16];
        let value = PropertyValue::Real(21.5);
        let n = encode_context_wrapped_value(&mut buf, 3, &value).unwrap();
        let (decoded, consumed) = decode_context_wrapped_value(&buf[..n], 3).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, n);
    }

    #[test]
    fn context_wrapped_null_round_trip_for_relinquish() {
        let mut buf = [0u8; 8];
        let n = encode_context_wrapped_value(&mut buf, 3, &PropertyValue::Null).unwrap();
        let (decoded, _) = decode_context_wrapped_value(&buf[..n], 3).unwrap();
        assert_eq!(decoded, PropertyValue::Null);
    }

    #[test]
    fn mismatched_context_tag_number_is_rejected() {
        let mut buf = [0u8; 8];
        let n = encode_context_wrapped_value(&mut buf, 3, &PropertyValue::Real(1.0)).unwrap();
        assert_eq!(
            decode_context_wrapped_value(&buf[..n], 4),
            Err(BacnetError::InvalidTag)
        );
    }
}
