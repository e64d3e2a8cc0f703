// crates/bacnet-rs/src/service/write_property.rs
//! WriteProperty request codec (§4.4, §4.5, Clause 15.9).
//!
//! A `value` of `PropertyValue::Null` at a commandable property relinquishes that
//! priority slot rather than writing a value, per the Priority_Array algorithm.

use super::codec::{
    decode_context_object_id, decode_context_unsigned, decode_context_wrapped_value,
    encode_context_object_id, encode_context_unsigned, encode_context_wrapped_value,
    peek_context_tag,
};
use crate::hal::BacnetError;
use crate::object::{ObjectType, PropertyIdentifier, PropertyValue};
use crate::primitive::ObjectIdentifier;

#[derive(Debug, Clone, PartialEq)]
pub struct WritePropertyRequest {
    pub object_type: ObjectType,
    pub instance: u32,
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
    pub value: PropertyValue,
    pub priority: Option<u8>,
}

pub fn encode_write_property_request(
    buffer: &mut [u8],
    req: &WritePropertyRequest,
) -> Result<usize, BacnetError> {
    let oid = ObjectIdentifier::new(req.object_type.to_wire(), req.instance);
    let mut idx = encode_context_object_id(buffer, 0, oid)?;
    idx += encode_context_unsigned(&mut buffer[idx..], 1, req.property.to_wire() as u64)?;
    if let Some(index) = req.array_index {
        idx += encode_context_unsigned(&mut buffer[idx..], 2, index as u64)?;
    }
    idx += encode_context_wrapped_value(&mut buffer[idx..], 3, &req.value)?;
    if let Some(priority) = req.priority {
        idx += encode_context_unsigned(&mut buffer[idx..], 4, priority as u64)?;
    }
    Ok(idx)
}

pub fn decode_write_property_request(buffer: &[u8]) -> Result<WritePropertyRequest, BacnetError> {
    let (oid, mut idx) = decode_context_object_id(buffer, 0)?;
    let (property, consumed) = decode_context_unsigned(&buffer[idx..], 1)?;
    idx += consumed;
    let array_index = if peek_context_tag(&buffer[idx..], 2) {
        let (v, consumed) = decode_context_unsigned(&buffer[idx..], 2)?;
        idx += consumed;
        Some(v as u32)
    } else {
        None
    };
    let (value, consumed) = decode_context_wrapped_value(&buffer[idx..], 3)?;
    idx += consumed;
    let priority = if idx < buffer.len() && peek_context_tag(&buffer[idx..], 4) {
        let (v, consumed) = decode_context_unsigned(&buffer[idx..], 4)?;
        idx += consumed;
        Some(v as u8)
    } else {
        None
    };
    let _ = idx;
    Ok(WritePropertyRequest {
        object_type: ObjectType::from_wire(oid.object_type),
        instance: oid.instance,
        property: PropertyIdentifier::from_wire(property as u32),
        array_index,
        value,
        priority,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_with_priority_round_trip() {
        let mut buf = [0u8; 32];
        let req = WritePropertyRequest {
            object_type: ObjectType::AnalogOutput,
            instance: 2,
            property: PropertyIdentifier::PresentValue,
            array_index: None,
            value: PropertyValue::Real(55.0),
            priority: Some(8),
        };
        let n = encode_write_property_request(&mut buf, &req).unwrap();
        assert_eq!(decode_write_property_request(&buf[..n]).unwrap(), req);
    }

    #[test]
    fn relinquish_write_round_trip() {
        let mut buf = [0u8; 32];
        let req = WritePropertyRequest {
            object_type: ObjectType::AnalogOutput,
            instance: 2,
            property: PropertyIdentifier::PresentValue,
            array_index: None,
            value: PropertyValue::Null,
            priority: Some(8),
        };
        let n = encode_write_property_request(&mut buf, &req).unwrap();
        assert_eq!(decode_write_property_request(&buf[..n]).unwrap(), req);
    }

    #[test]
    fn write_without_priority_round_trip() {
        let mut buf = [0u8; 32];
        let req = WritePropertyRequest {
            object_type: ObjectType::Device,
            instance: 1,
            property: PropertyIdentifier::ObjectName,
            array_index: None,
            value: PropertyValue::CharacterString("new-name".into()),
            priority: None,
        };
        let n = encode_write_property_request(&mut buf, &req).unwrap();
        assert_eq!(decode_write_property_request(&buf[..n]).unwrap(), req);
    }
}
