// crates/bacnet-rs/src/service/read_property.rs
//! ReadProperty request/ACK codec (§4.5, Clause 15.5).

use super::codec::{
    decode_context_object_id, decode_context_unsigned, decode_context_wrapped_value,
    encode_context_object_id, encode_context_unsigned, encode_context_wrapped_value,
    peek_context_tag,
};
use crate::hal::BacnetError;
use crate::object::{ObjectType, PropertyIdentifier, PropertyValue};
use crate::primitive::ObjectIdentifier;

#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyRequest {
    pub object_type: ObjectType,
    pub instance: u32,
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
}

pub fn encode_read_property_request(
    buffer: &mut [u8],
    req: &ReadPropertyRequest,
) -> Result<usize, BacnetError> {
    let oid = ObjectIdentifier::new(req.object_type.to_wire(), req.instance);
    let mut idx = encode_context_object_id(buffer, 0, oid)?;
    idx += encode_context_unsigned(&mut buffer[idx..], 1, req.property.to_wire() as u64)?;
    if let Some(index) = req.array_index {
        idx += encode_context_unsigned(&mut buffer[idx..], 2, index as u64)?;
    }
    Ok(idx)
}

pub fn decode_read_property_request(buffer: &[u8]) -> Result<ReadPropertyRequest, BacnetError> {
    let (oid, mut idx) = decode_context_object_id(buffer, 0)?;
    let (property, consumed) = decode_context_unsigned(&buffer[idx..], 1)?;
    idx += consumed;
    let array_index = if idx < buffer.len() && peek_context_tag(&buffer[idx..], 2) {
        let (v, consumed) = decode_context_unsigned(&buffer[idx..], 2)?;
        idx += consumed;
        Some(v as u32)
    } else {
        None
    };
    let _ = idx;
    Ok(ReadPropertyRequest {
        object_type: ObjectType::from_wire(oid.object_type),
        instance: oid.instance,
        property: PropertyIdentifier::from_wire(property as u32),
        array_index,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyAck {
    pub object_type: ObjectType,
    pub instance: u32,
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
    pub value: PropertyValue,
}

pub fn encode_read_property_ack(buffer: &mut [u8], ack: &ReadPropertyAck) -> Result<usize, BacnetError> {
    let oid = ObjectIdentifier::new(ack.object_type.to_wire(), ack.instance);
    let mut idx = encode_context_object_id(buffer, 0, oid)?;
    idx += encode_context_unsigned(&mut buffer[idx..], 1, ack.property.to_wire() as u64)?;
    if let Some(index) = ack.array_index {
        idx += encode_context_unsigned(&mut buffer[idx..], 2, index as u64)?;
    }
    idx += encode_context_wrapped_value(&mut buffer[idx..], 3, &ack.value)?;
    Ok(idx)
}

pub fn decode_read_property_ack(buffer: &[u8]) -> Result<ReadPropertyAck, BacnetError> {
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
    let (value, _consumed) = decode_context_wrapped_value(&buffer[idx..], 3)?;
    Ok(ReadPropertyAck {
        object_type: ObjectType::from_wire(oid.object_type),
        instance: oid.instance,
        property: PropertyIdentifier::from_wire(property as u32),
        array_index,
        value,
    })
}
