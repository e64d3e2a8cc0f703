// crates/bacnet-rs/src/service/read_property_multiple.rs
//! ReadPropertyMultiple request/ACK codec (§4.5, Clause 15.7).

use super::codec::{
    decode_context_object_id, decode_context_unsigned, decode_context_wrapped_value,
    encode_context_object_id, encode_context_unsigned, encode_context_wrapped_value,
    peek_context_tag,
};
use crate::hal::{BacnetError, ServiceError};
use crate::object::{ObjectType, PropertyIdentifier, PropertyValue};
use crate::primitive::ObjectIdentifier;
use crate::tag::{decode_tag, encode_closing_tag, encode_opening_tag, TagClass};
use alloc::vec::Vec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReference {
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadAccessSpecification {
    pub object_type: ObjectType,
    pub instance: u32,
    pub properties: Vec<PropertyReference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPropertyMultipleRequest {
    pub specs: Vec<ReadAccessSpecification>,
}

pub fn encode_read_property_multiple_request(
    buffer: &mut [u8],
    req: &ReadPropertyMultipleRequest,
) -> Result<usize, BacnetError> {
    let mut idx = 0;
    for spec in &req.specs {
        let oid = ObjectIdentifier::new(spec.object_type.to_wire(), spec.instance);
        idx += encode_context_object_id(&mut buffer[idx..], 0, oid)?;
        idx += encode_opening_tag(&mut buffer[idx..], 1)?;
        for p in &spec.properties {
            idx += encode_context_unsigned(&mut buffer[idx..], 0, p.property.to_wire() as u64)?;
            if let Some(ai) = p.array_index {
                idx += encode_context_unsigned(&mut buffer[idx..], 1, ai as u64)?;
            }
        }
        idx += encode_closing_tag(&mut buffer[idx..], 1)?;
    }
    Ok(idx)
}

pub fn decode_read_property_multiple_request(
    buffer: &[u8],
) -> Result<ReadPropertyMultipleRequest, BacnetError> {
    let mut idx = 0;
    let mut specs = Vec::new();
    while idx < buffer.len() {
        let (oid, consumed) = decode_context_object_id(&buffer[idx..], 0)?;
        idx += consumed;
        let (open, consumed) = decode_tag(&buffer[idx..])?;
        if open.class != TagClass::Context || open.number != 1 || !open.is_opening() {
            return Err(BacnetError::InvalidTag);
        }
        idx += consumed;

        let mut properties = Vec::new();
        loop {
            let (hdr, _) = decode_tag(&buffer[idx..])?;
            if hdr.class == TagClass::Context && hdr.number == 1 && hdr.is_closing() {
                let (_, consumed) = decode_tag(&buffer[idx..])?;
                idx += consumed;
                break;
            }
            let (property, consumed) = decode_context_unsigned(&buffer[idx..], 0)?;
            idx += consumed;
            let array_index = if peek_context_tag(&buffer[idx..], 1) {
                let (v, consumed) = decode_context_unsigned(&buffer[idx..], 1)?;
                idx += consumed;
                Some(v as u32)
            } else {
                None
            };
            properties.push(PropertyReference {
                property: PropertyIdentifier::from_wire(property as u32),
                array_index,
            });
        }

        specs.push(ReadAccessSpecification {
            object_type: ObjectType::from_wire(oid.object_type),
            instance: oid.instance,
            properties,
        });
    }
    Ok(ReadPropertyMultipleRequest { specs })
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyReadResult {
    Value(PropertyValue),
    Error(ServiceError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyReadOutcome {
    pub property: PropertyIdentifier,
    pub array_index: Option<u32>,
    pub result: PropertyReadResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadAccessResult {
    pub object_type: ObjectType,
    pub instance: u32,
    pub outcomes: Vec<PropertyReadOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyMultipleAck {
    pub results: Vec<ReadAccessResult>,
}

pub fn encode_read_property_multiple_ack(
    buffer: &mut [u8],
    ack: &ReadPropertyMultipleAck,
) -> Result<usize, BacnetError> {
    let mut idx = 0;
    for result in &ack.results {
        let oid = ObjectIdentifier::new(result.object_type.to_wire(), result.instance);
        idx += encode_context_object_id(&mut buffer[idx..], 0, oid)?;
        idx += encode_opening_tag(&mut buffer[idx..], 1)?;
        for outcome in &result.outcomes {
            idx += encode_context_unsigned(&mut buffer[idx..], 2, outcome.property.to_wire() as u64)?;
            if let Some(ai) = outcome.array_index {
                idx += encode_context_unsigned(&mut buffer[idx..], 3, ai as u64)?;
            }
            match &outcome.result {
                PropertyReadResult::Value(v) => {
                    idx += encode_context_wrapped_value(&mut buffer[idx..], 4, v)?;
                }
                PropertyReadResult::Error(e) => {
                    idx += encode_opening_tag(&mut buffer[idx..], 5)?;
                    idx += crate::primitive::encode_application_enumerated(
                        &mut buffer[idx..],
                        e.class.to_wire(),
                    )?;
                    idx += crate::primitive::encode_application_enumerated(
                        &mut buffer[idx..],
                        e.code.to_wire(),
                    )?;
                    idx += encode_closing_tag(&mut buffer[idx..], 5)?;
                }
            }
        }
        idx += encode_closing_tag(&mut buffer[idx..], 1)?;
    }
    Ok(idx)
}

pub fn decode_read_property_multiple_ack(buffer: &[u8]) -> Result<ReadPropertyMultipleAck, BacnetError> {
    let mut idx = 0;
    let mut results = Vec::new();
    while idx < buffer.len() {
        let (oid, consumed) = decode_context_object_id(&buffer[idx..], 0)?;
        idx += consumed;
        let (open, consumed) = decode_tag(&buffer[idx..])?;
        if open.class != TagClass::Context || open.number != 1 || !open.is_opening() {
            return Err(BacnetError::InvalidTag);
        }
        idx += consumed;

        let mut outcomes = Vec::new();
        loop {
            let (hdr, _) = decode_tag(&buffer[idx..])?;
            if hdr.class == TagClass::Context && hdr.number == 1 && hdr.is_closing() {
                let (_, consumed) = decode_tag(&buffer[idx..])?;
                idx += consumed;
                break;
            }
            let (property, consumed) = decode_context_unsigned(&buffer[idx..], 2)?;
            idx += consumed;
            let array_index = if peek_context_tag(&buffer[idx..], 3) {
                let (v, consumed) = decode_context_unsigned(&buffer[idx..], 3)?;
                idx += consumed;
                Some(v as u32)
            } else {
                None
            };
            let (value_hdr, _) = decode_tag(&buffer[idx..])?;
            let result = if value_hdr.class == TagClass::Context && value_hdr.number == 5 {
                let (_, consumed) = decode_tag(&buffer[idx..])?;
                idx += consumed;
                let (class, consumed) =
                    crate::primitive::decode_application_enumerated(&buffer[idx..])?;
                idx += consumed;
                let (code, consumed) =
                    crate::primitive::decode_application_enumerated(&buffer[idx..])?;
                idx += consumed;
                let (_, consumed) = decode_tag(&buffer[idx..])?;
                idx += consumed;
                PropertyReadResult::Error(ServiceError::new(
                    crate::object::ErrorClass::from_wire(class),
                    crate::object::ErrorCode::from_wire(code),
                ))
            } else {
                let (v, consumed) = decode_context_wrapped_value(&buffer[idx..], 4)?;
                idx += consumed;
                PropertyReadResult::Value(v)
            };
            outcomes.push(PropertyReadOutcome {
                property: PropertyIdentifier::from_wire(property as u32),
                array_index,
                result,
            });
        }

        results.push(ReadAccessResult {
            object_type: ObjectType::from_wire(oid.object_type),
            instance: oid.instance,
            outcomes,
        });
    }
    Ok(ReadPropertyMultipleAck { results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn request_round_trip() {
        let mut buf = [0u8; 64];
        let req = ReadPropertyMultipleRequest {
            specs: vec![ReadAccessSpecification {
                object_type: ObjectType::AnalogInput,
                instance: 1,
                properties: vec![
                    PropertyReference {
                        property: PropertyIdentifier::PresentValue,
                        array_index: None,
                    },
                    PropertyReference {
                        property: PropertyIdentifier::Units,
                        array_index: None,
                    },
                ],
            }],
        };
        let n = encode_read_property_multiple_request(&mut buf, &req).unwrap();
        assert_eq!(decode_read_property_multiple_request(&buf[..n]).unwrap(), req);
    }

    #[test]
    fn ack_with_value_and_error_round_trip() {
        let mut buf = [0u8; 128];
        let ack = ReadPropertyMultipleAck {
            results: vec![ReadAccessResult {
                object_type: ObjectType::AnalogInput,
                instance: 1,
                outcomes: vec![
                    PropertyReadOutcome {
                        property: PropertyIdentifier::PresentValue,
                        array_index: None,
                        result: PropertyReadResult::Value(PropertyValue::Real(70.0)),
                    },
                    PropertyReadOutcome {
                        property: PropertyIdentifier::Other(9999),
                        array_index: None,
                        result: PropertyReadResult::Error(ServiceError::new(
                            crate::object::ErrorClass::Property,
                            crate::object::ErrorCode::UnknownProperty,
                        )),
                    },
                ],
            }],
        };
        let n = encode_read_property_multiple_ack(&mut buf, &ack).unwrap();
        assert_eq!(decode_read_property_multiple_ack(&buf[..n]).unwrap(), ack);
    }

    #[test]
    fn multiple_specs_concatenate() {
        let mut buf = [0u8; 128];
        let req = ReadPropertyMultipleRequest {
            specs: vec![
                ReadAccessSpecification {
                    object_type: ObjectType::AnalogInput,
                    instance: 1,
                    properties: vec![PropertyReference {
                        property: PropertyIdentifier::PresentValue,
                        array_index: None,
                    }],
                },
                ReadAccessSpecification {
                    object_type: ObjectType::AnalogOutput,
                    instance: 2,
                    properties: vec![PropertyReference {
                        property: PropertyIdentifier::PresentValue,
                        array_index: None,
                    }],
                },
            ],
        };
        let n = encode_read_property_multiple_request(&mut buf, &req).unwrap();
        let decoded = decode_read_property_multiple_request(&buf[..n]).unwrap();
        assert_eq!(decoded.specs.len(), 2);
        assert_eq!(decoded, req);
    }
}
