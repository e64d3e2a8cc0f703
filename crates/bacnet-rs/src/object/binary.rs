// crates/bacnet-rs/src/object/binary.rs
//! Binary_Input, Binary_Output and Binary_Value objects (§4.4, Clause 12.5-12.7).

use super::error::{ErrorClass, ErrorCode};
use super::priority_array::PriorityArray;
use super::property::{ObjectType, PropertyIdentifier};
use super::registry::BacnetObject;
use super::value::PropertyValue;
use crate::hal::ServiceError;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

fn write_access_denied() -> ServiceError {
    ServiceError::new(ErrorClass::Property, ErrorCode::WriteAccessDenied)
}

fn unknown_property() -> ServiceError {
    ServiceError::new(ErrorClass::Property, ErrorCode::UnknownProperty)
}

fn invalid_data_type() -> ServiceError {
    ServiceError::new(ErrorClass::Property, ErrorCode::InvalidDataType)
}

pub struct BinaryInputObject {
    pub instance: u32,
    pub object_name: String,
    pub present_value: bool,
    pub out_of_service: bool,
}

impl BinaryInputObject {
    pub fn new(instance: u32, object_name: &str) -> Self {
        Self {
            instance,
            object_name: object_name.to_string(),
            present_value: false,
            out_of_service: false,
        }
    }
}

impl BacnetObject for BinaryInputObject {
    fn object_type(&self) -> ObjectType {
        ObjectType::BinaryInput
    }

    fn instance(&self) -> u32 {
        self.instance
    }

    fn read_property(
        &self,
        property: PropertyIdentifier,
        _array_index: Option<u32>,
    ) -> Result<PropertyValue, ServiceError> {
        use PropertyIdentifier::*;
        Ok(match property {
            ObjectIdentifier => PropertyValue::ObjectIdentifier(
                crate::primitive::ObjectIdentifier::new(ObjectType::BinaryInput.to_wire(), self.instance),
            ),
            PropertyIdentifier::ObjectType => {
                PropertyValue::Enumerated(ObjectType::BinaryInput.to_wire() as u32)
            }
            ObjectName => PropertyValue::CharacterString(self.object_name.clone()),
            PresentValue => PropertyValue::Enumerated(self.present_value as u32),
            OutOfService => PropertyValue::Boolean(self.out_of_service),
            StatusFlags => PropertyValue::BitString(crate::primitive::BitString {
                bytes: vec![0],
                unused_bits: 4,
            }),
            _ => return Err(unknown_property()),
        })
    }

    fn write_property(
        &mut self,
        property: PropertyIdentifier,
        value: PropertyValue,
        priority: Option<u8>,
    ) -> Result<(), ServiceError> {
        if priority.is_some() {
            return Err(write_access_denied());
        }
        match property {
            PropertyIdentifier::PresentValue if self.out_of_service => {
                self.present_value = value.as_enumerated().ok_or_else(invalid_data_type)? != 0;
                Ok(())
            }
            PropertyIdentifier::PresentValue => Err(write_access_denied()),
            PropertyIdentifier::OutOfService => {
                self.out_of_service = value.as_boolean().ok_or_else(invalid_data_type)?;
                Ok(())
            }
            _ => Err(write_access_denied()),
        }
    }

    fn property_list(&self) -> Vec<PropertyIdentifier> {
        use PropertyIdentifier::*;
        vec![
            ObjectIdentifier,
            PropertyIdentifier::ObjectType,
            ObjectName,
            PresentValue,
            OutOfService,
            StatusFlags,
        ]
    }
}

pub struct BinaryCommandableObject {
    pub instance: u32,
    pub object_name: String,
    pub object_type: ObjectType,
    pub out_of_service: bool,
    pub priority_array: PriorityArray<bool>,
}

impl BinaryCommandableObject {
    pub fn new(object_type: ObjectType, instance: u32, object_name: &str, relinquish_default: bool) -> Self {
        Self {
            instance,
            object_name: object_name.to_string(),
            object_type,
            out_of_service: false,
            priority_array: PriorityArray::new(relinquish_default),
        }
    }
}

impl BacnetObject for BinaryCommandableObject {
    fn object_type(&self) -> ObjectType {
        self.object_type
    }

    fn instance(&self) -> u32 {
        self.instance
    }

    fn read_property(
        &self,
        property: PropertyIdentifier,
        array_index: Option<u32>,
    ) -> Result<PropertyValue, ServiceError> {
        use PropertyIdentifier::*;
        Ok(match property {
            ObjectIdentifier => PropertyValue::ObjectIdentifier(
                crate::primitive::ObjectIdentifier::new(self.object_type.to_wire(), self.instance),
            ),
            PropertyIdentifier::ObjectType => {
                PropertyValue::Enumerated(self.object_type.to_wire() as u32)
            }
            ObjectName => PropertyValue::CharacterString(self.object_name.clone()),
            PresentValue => {
                PropertyValue::Enumerated(self.priority_array.present_value() as u32)
            }
            RelinquishDefault => {
                PropertyValue::Enumerated(self.priority_array.relinquish_default() as u32)
            }
            OutOfService => PropertyValue::Boolean(self.out_of_service),
            PriorityArray => match array_index {
                Some(idx) if (1..=16).contains(&idx) => match self
                    .priority_array
                    .at(idx as u8)
                    .map_err(|_| invalid_data_type())?
                {
                    Some(v) => PropertyValue::Enumerated(v as u32),
                    None => PropertyValue::Null,
                },
                Some(_) => {
                    return Err(ServiceError::new(
                        ErrorClass::Property,
                        ErrorCode::InvalidArrayIndex,
                    ))
                }
                None => PropertyValue::Enumerated(self.priority_array.present_value() as u32),
            },
            StatusFlags => PropertyValue::BitString(crate::primitive::BitString {
                bytes: vec![0],
                unused_bits: 4,
            }),
            _ => return Err(unknown_property()),
        })
    }

    fn write_property(
        &mut self,
        property: PropertyIdentifier,
        value: PropertyValue,
        priority: Option<u8>,
    ) -> Result<(), ServiceError> {
        match property {
            PropertyIdentifier::PresentValue => {
                let priority = priority.unwrap_or(16);
                if value == PropertyValue::Null {
                    self.priority_array
                        .relinquish(priority)
                        .map_err(|_| ServiceError::new(ErrorClass::Property, ErrorCode::ValueOutOfRange))
                } else {
                    let v = value.as_enumerated().ok_or_else(invalid_data_type)? != 0;
                    self.priority_array
                        .write(priority, Some(v))
                        .map_err(|_| ServiceError::new(ErrorClass::Property, ErrorCode::ValueOutOfRange))
                }
            }
            PropertyIdentifier::RelinquishDefault if priority.is_none() => {
                self.priority_array
                    .set_relinquish_default(value.as_enumerated().ok_or_else(invalid_data_type)? != 0);
                Ok(())
            }
            PropertyIdentifier::OutOfService if priority.is_none() => {
                self.out_of_service = value.as_boolean().ok_or_else(invalid_data_type)?;
                Ok(())
            }
            _ => Err(write_access_denied()),
        }
    }

    fn property_list(&self) -> Vec<PropertyIdentifier> {
        use PropertyIdentifier::*;
        vec![
            ObjectIdentifier,
            PropertyIdentifier::ObjectType,
            ObjectName,
            PresentValue,
            OutOfService,
            PriorityArray,
            RelinquishDefault,
            StatusFlags,
        ]
    }
}
