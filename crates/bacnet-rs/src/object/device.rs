// crates/bacnet-rs/src/object/device.rs
//! The mandatory Device object (§4.4, Clause 12.11).

use super::error::{ErrorClass, ErrorCode};
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

pub struct DeviceObject {
    pub instance: u32,
    pub object_name: String,
    pub vendor_name: String,
    pub vendor_identifier: u32,
    pub model_name: String,
    pub firmware_revision: String,
    pub application_software_version: String,
    pub protocol_version: u32,
    pub protocol_revision: u32,
    pub max_apdu_length_accepted: u32,
    pub apdu_timeout_ms: u64,
    pub number_of_apdu_retries: u64,
    pub database_revision: u32,
    pub system_status: u32, // 0 = operational
}

impl DeviceObject {
    pub fn new(instance: u32, object_name: &str) -> Self {
        Self {
            instance,
            object_name: object_name.to_string(),
            vendor_name: String::new(),
            vendor_identifier: 0,
            model_name: String::new(),
            firmware_revision: String::new(),
            application_software_version: String::new(),
            protocol_version: 1,
            protocol_revision: 19,
            max_apdu_length_accepted: 1476,
            apdu_timeout_ms: 3000,
            number_of_apdu_retries: 3,
            database_revision: 0,
            system_status: 0,
        }
    }
}

impl BacnetObject for DeviceObject {
    fn object_type(&self) -> ObjectType {
        ObjectType::Device
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
                crate::primitive::ObjectIdentifier::new(ObjectType::Device.to_wire(), self.instance),
            ),
            PropertyIdentifier::ObjectType => {
                PropertyValue::Enumerated(ObjectType::Device.to_wire() as u32)
            }
            ObjectName => PropertyValue::CharacterString(self.object_name.clone()),
            VendorName => PropertyValue::CharacterString(self.vendor_name.clone()),
            VendorIdentifier => PropertyValue::Unsigned(self.vendor_identifier as u64),
            ModelName => PropertyValue::CharacterString(self.model_name.clone()),
            FirmwareRevision => PropertyValue::CharacterString(self.firmware_revision.clone()),
            ApplicationSoftwareVersion => {
                PropertyValue::CharacterString(self.application_software_version.clone())
            }
            ProtocolVersion => PropertyValue::Unsigned(self.protocol_version as u64),
            ProtocolRevision => PropertyValue::Unsigned(self.protocol_revision as u64),
            MaxApduLengthAccepted => PropertyValue::Unsigned(self.max_apdu_length_accepted as u64),
            SegmentationSupported => PropertyValue::Enumerated(3), // no-segmentation
            ApduTimeout => PropertyValue::Unsigned(self.apdu_timeout_ms),
            NumberOfApduRetries => PropertyValue::Unsigned(self.number_of_apdu_retries),
            DatabaseRevision => PropertyValue::Unsigned(self.database_revision as u64),
            SystemStatus => PropertyValue::Enumerated(self.system_status),
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
            PropertyIdentifier::ObjectName => {
                self.object_name = value
                    .as_ref_character_string()
                    .ok_or_else(write_access_denied)?
                    .to_string();
                Ok(())
            }
            PropertyIdentifier::ApduTimeout => {
                self.apdu_timeout_ms = value.as_unsigned().ok_or_else(write_access_denied)?;
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
            VendorName,
            VendorIdentifier,
            ModelName,
            FirmwareRevision,
            ApplicationSoftwareVersion,
            ProtocolVersion,
            ProtocolRevision,
            MaxApduLengthAccepted,
            SegmentationSupported,
            ApduTimeout,
            NumberOfApduRetries,
            DatabaseRevision,
            SystemStatus,
        ]
    }
}

trait AsCharacterString {
    fn as_ref_character_string(&self) -> Option<&str>;
}

impl AsCharacterString for PropertyValue {
    fn as_ref_character_string(&self) -> Option<&str> {
        match self {
            PropertyValue::CharacterString(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_identity_properties() {
        let dev = DeviceObject::new(4194302, "router-1");
        let id = dev
            .read_property(PropertyIdentifier::ObjectIdentifier, None)
            .unwrap();
        assert_eq!(
            id,
            PropertyValue::ObjectIdentifier(crate::primitive::ObjectIdentifier::new(8, 4194302))
        );
        let name = dev.read_property(PropertyIdentifier::ObjectName, None).unwrap();
        assert_eq!(name, PropertyValue::CharacterString("router-1".into()));
    }

    #[test]
    fn commandable_write_to_device_is_rejected() {
        let mut dev = DeviceObject::new(1, "d");
        let err = dev
            .write_property(
                PropertyIdentifier::ObjectName,
                PropertyValue::CharacterString("x".into()),
                Some(8),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WriteAccessDenied);
    }

    #[test]
    fn unknown_property_is_rejected() {
        let dev = DeviceObject::new(1, "d");
        let err = dev
            .read_property(PropertyIdentifier::PresentValue, None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownProperty);
    }
}
