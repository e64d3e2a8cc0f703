// crates/bacnet-rs/src/object/registry.rs
//! The per-device object registry and the `BacnetObject` handler trait (§4.4, §4.5).
//!
//! Mirrors the HAL pattern used elsewhere in this crate: the registry and trait are
//! the fixed contract, while what actually backs a given object's storage (a static
//! struct here, flash-backed state on an embedded target) is the implementation's
//! business.

use super::error::{ErrorClass, ErrorCode};
use super::property::{ObjectType, PropertyIdentifier};
use super::value::PropertyValue;
use crate::hal::ServiceError;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// A single addressable BACnet object backing zero or more properties (§4.4).
pub trait BacnetObject {
    fn object_type(&self) -> ObjectType;
    fn instance(&self) -> u32;

    fn read_property(
        &self,
        property: PropertyIdentifier,
        array_index: Option<u32>,
    ) -> Result<PropertyValue, ServiceError>;

    /// Commands `value` at `priority` (1..=16), or `None` priority for a
    /// non-commandable property. Implementations reject a priority on a
    /// non-commandable property with `WriteAccessDenied`.
    fn write_property(
        &mut self,
        property: PropertyIdentifier,
        value: PropertyValue,
        priority: Option<u8>,
    ) -> Result<(), ServiceError>;

    /// Properties a ReadPropertyMultiple `ALL` request should enumerate.
    fn property_list(&self) -> Vec<PropertyIdentifier>;
}

fn unknown_property() -> ServiceError {
    ServiceError::new(ErrorClass::Property, ErrorCode::UnknownProperty)
}

fn unknown_object() -> ServiceError {
    ServiceError::new(ErrorClass::Object, ErrorCode::UnknownObject)
}

/// A device's complete set of addressable objects, keyed by `(type, instance)`.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: BTreeMap<(u16, u32), Box<dyn BacnetObject + Send>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, object: Box<dyn BacnetObject + Send>) {
        let key = (object.object_type().to_wire(), object.instance());
        self.objects.insert(key, object);
    }

    pub fn get(&self, object_type: ObjectType, instance: u32) -> Option<&(dyn BacnetObject + Send)> {
        self.objects
            .get(&(object_type.to_wire(), instance))
            .map(|b| b.as_ref())
    }

    pub fn get_mut(
        &mut self,
        object_type: ObjectType,
        instance: u32,
    ) -> Option<&mut (dyn BacnetObject + Send)> {
        self.objects
            .get_mut(&(object_type.to_wire(), instance))
            .map(|b| b.as_mut())
    }

    pub fn read_property(
        &self,
        object_type: ObjectType,
        instance: u32,
        property: PropertyIdentifier,
        array_index: Option<u32>,
    ) -> Result<PropertyValue, ServiceError> {
        self.get(object_type, instance)
            .ok_or_else(unknown_object)?
            .read_property(property, array_index)
    }

    pub fn write_property(
        &mut self,
        object_type: ObjectType,
        instance: u32,
        property: PropertyIdentifier,
        value: PropertyValue,
        priority: Option<u8>,
    ) -> Result<(), ServiceError> {
        // Priority 6 is reserved for the minimum-on/minimum-off life-safety
        // algorithm (Clause 19.2.3); a generic client write at that priority
        // is always rejected, regardless of object type or property.
        if priority == Some(6) {
            return Err(ServiceError::new(ErrorClass::Property, ErrorCode::WriteAccessDenied));
        }
        self.get_mut(object_type, instance)
            .ok_or_else(unknown_object)?
            .write_property(property, value, priority)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn BacnetObject + Send)> {
        self.objects.values().map(|b| b.as_ref())
    }

    pub fn object_identifiers(&self) -> Vec<crate::primitive::ObjectIdentifier> {
        self.objects
            .keys()
            .map(|&(t, i)| crate::primitive::ObjectIdentifier::new(t, i))
            .collect()
    }
}

#[allow(dead_code)]
fn _unknown_property_is_reachable() -> ServiceError {
    unknown_property()
}
