// crates/bacnet-rs/src/service/dispatch.rs
//! Confirmed-service dispatch against an [`ObjectRegistry`] (§4.5).
//!
//! This is the seam a device application sits behind: given a decoded
//! `ConfirmedRequest`, look up the addressed object(s), perform the operation, and
//! produce the ACK or Error APDU to send back. Unconfirmed services (Who-Is/I-Am,
//! COV notifications) don't reply and are handled by the caller directly.

use super::read_property::{decode_read_property_request, encode_read_property_ack, ReadPropertyAck};
use super::read_property_multiple::{
    decode_read_property_multiple_request, encode_read_property_multiple_ack, PropertyReadOutcome,
    PropertyReadResult, ReadAccessResult, ReadPropertyMultipleAck,
};
use super::write_property::decode_write_property_request;
use crate::apdu::{Apdu, ConfirmedRequest, ConfirmedServiceChoice};
use crate::hal::{BacnetError, ServiceError};
use crate::object::{ErrorClass, ErrorCode, ObjectRegistry};
use alloc::vec::Vec;

fn service_error_apdu(invoke_id: u8, service: ConfirmedServiceChoice, error: ServiceError) -> Apdu {
    Apdu::Error {
        invoke_id,
        service,
        error,
    }
}

fn decode_error() -> ServiceError {
    ServiceError::new(ErrorClass::Property, ErrorCode::InvalidDataType)
}

/// Handles one confirmed request against `registry`, returning the APDU to send
/// back (a SimpleAck/ComplexAck on success, an Error/Reject/Abort on failure).
pub fn handle_confirmed_request(registry: &mut ObjectRegistry, req: &ConfirmedRequest) -> Apdu {
    if req.segmented {
        return Apdu::Abort {
            invoke_id: req.invoke_id,
            reason: crate::apdu::AbortReason::SegmentationNotSupported,
            sent_by_server: true,
        };
    }

    match req.service {
        ConfirmedServiceChoice::ReadProperty => {
            handle_read_property(registry, req.invoke_id, &req.service_data)
        }
        ConfirmedServiceChoice::WriteProperty => {
            handle_write_property(registry, req.invoke_id, &req.service_data)
        }
        ConfirmedServiceChoice::ReadPropertyMultiple => {
            handle_read_property_multiple(registry, req.invoke_id, &req.service_data)
        }
        ConfirmedServiceChoice::SubscribeCov => Apdu::SimpleAck {
            invoke_id: req.invoke_id,
            service: ConfirmedServiceChoice::SubscribeCov,
        },
        _ => Apdu::Reject {
            invoke_id: req.invoke_id,
            reason: crate::apdu::RejectReason::UnrecognizedService,
        },
    }
}

fn handle_read_property(registry: &mut ObjectRegistry, invoke_id: u8, data: &[u8]) -> Apdu {
    let req = match decode_read_property_request(data) {
        Ok(r) => r,
        Err(_) => {
            return service_error_apdu(invoke_id, ConfirmedServiceChoice::ReadProperty, decode_error())
        }
    };
    match registry.read_property(req.object_type, req.instance, req.property, req.array_index) {
        Ok(value) => {
            let ack = ReadPropertyAck {
                object_type: req.object_type,
                instance: req.instance,
                property: req.property,
                array_index: req.array_index,
                value,
            };
            let mut buf = [0u8; 256];
            match encode_read_property_ack(&mut buf, &ack) {
                Ok(n) => Apdu::ComplexAck {
                    invoke_id,
                    service: ConfirmedServiceChoice::ReadProperty,
                    service_data: buf[..n].to_vec(),
                },
                Err(_) => service_error_apdu(
                    invoke_id,
                    ConfirmedServiceChoice::ReadProperty,
                    ServiceError::new(ErrorClass::Resources, ErrorCode::Other(0)),
                ),
            }
        }
        Err(err) => service_error_apdu(invoke_id, ConfirmedServiceChoice::ReadProperty, err),
    }
}

fn handle_write_property(registry: &mut ObjectRegistry, invoke_id: u8, data: &[u8]) -> Apdu {
    let req = match decode_write_property_request(data) {
        Ok(r) => r,
        Err(_) => {
            return service_error_apdu(invoke_id, ConfirmedServiceChoice::WriteProperty, decode_error())
        }
    };
    match registry.write_property(
        req.object_type,
        req.instance,
        req.property,
        req.value,
        req.priority,
    ) {
        Ok(()) => Apdu::SimpleAck {
            invoke_id,
            service: ConfirmedServiceChoice::WriteProperty,
        },
        Err(err) => service_error_apdu(invoke_id, ConfirmedServiceChoice::WriteProperty, err),
    }
}

fn handle_read_property_multiple(registry: &mut ObjectRegistry, invoke_id: u8, data: &[u8]) -> Apdu {
    let req = match decode_read_property_multiple_request(data) {
        Ok(r) => r,
        Err(_) => {
            return service_error_apdu(
                invoke_id,
                ConfirmedServiceChoice::ReadPropertyMultiple,
                decode_error(),
            )
        }
    };

    let mut results = Vec::new();
    for spec in &req.specs {
        let mut outcomes = Vec::new();
        for p in &spec.properties {
            let result = match registry.read_property(
                spec.object_type,
                spec.instance,
                p.property,
                p.array_index,
            ) {
                Ok(v) => PropertyReadResult::Value(v),
                Err(e) => PropertyReadResult::Error(e),
            };
            outcomes.push(PropertyReadOutcome {
                property: p.property,
                array_index: p.array_index,
                result,
            });
        }
        results.push(ReadAccessResult {
            object_type: spec.object_type,
            instance: spec.instance,
            outcomes,
        });
    }

    let ack = ReadPropertyMultipleAck { results };
    let mut buf = [0u8; 1024];
    match encode_read_property_multiple_ack(&mut buf, &ack) {
        Ok(n) => Apdu::ComplexAck {
            invoke_id,
            service: ConfirmedServiceChoice::ReadPropertyMultiple,
            service_data: buf[..n].to_vec(),
        },
        Err(_) => service_error_apdu(
            invoke_id,
            ConfirmedServiceChoice::ReadPropertyMultiple,
            ServiceError::new(ErrorClass::Resources, ErrorCode::Other(0)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::device::DeviceObject;
    use crate::object::{ObjectType, PropertyIdentifier};
    use crate::service::read_property::{encode_read_property_request};
    use alloc::boxed::Box;

    fn registry_with_device() -> ObjectRegistry {
        let mut reg = ObjectRegistry::new();
        reg.insert(Box::new(DeviceObject::new(1, "test")));
        reg
    }

    #[test]
    fn read_property_produces_complex_ack() {
        let mut reg = registry_with_device();
        let mut buf = [0u8; 32];
        let n = encode_read_property_request(
            &mut buf,
            &crate::service::read_property::ReadPropertyRequest {
                object_type: ObjectType::Device,
                instance: 1,
                property: PropertyIdentifier::ObjectName,
                array_index: None,
            },
        )
        .unwrap();
        let req = ConfirmedRequest {
            invoke_id: 1,
            segmented: false,
            segmented_response_accepted: false,
            max_segments_accepted: 0,
            max_apdu_size: 1476,
            service: ConfirmedServiceChoice::ReadProperty,
            service_data: buf[..n].to_vec(),
        };
        let apdu = handle_confirmed_request(&mut reg, &req);
        assert!(matches!(apdu, Apdu::ComplexAck { .. }));
    }

    #[test]
    fn read_property_on_unknown_object_produces_error() {
        let mut reg = registry_with_device();
        let mut buf = [0u8; 32];
        let n = encode_read_property_request(
            &mut buf,
            &crate::service::read_property::ReadPropertyRequest {
                object_type: ObjectType::AnalogInput,
                instance: 99,
                property: PropertyIdentifier::PresentValue,
                array_index: None,
            },
        )
        .unwrap();
        let req = ConfirmedRequest {
            invoke_id: 1,
            segmented: false,
            segmented_response_accepted: false,
            max_segments_accepted: 0,
            max_apdu_size: 1476,
            service: ConfirmedServiceChoice::ReadProperty,
            service_data: buf[..n].to_vec(),
        };
        let apdu = handle_confirmed_request(&mut reg, &req);
        match apdu {
            Apdu::Error { error, .. } => assert_eq!(error.code, ErrorCode::UnknownObject),
            _ => panic!("expected Error APDU"),
        }
    }

    #[test]
    fn segmented_request_is_aborted() {
        let mut reg = registry_with_device();
        let req = ConfirmedRequest {
            invoke_id: 1,
            segmented: true,
            segmented_response_accepted: false,
            max_segments_accepted: 0,
            max_apdu_size: 1476,
            service: ConfirmedServiceChoice::ReadProperty,
            service_data: Vec::new(),
        };
        let apdu = handle_confirmed_request(&mut reg, &req);
        assert!(matches!(apdu, Apdu::Abort { .. }));
    }
}
