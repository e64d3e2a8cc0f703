// crates/bacnet-rs/src/service/subscribe_cov.rs
//! SubscribeCOV request codec (§4.5, Clause 13.14).

use super::codec::{decode_context_object_id, decode_context_unsigned, encode_context_object_id, encode_context_unsigned, peek_context_tag};
use crate::hal::BacnetError;
use crate::object::{ObjectType, PropertyValue};
use crate::primitive::ObjectIdentifier;
use crate::tag::{decode_tag, TagClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeCovRequest {
    pub subscriber_process_identifier: u32,
    pub object_type: ObjectType,
    pub instance: u32,
    /// Present only for a new subscription; absent means "cancel".
    pub issue_confirmed_notifications: Option<bool>,
    /// Present only for a new subscription; `None` means "subscribe indefinitely".
    pub lifetime_seconds: Option<u32>,
}

pub fn encode_subscribe_cov_request(
    buffer: &mut [u8],
    req: &SubscribeCovRequest,
) -> Result<usize, BacnetError> {
    let mut idx = encode_context_unsigned(buffer, 0, req.subscriber_process_identifier as u64)?;
    let oid = ObjectIdentifier::new(req.object_type.to_wire(), req.instance);
    idx += encode_context_object_id(&mut buffer[idx..], 1, oid)?;
    if let Some(confirmed) = req.issue_confirmed_notifications {
        idx += crate::tag::encode_tag(&mut buffer[idx..], 2, TagClass::Context, 1)?;
        buffer[idx] = confirmed as u8;
        idx += 1;
        if let Some(lifetime) = req.lifetime_seconds {
            idx += encode_context_unsigned(&mut buffer[idx..], 3, lifetime as u64)?;
        }
    }
    Ok(idx)
}

pub fn decode_subscribe_cov_request(buffer: &[u8]) -> Result<SubscribeCovRequest, BacnetError> {
    let (subscriber_process_identifier, mut idx) = decode_context_unsigned(buffer, 0)?;
    let (oid, consumed) = decode_context_object_id(&buffer[idx..], 1)?;
    idx += consumed;

    let (issue_confirmed_notifications, lifetime_seconds) = if idx < buffer.len() && peek_context_tag(&buffer[idx..], 2) {
        let (hdr, consumed) = decode_tag(&buffer[idx..])?;
        if buffer.len() < idx + consumed + hdr.length_value as usize {
            return Err(BacnetError::BufferTooShort);
        }
        let confirmed = buffer[idx + consumed] != 0;
        idx += consumed + hdr.length_value as usize;
        let lifetime = if idx < buffer.len() && peek_context_tag(&buffer[idx..], 3) {
            let (v, consumed) = decode_context_unsigned(&buffer[idx..], 3)?;
            idx += consumed;
            Some(v as u32)
        } else {
            None
        };
        (Some(confirmed), lifetime)
    } else {
        (None, None)
    };
    let _ = idx;

    Ok(SubscribeCovRequest {
        subscriber_process_identifier: subscriber_process_identifier as u32,
        object_type: ObjectType::from_wire(oid.object_type),
        instance: oid.instance,
        issue_confirmed_notifications,
        lifetime_seconds,
    })
}

/// A property/value pair as carried inside an UnconfirmedCOVNotification (§13.3).
#[derive(Debug, Clone, PartialEq)]
pub struct CovValue {
    pub property: crate::object::PropertyIdentifier,
    pub value: PropertyValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscription_round_trip() {
        let mut buf = [0u8; 32];
        let req = SubscribeCovRequest {
            subscriber_process_identifier: 1,
            object_type: ObjectType::AnalogInput,
            instance: 1,
            issue_confirmed_notifications: Some(true),
            lifetime_seconds: Some(300),
        };
        let n = encode_subscribe_cov_request(&mut buf, &req).unwrap();
        assert_eq!(decode_subscribe_cov_request(&buf[..n]).unwrap(), req);
    }

    #[test]
    fn indefinite_lifetime_round_trip() {
        let mut buf = [0u8; 32];
        let req = SubscribeCovRequest {
            subscriber_process_identifier: 1,
            object_type: ObjectType::AnalogInput,
            instance: 1,
            issue_confirmed_notifications: Some(false),
            lifetime_seconds: None,
        };
        let n = encode_subscribe_cov_request(&mut buf, &req).unwrap();
        assert_eq!(decode_subscribe_cov_request(&buf[..n]).unwrap(), req);
    }

    #[test]
    fn cancellation_round_trip() {
        let mut buf = [0u8; 16];
        let req = SubscribeCovRequest {
            subscriber_process_identifier: 1,
            object_type: ObjectType::AnalogInput,
            instance: 1,
            issue_confirmed_notifications: None,
            lifetime_seconds: None,
        };
        let n = encode_subscribe_cov_request(&mut buf, &req).unwrap();
        assert_eq!(decode_subscribe_cov_request(&buf[..n]).unwrap(), req);
    }
}
