// crates/bacnet-rs/src/service/who_is_i_am.rs
//! Who-Is / I-Am device discovery (§4.5, Clause 16.9-16.10).
//!
//! Who-Is's device-instance range is either wholly absent or wholly present (the
//! standard does not allow supplying only one bound); I-Am's four parameters are all
//! mandatory and, unusually for a service with parameters, application-tagged rather
//! than context-tagged.

use super::codec::{decode_context_unsigned, encode_context_unsigned, peek_context_tag};
use crate::hal::BacnetError;
use crate::primitive::{
    decode_application_enumerated, decode_application_object_id, decode_application_unsigned,
    encode_application_enumerated, encode_application_object_id, encode_application_unsigned,
    ObjectIdentifier,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhoIsRequest {
    pub device_instance_range: Option<(u32, u32)>,
}

pub fn encode_who_is_request(buffer: &mut [u8], req: &WhoIsRequest) -> Result<usize, BacnetError> {
    match req.device_instance_range {
        None => Ok(0),
        Some((low, high)) => {
            let mut idx = encode_context_unsigned(buffer, 0, low as u64)?;
            idx += encode_context_unsigned(&mut buffer[idx..], 1, high as u64)?;
            Ok(idx)
        }
    }
}

pub fn decode_who_is_request(buffer: &[u8]) -> Result<WhoIsRequest, BacnetError> {
    if buffer.is_empty() {
        return Ok(WhoIsRequest {
            device_instance_range: None,
        });
    }
    if !peek_context_tag(buffer, 0) {
        return Err(BacnetError::InvalidTag);
    }
    let (low, idx) = decode_context_unsigned(buffer, 0)?;
    let (high, _) = decode_context_unsigned(&buffer[idx..], 1)?;
    Ok(WhoIsRequest {
        device_instance_range: Some((low as u32, high as u32)),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IAmRequest {
    pub device_identifier: ObjectIdentifier,
    pub max_apdu_length_accepted: u32,
    pub segmentation_supported: u32,
    pub vendor_identifier: u32,
}

pub fn encode_i_am_request(buffer: &mut [u8], req: &IAmRequest) -> Result<usize, BacnetError> {
    let mut idx = encode_application_object_id(buffer, req.device_identifier)?;
    idx += encode_application_unsigned(&mut buffer[idx..], req.max_apdu_length_accepted as u64)?;
    idx += encode_application_enumerated(&mut buffer[idx..], req.segmentation_supported)?;
    idx += encode_application_unsigned(&mut buffer[idx..], req.vendor_identifier as u64)?;
    Ok(idx)
}

pub fn decode_i_am_request(buffer: &[u8]) -> Result<IAmRequest, BacnetError> {
    let (device_identifier, mut idx) = decode_application_object_id(buffer)?;
    let (max_apdu_length_accepted, consumed) = decode_application_unsigned(&buffer[idx..])?;
    idx += consumed;
    let (segmentation_supported, consumed) = decode_application_enumerated(&buffer[idx..])?;
    idx += consumed;
    let (vendor_identifier, _) = decode_application_unsigned(&buffer[idx..])?;
    Ok(IAmRequest {
        device_identifier,
        max_apdu_length_accepted: max_apdu_length_accepted as u32,
        segmentation_supported,
        vendor_identifier: vendor_identifier as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_who_is_round_trip() {
        let buf = [0u8; 0];
        let req = decode_who_is_request(&buf).unwrap();
        assert_eq!(req.device_instance_range, None);
        let mut out = [0u8; 8];
        let n = encode_who_is_request(&mut out, &req).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn bounded_who_is_round_trip() {
        let mut buf = [0u8; 16];
        let req = WhoIsRequest {
            device_instance_range: Some((100, 200)),
        };
        let n = encode_who_is_request(&mut buf, &req).unwrap();
        assert_eq!(decode_who_is_request(&buf[..n]).unwrap(), req);
    }

    #[test]
    fn i_am_round_trip() {
        let mut buf = [0u8; 16];
        let req = IAmRequest {
            device_identifier: ObjectIdentifier::new(8, 1234),
            max_apdu_length_accepted: 1476,
            segmentation_supported: 3,
            vendor_identifier: 999,
        };
        let n = encode_i_am_request(&mut buf, &req).unwrap();
        assert_eq!(decode_i_am_request(&buf[..n]).unwrap(), req);
    }
}
