// crates/bacnet-rs/src/apdu/mod.rs
//! APDU framing (§3.3, §4.2, Clause 20.1).
//!
//! This stack does not support segmentation (§1 Out-of-scope): a Confirmed-Request
//! whose `segmented_message` flag is set is rejected by the caller with an Abort
//! (`SegmentationNotSupported`) before ever reaching [`decode_apdu`]'s caller logic
//! in the service layer. The service-specific parameter list inside a request or ACK
//! is left undecoded here as raw octets; `service` decodes it against the tag codec.

pub mod tsm;

use crate::hal::{BacnetError, ServiceError};
use alloc::vec::Vec;

const PDU_TYPE_CONFIRMED_REQUEST: u8 = 0x0;
const PDU_TYPE_UNCONFIRMED_REQUEST: u8 = 0x1;
const PDU_TYPE_SIMPLE_ACK: u8 = 0x2;
const PDU_TYPE_COMPLEX_ACK: u8 = 0x3;
const PDU_TYPE_SEGMENT_ACK: u8 = 0x4;
const PDU_TYPE_ERROR: u8 = 0x5;
const PDU_TYPE_REJECT: u8 = 0x6;
const PDU_TYPE_ABORT: u8 = 0x7;

const FLAG_SEGMENTED: u8 = 0x08;
const FLAG_MORE_FOLLOWS: u8 = 0x04;
const FLAG_SEGMENTED_RESPONSE_ACCEPTED: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmedServiceChoice {
    SubscribeCov,
    ReadProperty,
    ReadPropertyMultiple,
    WriteProperty,
    WritePropertyMultiple,
    Other(u8),
}

impl ConfirmedServiceChoice {
    pub fn to_wire(self) -> u8 {
        match self {
            ConfirmedServiceChoice::SubscribeCov => 5,
            ConfirmedServiceChoice::ReadProperty => 12,
            ConfirmedServiceChoice::ReadPropertyMultiple => 14,
            ConfirmedServiceChoice::WriteProperty => 15,
            ConfirmedServiceChoice::WritePropertyMultiple => 16,
            ConfirmedServiceChoice::Other(v) => v,
        }
    }

    pub fn from_wire(v: u8) -> Self {
        match v {
            5 => ConfirmedServiceChoice::SubscribeCov,
            12 => ConfirmedServiceChoice::ReadProperty,
            14 => ConfirmedServiceChoice::ReadPropertyMultiple,
            15 => ConfirmedServiceChoice::WriteProperty,
            16 => ConfirmedServiceChoice::WritePropertyMultiple,
            other => ConfirmedServiceChoice::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnconfirmedServiceChoice {
    IAm,
    WhoIs,
    UnconfirmedCovNotification,
    Other(u8),
}

impl UnconfirmedServiceChoice {
    pub fn to_wire(self) -> u8 {
        match self {
            UnconfirmedServiceChoice::IAm => 0,
            UnconfirmedServiceChoice::UnconfirmedCovNotification => 2,
            UnconfirmedServiceChoice::WhoIs => 8,
            UnconfirmedServiceChoice::Other(v) => v,
        }
    }

    pub fn from_wire(v: u8) -> Self {
        match v {
            0 => UnconfirmedServiceChoice::IAm,
            2 => UnconfirmedServiceChoice::UnconfirmedCovNotification,
            8 => UnconfirmedServiceChoice::WhoIs,
            other => UnconfirmedServiceChoice::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Other,
    BufferOverflow,
    InconsistentParameters,
    InvalidDataType,
    InvalidTag,
    MissingRequiredParameter,
    ParameterOutOfRange,
    TooManyArguments,
    UndefinedEnumeration,
    UnrecognizedService,
}

impl RejectReason {
    fn to_wire(self) -> u8 {
        match self {
            RejectReason::Other => 0,
            RejectReason::BufferOverflow => 1,
            RejectReason::InconsistentParameters => 2,
            RejectReason::InvalidDataType => 3,
            RejectReason::InvalidTag => 4,
            RejectReason::MissingRequiredParameter => 5,
            RejectReason::ParameterOutOfRange => 6,
            RejectReason::TooManyArguments => 7,
            RejectReason::UndefinedEnumeration => 8,
            RejectReason::UnrecognizedService => 9,
        }
    }

    fn from_wire(v: u8) -> Self {
        match v {
            1 => RejectReason::BufferOverflow,
            2 => RejectReason::InconsistentParameters,
            3 => RejectReason::InvalidDataType,
            4 => RejectReason::InvalidTag,
            5 => RejectReason::MissingRequiredParameter,
            6 => RejectReason::ParameterOutOfRange,
            7 => RejectReason::TooManyArguments,
            8 => RejectReason::UndefinedEnumeration,
            9 => RejectReason::UnrecognizedService,
            _ => RejectReason::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Other,
    BufferOverflow,
    InvalidApduInThisState,
    PreemptedByHigherPriorityTask,
    SegmentationNotSupported,
}

impl AbortReason {
    fn to_wire(self) -> u8 {
        match self {
            AbortReason::Other => 0,
            AbortReason::BufferOverflow => 1,
            AbortReason::InvalidApduInThisState => 2,
            AbortReason::PreemptedByHigherPriorityTask => 3,
            AbortReason::SegmentationNotSupported => 4,
        }
    }

    fn from_wire(v: u8) -> Self {
        match v {
            1 => AbortReason::BufferOverflow,
            2 => AbortReason::InvalidApduInThisState,
            3 => AbortReason::PreemptedByHigherPriorityTask,
            4 => AbortReason::SegmentationNotSupported,
            _ => AbortReason::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedRequest {
    pub invoke_id: u8,
    pub segmented: bool,
    pub segmented_response_accepted: bool,
    pub max_segments_accepted: u8,
    pub max_apdu_size: u32,
    pub service: ConfirmedServiceChoice,
    pub service_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Apdu {
    ConfirmedRequest(ConfirmedRequest),
    UnconfirmedRequest {
        service: UnconfirmedServiceChoice,
        service_data: Vec<u8>,
    },
    SimpleAck {
        invoke_id: u8,
        service: ConfirmedServiceChoice,
    },
    ComplexAck {
        invoke_id: u8,
        service: ConfirmedServiceChoice,
        service_data: Vec<u8>,
    },
    SegmentAck {
        invoke_id: u8,
        negative: bool,
        sent_by_server: bool,
        sequence_number: u8,
        actual_window_size: u8,
    },
    Error {
        invoke_id: u8,
        service: ConfirmedServiceChoice,
        error: ServiceError,
    },
    Reject {
        invoke_id: u8,
        reason: RejectReason,
    },
    Abort {
        invoke_id: u8,
        reason: AbortReason,
        sent_by_server: bool,
    },
}

impl Apdu {
    pub fn invoke_id(&self) -> Option<u8> {
        match self {
            Apdu::ConfirmedRequest(r) => Some(r.invoke_id),
            Apdu::UnconfirmedRequest { .. } => None,
            Apdu::SimpleAck { invoke_id, .. }
            | Apdu::ComplexAck { invoke_id, .. }
            | Apdu::SegmentAck { invoke_id, .. }
            | Apdu::Error { invoke_id, .. }
            | Apdu::Reject { invoke_id, .. }
            | Apdu::Abort { invoke_id, .. } => Some(*invoke_id),
        }
    }
}

/// §8 property: max APDU size code -> octets, the encoded values from Table 20-6.
fn max_apdu_size_from_code(code: u8) -> u32 {
    match code {
        0 => 50,
        1 => 128,
        2 => 206,
        3 => 480,
        4 => 1024,
        _ => 1476,
    }
}

fn max_apdu_size_to_code(size: u32) -> u8 {
    match size {
        0..=50 => 0,
        51..=128 => 1,
        129..=206 => 2,
        207..=480 => 3,
        481..=1024 => 4,
        _ => 5,
    }
}

pub fn encode_apdu(buffer: &mut [u8], apdu: &Apdu) -> Result<usize, BacnetError> {
    match apdu {
        Apdu::ConfirmedRequest(req) => {
            require(buffer, 4 + req.service_data.len())?;
            let mut flags = 0u8;
            if req.segmented {
                flags |= FLAG_SEGMENTED;
            }
            if req.segmented_response_accepted {
                flags |= FLAG_SEGMENTED_RESPONSE_ACCEPTED;
            }
            buffer[0] = (PDU_TYPE_CONFIRMED_REQUEST << 4) | flags;
            buffer[1] = (req.max_segments_accepted << 4) | max_apdu_size_to_code(req.max_apdu_size);
            buffer[2] = req.invoke_id;
            buffer[3] = req.service.to_wire();
            buffer[4..4 + req.service_data.len()].copy_from_slice(&req.service_data);
            Ok(4 + req.service_data.len())
        }
        Apdu::UnconfirmedRequest {
            service,
            service_data,
        } => {
            require(buffer, 2 + service_data.len())?;
            buffer[0] = PDU_TYPE_UNCONFIRMED_REQUEST << 4;
            buffer[1] = service.to_wire();
            buffer[2..2 + service_data.len()].copy_from_slice(service_data);
            Ok(2 + service_data.len())
        }
        Apdu::SimpleAck { invoke_id, service } => {
            require(buffer, 3)?;
            buffer[0] = PDU_TYPE_SIMPLE_ACK << 4;
            buffer[1] = *invoke_id;
            buffer[2] = service.to_wire();
            Ok(3)
        }
        Apdu::ComplexAck {
            invoke_id,
            service,
            service_data,
        } => {
            require(buffer, 3 + service_data.len())?;
            buffer[0] = PDU_TYPE_COMPLEX_ACK << 4;
            buffer[1] = *invoke_id;
            buffer[2] = service.to_wire();
            buffer[3..3 + service_data.len()].copy_from_slice(service_data);
            Ok(3 + service_data.len())
        }
        Apdu::SegmentAck {
            invoke_id,
            negative,
            sent_by_server,
            sequence_number,
            actual_window_size,
        } => {
            require(buffer, 4)?;
            let mut flags = 0u8;
            if *negative {
                flags |= 0x02;
            }
            if *sent_by_server {
                flags |= 0x01;
            }
            buffer[0] = (PDU_TYPE_SEGMENT_ACK << 4) | flags;
            buffer[1] = *invoke_id;
            buffer[2] = *sequence_number;
            buffer[3] = *actual_window_size;
            Ok(4)
        }
        Apdu::Error {
            invoke_id,
            service,
            error,
        } => {
            let mut scratch = [0u8; 16];
            let class_len = crate::primitive::encode_application_enumerated(
                &mut scratch,
                error.class.to_wire(),
            )?;
            require(buffer, 3 + class_len)?;
            buffer[0] = PDU_TYPE_ERROR << 4;
            buffer[1] = *invoke_id;
            buffer[2] = service.to_wire();
            buffer[3..3 + class_len].copy_from_slice(&scratch[..class_len]);
            let mut idx = 3 + class_len;
            let code_len = crate::primitive::encode_application_enumerated(
                &mut scratch,
                error.code.to_wire(),
            )?;
            require(buffer, idx + code_len)?;
            buffer[idx..idx + code_len].copy_from_slice(&scratch[..code_len]);
            idx += code_len;
            Ok(idx)
        }
        Apdu::Reject { invoke_id, reason } => {
            require(buffer, 3)?;
            buffer[0] = PDU_TYPE_REJECT << 4;
            buffer[1] = *invoke_id;
            buffer[2] = reason.to_wire();
            Ok(3)
        }
        Apdu::Abort {
            invoke_id,
            reason,
            sent_by_server,
        } => {
            require(buffer, 3)?;
            buffer[0] = (PDU_TYPE_ABORT << 4) | (*sent_by_server as u8);
            buffer[1] = *invoke_id;
            buffer[2] = reason.to_wire();
            Ok(3)
        }
    }
}

fn require(buffer: &[u8], len: usize) -> Result<(), BacnetError> {
    if buffer.len() < len {
        Err(BacnetError::BufferTooShort)
    } else {
        Ok(())
    }
}

pub fn decode_apdu(buffer: &[u8]) -> Result<Apdu, BacnetError> {
    if buffer.is_empty() {
        return Err(BacnetError::BufferTooShort);
    }
    let pdu_type = buffer[0] >> 4;
    match pdu_type {
        PDU_TYPE_CONFIRMED_REQUEST => {
            require(buffer, 4)?;
            let flags = buffer[0] & 0x0F;
            Ok(Apdu::ConfirmedRequest(ConfirmedRequest {
                invoke_id: buffer[2],
                segmented: flags & FLAG_SEGMENTED != 0,
                segmented_response_accepted: flags & FLAG_SEGMENTED_RESPONSE_ACCEPTED != 0,
                max_segments_accepted: buffer[1] >> 4,
                max_apdu_size: max_apdu_size_from_code(buffer[1] & 0x0F),
                service: ConfirmedServiceChoice::from_wire(buffer[3]),
                service_data: buffer[4..].to_vec(),
            }))
        }
        PDU_TYPE_UNCONFIRMED_REQUEST => {
            require(buffer, 2)?;
            Ok(Apdu::UnconfirmedRequest {
                service: UnconfirmedServiceChoice::from_wire(buffer[1]),
                service_data: buffer[2..].to_vec(),
            })
        }
        PDU_TYPE_SIMPLE_ACK => {
            require(buffer, 3)?;
            Ok(Apdu::SimpleAck {
                invoke_id: buffer[1],
                service: ConfirmedServiceChoice::from_wire(buffer[2]),
            })
        }
        PDU_TYPE_COMPLEX_ACK => {
            require(buffer, 3)?;
            Ok(Apdu::ComplexAck {
                invoke_id: buffer[1],
                service: ConfirmedServiceChoice::from_wire(buffer[2]),
                service_data: buffer[3..].to_vec(),
            })
        }
        PDU_TYPE_SEGMENT_ACK => {
            require(buffer, 4)?;
            let flags = buffer[0] & 0x0F;
            Ok(Apdu::SegmentAck {
                invoke_id: buffer[1],
                negative: flags & 0x02 != 0,
                sent_by_server: flags & 0x01 != 0,
                sequence_number: buffer[2],
                actual_window_size: buffer[3],
            })
        }
        PDU_TYPE_ERROR => {
            require(buffer, 3)?;
            let service = ConfirmedServiceChoice::from_wire(buffer[2]);
            let (class, consumed) = crate::primitive::decode_application_enumerated(&buffer[3..])?;
            let (code, _) =
                crate::primitive::decode_application_enumerated(&buffer[3 + consumed..])?;
            Ok(Apdu::Error {
                invoke_id: buffer[1],
                service,
                error: ServiceError::new(
                    crate::object::ErrorClass::from_wire(class),
                    crate::object::ErrorCode::from_wire(code),
                ),
            })
        }
        PDU_TYPE_REJECT => {
            require(buffer, 3)?;
            Ok(Apdu::Reject {
                invoke_id: buffer[1],
                reason: RejectReason::from_wire(buffer[2]),
            })
        }
        PDU_TYPE_ABORT => {
            require(buffer, 3)?;
            Ok(Apdu::Abort {
                invoke_id: buffer[1],
                reason: AbortReason::from_wire(buffer[2]),
                sent_by_server: buffer[0] & 0x01 != 0,
            })
        }
        _ => Err(BacnetError::InvalidFrame),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn confirmed_request_round_trip() {
        let mut buf = [0u8; 32];
        let req = Apdu::ConfirmedRequest(ConfirmedRequest {
            invoke_id: 5,
            segmented: false,
            segmented_response_accepted: true,
            max_segments_accepted: 4,
            max_apdu_size: 1476,
            service: ConfirmedServiceChoice::ReadProperty,
            service_data: vec![1, 2, 3],
        });
        let n = encode_apdu(&mut buf, &req).unwrap();
        let decoded = decode_apdu(&buf[..n]).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn unconfirmed_who_is_round_trip() {
        let mut buf = [0u8; 8];
        let req = Apdu::UnconfirmedRequest {
            service: UnconfirmedServiceChoice::WhoIs,
            service_data: vec![],
        };
        let n = encode_apdu(&mut buf, &req).unwrap();
        assert_eq!(decode_apdu(&buf[..n]).unwrap(), req);
    }

    #[test]
    fn simple_ack_round_trip() {
        let mut buf = [0u8; 8];
        let ack = Apdu::SimpleAck {
            invoke_id: 9,
            service: ConfirmedServiceChoice::WriteProperty,
        };
        let n = encode_apdu(&mut buf, &ack).unwrap();
        assert_eq!(decode_apdu(&buf[..n]).unwrap(), ack);
    }

    #[test]
    fn error_pdu_round_trip() {
        let mut buf = [0u8; 16];
        let err = Apdu::Error {
            invoke_id: 2,
            service: ConfirmedServiceChoice::ReadProperty,
            error: ServiceError::new(
                crate::object::ErrorClass::Property,
                crate::object::ErrorCode::UnknownProperty,
            ),
        };
        let n = encode_apdu(&mut buf, &err).unwrap();
        assert_eq!(decode_apdu(&buf[..n]).unwrap(), err);
    }

    #[test]
    fn abort_and_reject_round_trip() {
        let mut buf = [0u8; 8];
        let abort = Apdu::Abort {
            invoke_id: 1,
            reason: AbortReason::SegmentationNotSupported,
            sent_by_server: true,
        };
        let n = encode_apdu(&mut buf, &abort).unwrap();
        assert_eq!(decode_apdu(&buf[..n]).unwrap(), abort);

        let reject = Apdu::Reject {
            invoke_id: 1,
            reason: RejectReason::UnrecognizedService,
        };
        let n = encode_apdu(&mut buf, &reject).unwrap();
        assert_eq!(decode_apdu(&buf[..n]).unwrap(), reject);
    }

    #[test]
    fn max_apdu_size_code_round_trips_through_known_buckets() {
        for size in [50u32, 128, 206, 480, 1024, 1476] {
            let code = max_apdu_size_to_code(size);
            assert_eq!(max_apdu_size_from_code(code), size);
        }
    }

    #[test]
    fn truncated_confirmed_request_header_is_rejected() {
        let buf = [0x00u8, 0x05, 0x01];
        assert_eq!(decode_apdu(&buf), Err(BacnetError::BufferTooShort));
    }
}
