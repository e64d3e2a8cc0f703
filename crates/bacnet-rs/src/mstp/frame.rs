// crates/bacnet-rs/src/mstp/frame.rs
//! MS/TP frame format and type codes (Clause 9).

use super::crc::{data_crc, header_crc};
use crate::hal::BacnetError;
use alloc::vec::Vec;

pub const PREAMBLE: [u8; 2] = [0x55, 0xFF];
/// Broadcast destination/source address (Clause 9.2).
pub const BROADCAST_ADDRESS: u8 = 0xFF;
/// Maximum data octets a single MS/TP frame may carry (Clause 9.3).
pub const MAX_FRAME_DATA_LEN: usize = 501;

/// MS/TP frame type codes (Table 9-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Token,
    PollForMaster,
    ReplyToPollForMaster,
    TestRequest,
    TestResponse,
    BacnetDataExpectingReply,
    BacnetDataNotExpectingReply,
    ReplyPostponed,
    Other(u8),
}

impl FrameType {
    pub fn to_wire(self) -> u8 {
        match self {
            FrameType::Token => 0,
            FrameType::PollForMaster => 1,
            FrameType::ReplyToPollForMaster => 2,
            FrameType::TestRequest => 3,
            FrameType::TestResponse => 4,
            FrameType::BacnetDataExpectingReply => 5,
            FrameType::BacnetDataNotExpectingReply => 6,
            FrameType::ReplyPostponed => 7,
            FrameType::Other(v) => v,
        }
    }

    pub fn from_wire(v: u8) -> FrameType {
        match v {
            0 => FrameType::Token,
            1 => FrameType::PollForMaster,
            2 => FrameType::ReplyToPollForMaster,
            3 => FrameType::TestRequest,
            4 => FrameType::TestResponse,
            5 => FrameType::BacnetDataExpectingReply,
            6 => FrameType::BacnetDataNotExpectingReply,
            7 => FrameType::ReplyPostponed,
            other => FrameType::Other(other),
        }
    }

    /// Whether a frame of this type is accompanied by data octets and a data CRC,
    /// as opposed to being a bare 8-byte header frame (Clause 9.3).
    pub fn carries_data(self) -> bool {
        matches!(
            self,
            FrameType::TestRequest
                | FrameType::TestResponse
                | FrameType::BacnetDataExpectingReply
                | FrameType::BacnetDataNotExpectingReply
                | FrameType::Other(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MstpFrame {
    pub frame_type: FrameType,
    pub destination: u8,
    pub source: u8,
    pub data: Vec<u8>,
}

/// Encodes a complete on-wire frame: preamble, header, header CRC, and (if
/// present) data octets plus data CRC.
pub fn encode_frame(buffer: &mut [u8], frame: &MstpFrame) -> Result<usize, BacnetError> {
    if frame.data.len() > MAX_FRAME_DATA_LEN {
        return Err(BacnetError::FrameTooLarge);
    }
    let data_len = frame.data.len();
    let total = 2 + 5 + 1 + if data_len > 0 { data_len + 2 } else { 0 };
    if buffer.len() < total {
        return Err(BacnetError::BufferTooShort);
    }

    buffer[0] = PREAMBLE[0];
    buffer[1] = PREAMBLE[1];
    let header = [
        frame.frame_type.to_wire(),
        frame.destination,
        frame.source,
        (data_len >> 8) as u8,
        (data_len & 0xFF) as u8,
    ];
    buffer[2..7].copy_from_slice(&header);
    buffer[7] = header_crc(&header);

    if data_len > 0 {
        buffer[8..8 + data_len].copy_from_slice(&frame.data);
        let crc = data_crc(&frame.data);
        buffer[8 + data_len] = (crc & 0xFF) as u8;
        buffer[8 + data_len + 1] = (crc >> 8) as u8;
    }

    Ok(total)
}

/// Decodes one complete frame from `buffer`, which must begin with the preamble
/// and contain the full frame (header, header CRC, and any data plus data CRC).
/// Returns the frame and the number of bytes consumed.
pub fn decode_frame(buffer: &[u8]) -> Result<(MstpFrame, usize), BacnetError> {
    if buffer.len() < 8 {
        return Err(BacnetError::BufferTooShort);
    }
    if buffer[0] != PREAMBLE[0] || buffer[1] != PREAMBLE[1] {
        return Err(BacnetError::InvalidFrame);
    }
    let header = &buffer[2..7];
    if header_crc(header) != buffer[7] {
        return Err(BacnetError::InvalidFrame);
    }
    let frame_type = FrameType::from_wire(header[0]);
    let destination = header[1];
    let source = header[2];
    let data_len = ((header[3] as usize) << 8) | header[4] as usize;
    if data_len > MAX_FRAME_DATA_LEN {
        return Err(BacnetError::FrameTooLarge);
    }

    if data_len == 0 {
        return Ok((
            MstpFrame {
                frame_type,
                destination,
                source,
                data: Vec::new(),
            },
            8,
        ));
    }

    let total = 8 + data_len + 2;
    if buffer.len() < total {
        return Err(BacnetError::BufferTooShort);
    }
    let data = &buffer[8..8 + data_len];
    let expected_crc = data_crc(data);
    let actual_crc = (buffer[8 + data_len] as u16) | ((buffer[8 + data_len + 1] as u16) << 8);
    if expected_crc != actual_crc {
        return Err(BacnetError::InvalidFrame);
    }

    Ok((
        MstpFrame {
            frame_type,
            destination,
            source,
            data: data.to_vec(),
        },
        total,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn token_frame_round_trip() {
        let mut buf = [0u8; 16];
        let frame = MstpFrame {
            frame_type: FrameType::Token,
            destination: 5,
            source: 1,
            data: Vec::new(),
        };
        let n = encode_frame(&mut buf, &frame).unwrap();
        assert_eq!(n, 8);
        let (decoded, consumed) = decode_frame(&buf[..n]).unwrap();
        assert_eq!(consumed, n);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn data_frame_round_trip() {
        let mut buf = [0u8; 64];
        let frame = MstpFrame {
            frame_type: FrameType::BacnetDataNotExpectingReply,
            destination: 0xFF,
            source: 3,
            data: vec![1, 2, 3, 4, 5],
        };
        let n = encode_frame(&mut buf, &frame).unwrap();
        let (decoded, consumed) = decode_frame(&buf[..n]).unwrap();
        assert_eq!(consumed, n);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn bad_preamble_is_rejected() {
        let mut buf = [0u8; 16];
        let frame = MstpFrame {
            frame_type: FrameType::Token,
            destination: 5,
            source: 1,
            data: Vec::new(),
        };
        let n = encode_frame(&mut buf, &frame).unwrap();
        buf[1] = 0x00;
        assert!(decode_frame(&buf[..n]).is_err());
    }

    #[test]
    fn corrupted_header_crc_is_rejected() {
        let mut buf = [0u8; 16];
        let frame = MstpFrame {
            frame_type: FrameType::PollForMaster,
            destination: 2,
            source: 1,
            data: Vec::new(),
        };
        let n = encode_frame(&mut buf, &frame).unwrap();
        buf[3] ^= 0x01;
        assert!(decode_frame(&buf[..n]).is_err());
    }

    #[test]
    fn corrupted_data_crc_is_rejected() {
        let mut buf = [0u8; 64];
        let frame = MstpFrame {
            frame_type: FrameType::BacnetDataExpectingReply,
            destination: 0xFF,
            source: 3,
            data: vec![9, 9, 9],
        };
        let n = encode_frame(&mut buf, &frame).unwrap();
        buf[9] ^= 0x01;
        assert!(decode_frame(&buf[..n]).is_err());
    }

    #[test]
    fn truncated_frame_is_rejected_at_every_prefix_length() {
        let mut buf = [0u8; 64];
        let frame = MstpFrame {
            frame_type: FrameType::TestRequest,
            destination: 0xFF,
            source: 3,
            data: vec![1, 2, 3],
        };
        let n = encode_frame(&mut buf, &frame).unwrap();
        for prefix in 0..n {
            assert!(decode_frame(&buf[..prefix]).is_err());
        }
    }
}
