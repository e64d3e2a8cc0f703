// crates/bacnet-rs/tests/datalink_framing.rs
//! The router core and the object/service layers above it only ever see bare
//! NPDU bytes; it's each data link's job to get those bytes across the wire
//! intact. These tests build one NPDU+APDU payload and carry it end to end
//! through both supported data links' framing, confirming the same payload
//! survives either one.

use bacnet_rs::bvlc::{decode_bvlc, encode_bvlc, BvlcFrame, BvlcFunction};
use bacnet_rs::common::{Address, Priority};
use bacnet_rs::mstp::frame::{decode_frame, encode_frame};
use bacnet_rs::mstp::{FrameType, MstpFrame};
use bacnet_rs::npdu::{decode_npdu, encode_npdu, Npdu};

fn sample_payload() -> Vec<u8> {
    let mut dest = Address::empty();
    dest.net = 0; // local segment, MAC-only addressing
    let npdu = Npdu::new_data(None, false, Priority::Normal);
    let mut buf = [0u8; 32];
    let n = encode_npdu(&mut buf, &npdu).unwrap();
    let mut payload = buf[..n].to_vec();
    payload.extend_from_slice(&[0x10, 0x08, 0x00, 0xC4, 0x02, 0x00, 0x00, 0x01, 0x19, 0x4B]);
    payload
}

#[test]
fn an_npdu_survives_a_round_trip_over_mstp_framing() {
    let payload = sample_payload();
    let frame = MstpFrame {
        frame_type: FrameType::BacnetDataNotExpectingReply,
        destination: 0xFF,
        source: 3,
        data: payload.clone(),
    };
    let mut buf = [0u8; 600];
    let n = encode_frame(&mut buf, &frame).unwrap();
    let (decoded, consumed) = decode_frame(&buf[..n]).unwrap();
    assert_eq!(consumed, n);
    assert_eq!(decoded.data, payload);

    let (npdu, apdu_offset) = decode_npdu(&decoded.data).unwrap();
    assert!(npdu.destination.is_none());
    assert_eq!(&decoded.data[apdu_offset..], &payload[apdu_offset..]);
}

#[test]
fn the_same_npdu_survives_a_round_trip_over_bvlc_framing() {
    let payload = sample_payload();
    let bvlc = BvlcFrame {
        function: BvlcFunction::OriginalBroadcastNpdu,
        body: payload.clone(),
    };
    let mut buf = [0u8; 600];
    let n = encode_bvlc(&mut buf, &bvlc).unwrap();
    let decoded = decode_bvlc(&buf[..n]).unwrap();
    assert_eq!(decoded.function, BvlcFunction::OriginalBroadcastNpdu);
    assert_eq!(decoded.body, payload);

    let (npdu, apdu_offset) = decode_npdu(&decoded.body).unwrap();
    assert!(npdu.destination.is_none());
    assert_eq!(&decoded.body[apdu_offset..], &payload[apdu_offset..]);
}

#[test]
fn mstp_rejects_a_frame_whose_data_crc_was_damaged_in_transit() {
    let payload = sample_payload();
    let frame = MstpFrame {
        frame_type: FrameType::BacnetDataExpectingReply,
        destination: 7,
        source: 1,
        data: payload,
    };
    let mut buf = [0u8; 600];
    let n = encode_frame(&mut buf, &frame).unwrap();
    buf[n - 1] ^= 0xFF;
    assert!(decode_frame(&buf[..n]).is_err());
}

#[test]
fn bvlc_rejects_a_frame_whose_declared_length_does_not_match_the_datagram() {
    let bvlc = BvlcFrame {
        function: BvlcFunction::OriginalUnicastNpdu,
        body: sample_payload(),
    };
    let mut buf = [0u8; 600];
    let n = encode_bvlc(&mut buf, &bvlc).unwrap();
    assert!(decode_bvlc(&buf[..n - 1]).is_err());
}
