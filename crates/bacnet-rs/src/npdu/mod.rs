// crates/bacnet-rs/src/npdu/mod.rs
//! NPDU header and network-layer message codec (§3.2, §4.3, Clause 6).
//!
//! The decoder here is deliberately bounded-only: it operates on a single fully
//! received slice and never streams across partial reads, since every data-link this
//! crate targets (MS/TP, BACnet/IP) already delivers complete frames.

pub mod message;

use crate::common::{Address, Priority, NETWORK_BROADCAST};
use crate::hal::BacnetError;
use alloc::vec::Vec;
pub use message::{NetworkMessage, RoutingTableEntry};

const NPDU_VERSION: u8 = 1;

const CTRL_NETWORK_LAYER_MESSAGE: u8 = 0x80;
const CTRL_DESTINATION_PRESENT: u8 = 0x20;
const CTRL_SOURCE_PRESENT: u8 = 0x08;
const CTRL_EXPECTING_REPLY: u8 = 0x04;
const CTRL_PRIORITY_MASK: u8 = 0x03;

/// A decoded NPDU header plus (for non-network-layer NPDUs) the offset where the
/// APDU begins, or (for network-layer NPDUs) the decoded message itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Npdu {
    pub destination: Option<Address>,
    pub source: Option<Address>,
    pub hop_count: Option<u8>,
    pub expecting_reply: bool,
    pub priority: Priority,
    pub network_message: Option<NetworkMessage>,
}

impl Npdu {
    pub fn new_data(destination: Option<Address>, expecting_reply: bool, priority: Priority) -> Self {
        Self {
            destination,
            source: None,
            hop_count: destination.map(|_| 255),
            expecting_reply,
            priority,
            network_message: None,
        }
    }

    pub fn new_network_message(destination: Option<Address>, message: NetworkMessage) -> Self {
        Self {
            destination,
            source: None,
            hop_count: destination.map(|_| 255),
            expecting_reply: false,
            priority: Priority::Normal,
            network_message: Some(message),
        }
    }

    pub fn is_network_layer_message(&self) -> bool {
        self.network_message.is_some()
    }

    /// Is `self` addressed to the global broadcast network?
    pub fn is_global_broadcast(&self) -> bool {
        self.destination
            .map(|d| d.net == NETWORK_BROADCAST)
            .unwrap_or(false)
    }
}

/// Encodes the NPDU header (and, if present, the network-layer message) into
/// `buffer`. Returns the number of octets written; the caller appends the APDU
/// afterwards when `network_message` is `None`.
pub fn encode_npdu(buffer: &mut [u8], npdu: &Npdu) -> Result<usize, BacnetError> {
    if buffer.is_empty() {
        return Err(BacnetError::BufferTooShort);
    }
    buffer[0] = NPDU_VERSION;

    let mut control = 0u8;
    if npdu.network_message.is_some() {
        control |= CTRL_NETWORK_LAYER_MESSAGE;
    }
    if npdu.destination.is_some() {
        control |= CTRL_DESTINATION_PRESENT;
    }
    if npdu.source.is_some() {
        control |= CTRL_SOURCE_PRESENT;
    }
    if npdu.expecting_reply {
        control |= CTRL_EXPECTING_REPLY;
    }
    control |= npdu.priority.bits() & CTRL_PRIORITY_MASK;

    if buffer.len() < 2 {
        return Err(BacnetError::BufferTooShort);
    }
    buffer[1] = control;
    let mut idx = 2;

    if let Some(dest) = npdu.destination {
        idx = encode_route(buffer, idx, dest.net, dest.adr_slice())?;
    }
    if let Some(src) = npdu.source {
        idx = encode_route(buffer, idx, src.net, src.mac_slice())?;
    }
    if npdu.destination.is_some() {
        if buffer.len() < idx + 1 {
            return Err(BacnetError::BufferTooShort);
        }
        buffer[idx] = npdu.hop_count.unwrap_or(255);
        idx += 1;
    }

    if let Some(msg) = &npdu.network_message {
        idx += message::encode_network_message(&mut buffer[idx..], msg)?;
    }

    Ok(idx)
}

fn encode_route(buffer: &mut [u8], idx: usize, net: u16, adr: &[u8]) -> Result<usize, BacnetError> {
    if buffer.len() < idx + 3 {
        return Err(BacnetError::BufferTooShort);
    }
    buffer[idx..idx + 2].copy_from_slice(&net.to_be_bytes());
    buffer[idx + 2] = adr.len() as u8;
    let mut idx = idx + 3;
    if buffer.len() < idx + adr.len() {
        return Err(BacnetError::BufferTooShort);
    }
    buffer[idx..idx + adr.len()].copy_from_slice(adr);
    idx += adr.len();
    Ok(idx)
}

/// Decodes the NPDU header from the front of `buffer`. Returns the header and the
/// number of octets consumed; the remainder of `buffer` is the APDU (when
/// `network_message` is `None`) or has already been fully consumed into the message.
pub fn decode_npdu(buffer: &[u8]) -> Result<(Npdu, usize), BacnetError> {
    if buffer.len() < 2 {
        return Err(BacnetError::BufferTooShort);
    }
    if buffer[0] != NPDU_VERSION {
        return Err(BacnetError::UnsupportedVersion);
    }
    let control = buffer[1];
    let mut idx = 2;

    let destination = if control & CTRL_DESTINATION_PRESENT != 0 {
        let (net, adr, next) = decode_route(buffer, idx)?;
        idx = next;
        let mut addr = Address::empty();
        addr.net = net;
        addr.set_adr(&adr);
        Some(addr)
    } else {
        None
    };

    let source = if control & CTRL_SOURCE_PRESENT != 0 {
        let (net, adr, next) = decode_route(buffer, idx)?;
        idx = next;
        let mut addr = Address::empty();
        addr.net = net;
        addr.set_mac(&adr);
        Some(addr)
    } else {
        None
    };

    let hop_count = if destination.is_some() {
        if buffer.len() < idx + 1 {
            return Err(BacnetError::BufferTooShort);
        }
        let h = buffer[idx];
        idx += 1;
        Some(h)
    } else {
        None
    };

    if destination.is_none() && hop_count.is_some() {
        return Err(BacnetError::MalformedNpdu);
    }

    let expecting_reply = control & CTRL_EXPECTING_REPLY != 0;
    let priority = Priority::from_bits(control & CTRL_PRIORITY_MASK);

    let network_message = if control & CTRL_NETWORK_LAYER_MESSAGE != 0 {
        let (msg, consumed) = message::decode_network_message(&buffer[idx..])?;
        idx += consumed;
        Some(msg)
    } else {
        None
    };

    Ok((
        Npdu {
            destination,
            source,
            hop_count,
            expecting_reply,
            priority,
            network_message,
        },
        idx,
    ))
}

fn decode_route(buffer: &[u8], idx: usize) -> Result<(u16, Vec<u8>, usize), BacnetError> {
    if buffer.len() < idx + 3 {
        return Err(BacnetError::BufferTooShort);
    }
    let net = u16::from_be_bytes([buffer[idx], buffer[idx + 1]]);
    let len = buffer[idx + 2] as usize;
    let idx = idx + 3;
    if buffer.len() < idx + len {
        return Err(BacnetError::BufferTooShort);
    }
    Ok((net, buffer[idx..idx + len].to_vec(), idx + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_unicast_data_round_trip() {
        let mut buf = [0u8; 32];
        let npdu = Npdu::new_data(None, false, Priority::Normal);
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        assert_eq!(n, 2);
        let (decoded, consumed) = decode_npdu(&buf[..n]).unwrap();
        assert_eq!(consumed, n);
        assert_eq!(decoded, npdu);
    }

    #[test]
    fn routed_destination_round_trip() {
        let mut dest = Address::empty();
        dest.net = 40;
        dest.set_adr(&[0x07]);
        let mut buf = [0u8; 32];
        let npdu = Npdu::new_data(Some(dest), true, Priority::LifeSafety);
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        let (decoded, consumed) = decode_npdu(&buf[..n]).unwrap();
        assert_eq!(consumed, n);
        assert_eq!(decoded.destination.unwrap().net, 40);
        assert_eq!(decoded.destination.unwrap().adr_slice(), &[0x07]);
        assert!(decoded.expecting_reply);
        assert_eq!(decoded.priority, Priority::LifeSafety);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let buf = [2u8, 0u8];
        assert_eq!(decode_npdu(&buf), Err(BacnetError::UnsupportedVersion));
    }

    #[test]
    fn destination_without_hop_count_space_is_rejected() {
        let mut dest = Address::empty();
        dest.net = 1;
        let mut buf = [0u8; 4];
        let npdu = Npdu::new_data(Some(dest), false, Priority::Normal);
        assert_eq!(encode_npdu(&mut buf, &npdu), Err(BacnetError::BufferTooShort));
    }

    #[test]
    fn truncated_header_is_rejected_at_every_prefix() {
        let mut dest = Address::empty();
        dest.net = 40;
        dest.set_adr(&[0x07, 0x08]);
        let mut buf = [0u8; 32];
        let npdu = Npdu::new_data(Some(dest), true, Priority::Urgent);
        let full = encode_npdu(&mut buf, &npdu).unwrap();
        for n in 0..full {
            assert!(decode_npdu(&buf[..n]).is_err());
        }
    }
}
