// crates/bacnet-rs/src/npdu/message.rs
//! Network-layer messages (Clause 6.4), the router-to-router control plane.
//!
//! Beyond Who-Is/I-Am-Router-To-Network (needed for basic route discovery), this
//! also carries Router-Busy/Router-Available and Init-Routing-Table/-Ack, which the
//! reference router implementation uses to flow-control a congested port and to
//! push a statically configured routing table to a peer router.

use crate::hal::BacnetError;
use alloc::vec;
use alloc::vec::Vec;

const MSG_WHO_IS_ROUTER_TO_NETWORK: u8 = 0x00;
const MSG_I_AM_ROUTER_TO_NETWORK: u8 = 0x01;
const MSG_I_COULD_BE_ROUTER_TO_NETWORK: u8 = 0x02;
const MSG_REJECT_MESSAGE_TO_NETWORK: u8 = 0x03;
const MSG_ROUTER_BUSY_TO_NETWORK: u8 = 0x04;
const MSG_ROUTER_AVAILABLE_TO_NETWORK: u8 = 0x05;
const MSG_INIT_RT_TABLE: u8 = 0x06;
const MSG_INIT_RT_TABLE_ACK: u8 = 0x07;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Other,
    NotDirectlyConnected,
    BusyPortBusy,
    UnknownNetworkLayerMessageType,
    MessageTooLong,
    SecurityError,
    AddressingError,
}

impl RejectReason {
    fn to_wire(self) -> u8 {
        match self {
            RejectReason::Other => 0,
            RejectReason::NotDirectlyConnected => 1,
            RejectReason::BusyPortBusy => 2,
            RejectReason::UnknownNetworkLayerMessageType => 3,
            RejectReason::MessageTooLong => 4,
            RejectReason::SecurityError => 5,
            RejectReason::AddressingError => 6,
        }
    }

    fn from_wire(v: u8) -> Self {
        match v {
            1 => RejectReason::NotDirectlyConnected,
            2 => RejectReason::BusyPortBusy,
            3 => RejectReason::UnknownNetworkLayerMessageType,
            4 => RejectReason::MessageTooLong,
            5 => RejectReason::SecurityError,
            6 => RejectReason::AddressingError,
            _ => RejectReason::Other,
        }
    }
}

/// One entry in an Init-Routing-Table message: a reachable network plus the port it
/// is reached through (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingTableEntry {
    pub network: u16,
    pub port_id: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkMessage {
    WhoIsRouterToNetwork { network: Option<u16> },
    IAmRouterToNetwork { networks: Vec<u16> },
    ICouldBeRouterToNetwork { network: u16, performance_index: u8 },
    RejectMessageToNetwork { reason: RejectReason, network: u16 },
    RouterBusyToNetwork { networks: Vec<u16> },
    RouterAvailableToNetwork { networks: Vec<u16> },
    InitRtTable { entries: Vec<RoutingTableEntry> },
    InitRtTableAck { entries: Vec<RoutingTableEntry> },
}

pub fn encode_network_message(buffer: &mut [u8], msg: &NetworkMessage) -> Result<usize, BacnetError> {
    if buffer.is_empty() {
        return Err(BacnetError::BufferTooShort);
    }
    let mut idx = 1;
    match msg {
        NetworkMessage::WhoIsRouterToNetwork { network } => {
            buffer[0] = MSG_WHO_IS_ROUTER_TO_NETWORK;
            if let Some(net) = network {
                require(buffer, idx + 2)?;
                buffer[idx..idx + 2].copy_from_slice(&net.to_be_bytes());
                idx += 2;
            }
        }
        NetworkMessage::IAmRouterToNetwork { networks } => {
            buffer[0] = MSG_I_AM_ROUTER_TO_NETWORK;
            idx = encode_network_list(buffer, idx, networks)?;
        }
        NetworkMessage::ICouldBeRouterToNetwork {
            network,
            performance_index,
        } => {
            buffer[0] = MSG_I_COULD_BE_ROUTER_TO_NETWORK;
            require(buffer, idx + 3)?;
            buffer[idx..idx + 2].copy_from_slice(&network.to_be_bytes());
            buffer[idx + 2] = *performance_index;
            idx += 3;
        }
        NetworkMessage::RejectMessageToNetwork { reason, network } => {
            buffer[0] = MSG_REJECT_MESSAGE_TO_NETWORK;
            require(buffer, idx + 3)?;
            buffer[idx] = reason.to_wire();
            buffer[idx + 1..idx + 3].copy_from_slice(&network.to_be_bytes());
            idx += 3;
        }
        NetworkMessage::RouterBusyToNetwork { networks } => {
            buffer[0] = MSG_ROUTER_BUSY_TO_NETWORK;
            idx = encode_network_list(buffer, idx, networks)?;
        }
        NetworkMessage::RouterAvailableToNetwork { networks } => {
            buffer[0] = MSG_ROUTER_AVAILABLE_TO_NETWORK;
            idx = encode_network_list(buffer, idx, networks)?;
        }
        NetworkMessage::InitRtTable { entries } => {
            buffer[0] = MSG_INIT_RT_TABLE;
            idx = encode_rt_table(buffer, idx, entries)?;
        }
        NetworkMessage::InitRtTableAck { entries } => {
            buffer[0] = MSG_INIT_RT_TABLE_ACK;
            idx = encode_rt_table(buffer, idx, entries)?;
        }
    }
    Ok(idx)
}

fn require(buffer: &[u8], len: usize) -> Result<(), BacnetError> {
    if buffer.len() < len {
        Err(BacnetError::BufferTooShort)
    } else {
        Ok(())
    }
}

fn encode_network_list(buffer: &mut [u8], mut idx: usize, networks: &[u16]) -> Result<usize, BacnetError> {
    for net in networks {
        require(buffer, idx + 2)?;
        buffer[idx..idx + 2].copy_from_slice(&net.to_be_bytes());
        idx += 2;
    }
    Ok(idx)
}

fn encode_rt_table(
    buffer: &mut [u8],
    mut idx: usize,
    entries: &[RoutingTableEntry],
) -> Result<usize, BacnetError> {
    require(buffer, idx + 1)?;
    buffer[idx] = entries.len() as u8;
    idx += 1;
    for e in entries {
        require(buffer, idx + 3)?;
        buffer[idx..idx + 2].copy_from_slice(&e.network.to_be_bytes());
        buffer[idx + 2] = e.port_id;
        idx += 3;
    }
    Ok(idx)
}

pub fn decode_network_message(buffer: &[u8]) -> Result<(NetworkMessage, usize), BacnetError> {
    if buffer.is_empty() {
        return Err(BacnetError::BufferTooShort);
    }
    let kind = buffer[0];
    let mut idx = 1;
    let msg = match kind {
        MSG_WHO_IS_ROUTER_TO_NETWORK => {
            let network = if buffer.len() >= idx + 2 {
                let n = u16::from_be_bytes([buffer[idx], buffer[idx + 1]]);
                idx += 2;
                Some(n)
            } else {
                None
            };
            NetworkMessage::WhoIsRouterToNetwork { network }
        }
        MSG_I_AM_ROUTER_TO_NETWORK => {
            let (networks, next) = decode_network_list(buffer, idx)?;
            idx = next;
            NetworkMessage::IAmRouterToNetwork { networks }
        }
        MSG_I_COULD_BE_ROUTER_TO_NETWORK => {
            require(buffer, idx + 3)?;
            let network = u16::from_be_bytes([buffer[idx], buffer[idx + 1]]);
            let performance_index = buffer[idx + 2];
            idx += 3;
            NetworkMessage::ICouldBeRouterToNetwork {
                network,
                performance_index,
            }
        }
        MSG_REJECT_MESSAGE_TO_NETWORK => {
            require(buffer, idx + 3)?;
            let reason = RejectReason::from_wire(buffer[idx]);
            let network = u16::from_be_bytes([buffer[idx + 1], buffer[idx + 2]]);
            idx += 3;
            NetworkMessage::RejectMessageToNetwork { reason, network }
        }
        MSG_ROUTER_BUSY_TO_NETWORK => {
            let (networks, next) = decode_network_list(buffer, idx)?;
            idx = next;
            NetworkMessage::RouterBusyToNetwork { networks }
        }
        MSG_ROUTER_AVAILABLE_TO_NETWORK => {
            let (networks, next) = decode_network_list(buffer, idx)?;
            idx = next;
            NetworkMessage::RouterAvailableToNetwork { networks }
        }
        MSG_INIT_RT_TABLE => {
            let (entries, next) = decode_rt_table(buffer, idx)?;
            idx = next;
            NetworkMessage::InitRtTable { entries }
        }
        MSG_INIT_RT_TABLE_ACK => {
            let (entries, next) = decode_rt_table(buffer, idx)?;
            idx = next;
            NetworkMessage::InitRtTableAck { entries }
        }
        _ => return Err(BacnetError::InvalidFrame),
    };
    Ok((msg, idx))
}

fn decode_network_list(buffer: &[u8], mut idx: usize) -> Result<(Vec<u16>, usize), BacnetError> {
    let mut networks = Vec::new();
    while buffer.len() >= idx + 2 {
        networks.push(u16::from_be_bytes([buffer[idx], buffer[idx + 1]]));
        idx += 2;
    }
    if buffer.len() != idx {
        return Err(BacnetError::InvalidFrame);
    }
    Ok((networks, idx))
}

fn decode_rt_table(buffer: &[u8], idx: usize) -> Result<(Vec<RoutingTableEntry>, usize), BacnetError> {
    require(buffer, idx + 1)?;
    let count = buffer[idx] as usize;
    let mut idx = idx + 1;
    let mut entries = vec![];
    for _ in 0..count {
        require(buffer, idx + 3)?;
        entries.push(RoutingTableEntry {
            network: u16::from_be_bytes([buffer[idx], buffer[idx + 1]]),
            port_id: buffer[idx + 2],
        });
        idx += 3;
    }
    Ok((entries, idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn who_is_router_with_and_without_network_round_trips() {
        let mut buf = [0u8; 8];
        let msg = NetworkMessage::WhoIsRouterToNetwork { network: None };
        let n = encode_network_message(&mut buf, &msg).unwrap();
        assert_eq!(n, 1);
        let (decoded, consumed) = decode_network_message(&buf[..n]).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(consumed, n);

        let msg = NetworkMessage::WhoIsRouterToNetwork { network: Some(40) };
        let n = encode_network_message(&mut buf, &msg).unwrap();
        let (decoded, _) = decode_network_message(&buf[..n]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn i_am_router_to_network_carries_a_list() {
        let mut buf = [0u8; 16];
        let msg = NetworkMessage::IAmRouterToNetwork {
            networks: vec![10, 20, 30],
        };
        let n = encode_network_message(&mut buf, &msg).unwrap();
        let (decoded, consumed) = decode_network_message(&buf[..n]).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(consumed, n);
    }

    #[test]
    fn reject_message_round_trip() {
        let mut buf = [0u8; 8];
        let msg = NetworkMessage::RejectMessageToNetwork {
            reason: RejectReason::BusyPortBusy,
            network: 99,
        };
        let n = encode_network_message(&mut buf, &msg).unwrap();
        let (decoded, _) = decode_network_message(&buf[..n]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn router_busy_and_available_round_trip() {
        let mut buf = [0u8; 16];
        let msg = NetworkMessage::RouterBusyToNetwork {
            networks: vec![5, 6],
        };
        let n = encode_network_message(&mut buf, &msg).unwrap();
        let (decoded, _) = decode_network_message(&buf[..n]).unwrap();
        assert_eq!(decoded, msg);

        let msg = NetworkMessage::RouterAvailableToNetwork { networks: vec![] };
        let n = encode_network_message(&mut buf, &msg).unwrap();
        let (decoded, _) = decode_network_message(&buf[..n]).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn init_rt_table_round_trip() {
        let mut buf = [0u8; 32];
        let msg = NetworkMessage::InitRtTable {
            entries: vec![
                RoutingTableEntry {
                    network: 10,
                    port_id: 1,
                },
                RoutingTableEntry {
                    network: 20,
                    port_id: 2,
                },
            ],
        };
        let n = encode_network_message(&mut buf, &msg).unwrap();
        let (decoded, consumed) = decode_network_message(&buf[..n]).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(consumed, n);
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let buf = [0x7F];
        assert_eq!(decode_network_message(&buf), Err(BacnetError::InvalidFrame));
    }
}
