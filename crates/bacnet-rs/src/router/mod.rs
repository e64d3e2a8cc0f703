// crates/bacnet-rs/src/router/mod.rs
//! Multi-port BACnet router (§4.3, §4.8): bridges NPDUs between directly
//! attached networks (one per port) using a learned [`table::RoutingTable`].
//!
//! This module is pure decision logic: given bytes received on a port, it says
//! what to do (deliver locally, forward onto another port, or go discover a
//! route) without itself touching any socket or UART. The `bacnet-rs-linux`
//! driver crate owns the actual [`crate::hal::DataLink`] instances and carries
//! out the actions this module returns, the same separation the core keeps
//! everywhere else between protocol decisions and physical I/O.

pub mod buffer;
pub mod mailbox;
pub mod message;
pub mod table;

use crate::common::{Address, NETWORK_BROADCAST};
use crate::hal::BacnetError;
use crate::npdu::{decode_npdu, encode_npdu, NetworkMessage, Npdu, RoutingTableEntry};
use alloc::vec;
use alloc::vec::Vec;
use buffer::{shared_frame, SharedFrame};
use mailbox::Mailbox;
use table::RoutingTable;

/// A directly attached network this router bridges.
pub struct PortInfo {
    pub id: u8,
    pub network: u16,
}

/// What the caller must do in response to one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterAction {
    /// Hand the APDU up to this node's own application layer.
    Deliver { arrival_port: u8, apdu: Vec<u8> },
    /// Transmit `frame` (an encoded NPDU, with APDU appended by the caller where
    /// one originally followed) out `port_id`.
    SendOn { port_id: u8, frame: Vec<u8> },
    /// No route to `network` is known; the caller should broadcast a
    /// Who-Is-Router-To-Network and retry once a route is learned.
    DiscoverRoute { network: u16 },
}

pub struct Router {
    ports: Vec<PortInfo>,
    table: RoutingTable,
    mailboxes: Vec<Mailbox>,
}

impl Router {
    pub fn new(ports: Vec<PortInfo>, mailbox_capacity: usize) -> Self {
        let mut table = RoutingTable::new();
        for p in &ports {
            table.learn(p.network, p.id, None);
        }
        let mailboxes = ports.iter().map(|_| Mailbox::new(mailbox_capacity)).collect();
        Router {
            ports,
            table,
            mailboxes,
        }
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.table
    }

    fn port_index(&self, id: u8) -> Option<usize> {
        self.ports.iter().position(|p| p.id == id)
    }

    fn network_of_port(&self, id: u8) -> Option<u16> {
        self.ports.iter().find(|p| p.id == id).map(|p| p.network)
    }

    /// Queues `frame` for transmission on `port_id`'s mailbox.
    pub fn enqueue(&mut self, port_id: u8, frame: Vec<u8>) -> Result<(), BacnetError> {
        let idx = self
            .port_index(port_id)
            .ok_or(BacnetError::InternalError("unknown port"))?;
        self.mailboxes[idx].push(shared_frame(frame))
    }

    pub fn dequeue(&mut self, port_id: u8) -> Option<SharedFrame> {
        let idx = self.port_index(port_id)?;
        self.mailboxes[idx].pop()
    }

    /// Decodes one inbound NPDU received on `arrival_port` and decides what to
    /// do with it (Clause 6.2/6.4).
    pub fn handle_inbound(&mut self, arrival_port: u8, bytes: &[u8]) -> Result<Vec<RouterAction>, BacnetError> {
        let (npdu, consumed) = decode_npdu(bytes)?;
        let apdu = &bytes[consumed..];

        if let Some(msg) = &npdu.network_message {
            return Ok(self.handle_network_message(arrival_port, msg));
        }

        match npdu.destination {
            None => Ok(vec![RouterAction::Deliver {
                arrival_port,
                apdu: apdu.to_vec(),
            }]),
            Some(dest) if dest.net == NETWORK_BROADCAST => {
                let mut actions = vec![RouterAction::Deliver {
                    arrival_port,
                    apdu: apdu.to_vec(),
                }];
                if !npdu.hop_count.map(|h| h <= 1).unwrap_or(false) {
                    for port_id in self.other_port_ids(arrival_port) {
                        let frame = self.build_forwarded_frame(&npdu, arrival_port, dest, apdu)?;
                        actions.push(RouterAction::SendOn { port_id, frame });
                    }
                }
                Ok(actions)
            }
            Some(dest) => self.route_unicast(arrival_port, &npdu, dest, apdu),
        }
    }

    fn other_port_ids(&self, except: u8) -> Vec<u8> {
        self.ports.iter().filter(|p| p.id != except).map(|p| p.id).collect()
    }

    fn route_unicast(
        &mut self,
        arrival_port: u8,
        npdu: &Npdu,
        dest: Address,
        apdu: &[u8],
    ) -> Result<Vec<RouterAction>, BacnetError> {
        if self.network_of_port(arrival_port) == Some(dest.net) {
            // Already on the destination's own segment; deliver to this node too.
            return Ok(vec![RouterAction::Deliver {
                arrival_port,
                apdu: apdu.to_vec(),
            }]);
        }

        let route = match self.table.lookup(dest.net) {
            Some(r) => r.clone(),
            None => return Ok(vec![RouterAction::DiscoverRoute { network: dest.net }]),
        };
        if route.port_id == arrival_port {
            // Would bounce the frame back where it came from; drop it.
            return Ok(Vec::new());
        }
        if npdu.hop_count.map(|h| h <= 1).unwrap_or(false) {
            return Ok(Vec::new());
        }

        let frame = self.build_forwarded_frame(npdu, arrival_port, dest, apdu)?;
        Ok(vec![RouterAction::SendOn {
            port_id: route.port_id,
            frame,
        }])
    }

    /// Re-encodes an NPDU for forwarding: hop count decremented, and a source
    /// network/address recorded when the frame is leaving the network it
    /// originated on, so the far end knows where to route a reply (Clause 6.2).
    fn build_forwarded_frame(
        &self,
        npdu: &Npdu,
        arrival_port: u8,
        dest: Address,
        apdu: &[u8],
    ) -> Result<Vec<u8>, BacnetError> {
        let source = npdu.source.or_else(|| {
            self.network_of_port(arrival_port).map(|net| {
                let mut addr = Address::empty();
                addr.net = net;
                addr
            })
        });
        let forwarded = Npdu {
            destination: Some(dest),
            source,
            hop_count: Some(npdu.hop_count.unwrap_or(255).saturating_sub(1)),
            expecting_reply: npdu.expecting_reply,
            priority: npdu.priority,
            network_message: None,
        };
        let mut buf = vec![0u8; 32 + apdu.len()];
        let n = encode_npdu(&mut buf, &forwarded)?;
        if buf.len() < n + apdu.len() {
            return Err(BacnetError::BufferTooShort);
        }
        buf[n..n + apdu.len()].copy_from_slice(apdu);
        buf.truncate(n + apdu.len());
        Ok(buf)
    }

    fn handle_network_message(&mut self, arrival_port: u8, msg: &NetworkMessage) -> Vec<RouterAction> {
        match msg {
            NetworkMessage::WhoIsRouterToNetwork { network } => {
                let networks: Vec<u16> = match network {
                    Some(net) if self.table.lookup(*net).is_some() => vec![*net],
                    Some(_) => Vec::new(),
                    None => self
                        .ports
                        .iter()
                        .filter(|p| p.id != arrival_port)
                        .map(|p| p.network)
                        .collect(),
                };
                if networks.is_empty() {
                    return Vec::new();
                }
                let reply = Npdu::new_network_message(
                    None,
                    NetworkMessage::IAmRouterToNetwork { networks },
                );
                match self.encode_control_message(&reply) {
                    Ok(frame) => vec![RouterAction::SendOn {
                        port_id: arrival_port,
                        frame,
                    }],
                    Err(_) => Vec::new(),
                }
            }
            NetworkMessage::IAmRouterToNetwork { networks } => {
                for net in networks {
                    self.table.learn(*net, arrival_port, None);
                }
                Vec::new()
            }
            NetworkMessage::InitRtTable { entries } => {
                for e in entries {
                    self.table.learn(e.network, e.port_id, None);
                }
                Vec::new()
            }
            NetworkMessage::InitRtTableAck { .. }
            | NetworkMessage::ICouldBeRouterToNetwork { .. }
            | NetworkMessage::RejectMessageToNetwork { .. }
            | NetworkMessage::RouterBusyToNetwork { .. }
            | NetworkMessage::RouterAvailableToNetwork { .. } => Vec::new(),
        }
    }

    fn encode_control_message(&self, npdu: &Npdu) -> Result<Vec<u8>, BacnetError> {
        let mut buf = vec![0u8; 64];
        let n = encode_npdu(&mut buf, npdu)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Builds the Init-Routing-Table entries describing every network this
    /// router currently knows how to reach, for pushing to a peer router.
    pub fn routing_table_entries(&self) -> Vec<RoutingTableEntry> {
        self.table
            .iter()
            .map(|e| RoutingTableEntry {
                network: e.network,
                port_id: e.port_id,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Priority;
    use crate::npdu::{encode_npdu, Npdu};

    fn router() -> Router {
        Router::new(
            vec![
                PortInfo { id: 1, network: 100 },
                PortInfo { id: 2, network: 200 },
            ],
            8,
        )
    }

    #[test]
    fn local_data_with_no_destination_is_delivered() {
        let mut r = router();
        let mut buf = [0u8; 16];
        let npdu = Npdu::new_data(None, false, Priority::Normal);
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        let mut frame = buf[..n].to_vec();
        frame.extend_from_slice(&[0xAA, 0xBB]);
        let actions = r.handle_inbound(1, &frame).unwrap();
        assert_eq!(
            actions,
            vec![RouterAction::Deliver {
                arrival_port: 1,
                apdu: alloc::vec![0xAA, 0xBB]
            }]
        );
    }

    #[test]
    fn unicast_to_known_network_is_forwarded_to_the_right_port() {
        let mut r = router();
        let mut dest = Address::empty();
        dest.net = 200;
        let npdu = Npdu::new_data(Some(dest), false, Priority::Normal);
        let mut buf = [0u8; 32];
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        let mut frame = buf[..n].to_vec();
        frame.extend_from_slice(&[0x01]);
        let actions = r.handle_inbound(1, &frame).unwrap();
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            RouterAction::SendOn { port_id, .. } => assert_eq!(*port_id, 2),
            other => panic!("expected SendOn, got {:?}", other),
        }
    }

    #[test]
    fn unicast_to_unknown_network_triggers_route_discovery() {
        let mut r = router();
        let mut dest = Address::empty();
        dest.net = 999;
        let npdu = Npdu::new_data(Some(dest), false, Priority::Normal);
        let mut buf = [0u8; 32];
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        let actions = r.handle_inbound(1, &buf[..n]).unwrap();
        assert_eq!(actions, vec![RouterAction::DiscoverRoute { network: 999 }]);
    }

    #[test]
    fn broadcast_with_hop_count_exhausted_is_delivered_but_not_rebroadcast() {
        let mut r = router();
        let dest = Address::global_broadcast();
        let mut npdu = Npdu::new_data(Some(dest), false, Priority::Normal);
        npdu.hop_count = Some(1);
        let mut buf = [0u8; 32];
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        let actions = r.handle_inbound(1, &buf[..n]).unwrap();
        assert_eq!(
            actions,
            vec![RouterAction::Deliver {
                arrival_port: 1,
                apdu: Vec::new()
            }]
        );
    }

    #[test]
    fn broadcast_is_delivered_and_forwarded_to_every_other_port() {
        let mut r = router();
        let dest = Address::global_broadcast();
        let npdu = Npdu::new_data(Some(dest), false, Priority::Normal);
        let mut buf = [0u8; 32];
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        let actions = r.handle_inbound(1, &buf[..n]).unwrap();
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], RouterAction::Deliver { .. }));
        match &actions[1] {
            RouterAction::SendOn { port_id, .. } => assert_eq!(*port_id, 2),
            other => panic!("expected SendOn, got {:?}", other),
        }
    }

    #[test]
    fn who_is_router_to_network_learns_the_reply() {
        let mut r = router();
        let actions = r.handle_network_message(
            2,
            &NetworkMessage::IAmRouterToNetwork { networks: vec![300] },
        );
        assert!(actions.is_empty());
        assert_eq!(r.routing_table().lookup(300).unwrap().port_id, 2);
    }

    #[test]
    fn who_is_router_without_network_is_answered_with_every_other_attached_network() {
        let mut r = router();
        let actions = r.handle_network_message(1, &NetworkMessage::WhoIsRouterToNetwork { network: None });
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            RouterAction::SendOn { port_id, .. } => assert_eq!(*port_id, 1),
            other => panic!("expected SendOn, got {:?}", other),
        }
    }

    #[test]
    fn forwarded_frame_does_not_bounce_back_to_the_arrival_port() {
        let mut r = router();
        r.table.learn(500, 1, None);
        let mut dest = Address::empty();
        dest.net = 500;
        let npdu = Npdu::new_data(Some(dest), false, Priority::Normal);
        let mut buf = [0u8; 32];
        let n = encode_npdu(&mut buf, &npdu).unwrap();
        let actions = r.handle_inbound(1, &buf[..n]).unwrap();
        assert!(actions.is_empty());
    }
}
