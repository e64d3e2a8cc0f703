// crates/bacnet-rs/src/router/message.rs
//! The inter-port message envelope (§4.8), grounded in the reference router's
//! `BACMSG{type, origin, subtype, data}` message-queue envelope: each port runs
//! on its own collaborator (thread, on Linux) and hands frames and control
//! events to the router core through one of these.

use super::buffer::BufRef;

/// Mirrors the reference router's `SERVICE` message subtypes: control events a
/// port collaborator raises about itself, as opposed to a data frame it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMessage {
    /// The port is shutting down and should be dropped from the routing table.
    Shutdown,
    /// The port's IP address changed (BACnet/IP only).
    ChangeIp([u8; 4]),
    /// The port's MAC/MS/TP address changed.
    ChangeMac([u8; 7], u8),
}

#[derive(Debug, Clone)]
pub enum MessageKind {
    /// A received link-layer frame, still encoded, ready for [`super::Router::handle_inbound`].
    Data(BufRef),
    Service(ServiceMessage),
}

/// One envelope passed from a port collaborator to the router core.
#[derive(Debug, Clone)]
pub struct Message {
    pub origin: u8,
    pub kind: MessageKind,
}

impl Message {
    pub fn data(origin: u8, frame: BufRef) -> Self {
        Message {
            origin,
            kind: MessageKind::Data(frame),
        }
    }

    pub fn service(origin: u8, msg: ServiceMessage) -> Self {
        Message {
            origin,
            kind: MessageKind::Service(msg),
        }
    }

    #[cfg(test)]
    fn kind_as_service(&self) -> Option<ServiceMessage> {
        match self.kind {
            MessageKind::Service(s) => Some(s),
            MessageKind::Data(_) => None,
        }
    }
}
