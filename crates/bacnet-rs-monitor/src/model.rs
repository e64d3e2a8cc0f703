// crates/bacnet-rs-monitor/src/model.rs
//! Defines the core data structures for diagnostic monitoring.
//!
//! These structs are used to pass data from the router's worker threads to
//! the non-real-time monitor thread and are serialized (e.g., to JSON) for
//! the web frontend.

use alloc::string::String;
use alloc::vec::Vec;
use serde::Serialize;

/// A serializable snapshot of one configured port (§4.8).
#[derive(Serialize, Clone, Debug)]
pub struct PortInfo {
    pub port_id: u8,
    pub network: u16,
    pub link_kind: String,
    pub link_up: bool,
    pub egress_mailbox_depth: usize,
    pub egress_mailbox_capacity: usize,
}

/// A serializable entry of the router's routing table (§4.3).
#[derive(Serialize, Clone, Debug)]
pub struct RouteInfo {
    pub network: u16,
    pub port_id: u8,
}

/// A serializable snapshot of the Transaction State Machine's occupancy (§4.5).
#[derive(Serialize, Clone, Debug, Default)]
pub struct TsmInfo {
    pub outstanding: usize,
    pub capacity: usize,
}

/// A serializable snapshot of one property value last observed on a remote
/// device, for operator display.
#[derive(Serialize, Clone, Debug)]
pub struct ObservedValue {
    pub device_instance: u32,
    pub object_type: u16,
    pub object_instance: u32,
    pub property: String,
    /// A textual rendering of the value; the monitor is a read-only diagnostic
    /// surface and has no need for the full tagged-primitive representation.
    pub value: String,
}

/// The main data packet sent from the router process to the monitor.
/// Contains a complete snapshot of the router's state for one sampling tick.
#[derive(Serialize, Clone, Debug)]
pub struct RouterSnapshot {
    pub ports: Vec<PortInfo>,
    pub routes: Vec<RouteInfo>,
    pub tsm: TsmInfo,
    pub observed_values: Vec<ObservedValue>,
}
