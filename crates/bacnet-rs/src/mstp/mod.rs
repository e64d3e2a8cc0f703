// crates/bacnet-rs/src/mstp/mod.rs
//! MS/TP master-slave token-passing data link (Clause 9).
//!
//! Layered bottom-up: [`crc`] (Annex G checksums), [`frame`] (wire format),
//! [`receive_fsm`] (octet recovery), [`master_fsm`]/[`node`] (bus-ownership
//! logic for master and slave nodes respectively).

pub mod crc;
pub mod frame;
pub mod master_fsm;
pub mod node;
pub mod receive_fsm;

pub use frame::{FrameType, MstpFrame};
pub use master_fsm::{MasterAction, MasterNodeFsm, MasterState};
pub use node::SlaveNode;
pub use receive_fsm::{poll, ReceiveEvent, ReceiveFsm};
