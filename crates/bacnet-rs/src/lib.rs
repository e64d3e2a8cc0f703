#![cfg_attr(not(feature = "std"), no_std)]

// 'alloc' is used for dynamic allocation (e.g., Vec<u8> in frames, BTreeMap in the object
// registry and routing tables).
extern crate alloc;

// --- Foundation Modules ---
pub mod hal;
pub mod common;

// --- Wire Codecs (C1/C2/C3) ---
pub mod tag;
pub mod primitive;
pub mod apdu;
pub mod npdu;

// --- Object / Property Model (C4) ---
pub mod object;

// --- Service Handlers (C5) ---
pub mod service;

// --- MS/TP Data-Link FSM (C6) ---
pub mod mstp;

// --- BACnet/IP BVLC (C7) ---
pub mod bvlc;

// --- Router Core & Message Bus (C8) ---
pub mod router;

// --- Top-level Exports ---
pub use common::Address;
pub use hal::{BacnetError, DataLink, NvStore};
pub use apdu::Apdu;
pub use npdu::Npdu;
