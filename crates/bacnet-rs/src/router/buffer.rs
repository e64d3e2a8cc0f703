// crates/bacnet-rs/src/router/buffer.rs
//! Refcounted frame buffer (§4.3): a broadcast fans the same encoded NPDU out to
//! every other port without re-copying it once per destination.

use alloc::rc::Rc;
use alloc::vec::Vec;

pub type SharedFrame = Rc<Vec<u8>>;

/// Alias matching the reference router's refcounted buffer handle naming; the
/// buffer is freed automatically once its last `Rc` clone drops, replacing the
/// original's explicit `free_data` call on a zeroed refcount.
pub type BufRef = SharedFrame;

pub fn shared_frame(bytes: Vec<u8>) -> SharedFrame {
    Rc::new(bytes)
}
