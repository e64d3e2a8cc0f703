// crates/bacnet-rs-embedded/src/lib.rs
#![no_std]
//! `no_std` HAL scaffolding for microcontroller targets: wraps an
//! `embedded-hal` UART peripheral as [`bacnet_rs::hal::MstpUart`] and a
//! flash region as [`bacnet_rs::hal::NvStore`], the same two collaborator
//! roles `bacnet-rs-linux` fills with a serial port and a directory of
//! files. No executable lives here; a board-support crate pulls this in,
//! supplies concrete peripheral types, and owns `main`.
//!
//! Callers that use [`FlashNvStore`] must install a `#[global_allocator]`:
//! `NvStore::read` returns an owned `Vec`, matching the core crate's
//! `alloc`-based signature.

extern crate alloc;
#[cfg(test)]
extern crate std;

use alloc::vec;
use alloc::vec::Vec;
use bacnet_rs::hal::{BacnetError, MstpUart, NvKey, NvStore};
use embedded_hal_nb::serial::{ErrorType as SerialErrorType, Read as SerialRead, Write as SerialWrite};
use embedded_storage::{ReadStorage, Storage};

/// Bytes reserved per [`NvKey`] slot in the backing flash region. Values
/// wider than this are rejected rather than silently truncated.
const SLOT_LEN: usize = 16;

/// MS/TP over an `embedded-hal` UART. The silence timer is driven by an
/// external tick source (a hardware timer ISR, typically) rather than a
/// wall-clock `Instant`, since `no_std` has none.
pub struct EmbeddedMstpUart<U> {
    uart: U,
    baud: u32,
    silence_ms: u16,
}

impl<U> EmbeddedMstpUart<U> {
    pub fn new(uart: U, baud: u32) -> Self {
        EmbeddedMstpUart {
            uart,
            baud,
            silence_ms: 0,
        }
    }

    /// Advances the silence timer by `delta_ms`; call this from the same
    /// periodic tick that drives the MS/TP frame-abort timeout elsewhere in
    /// the stack.
    pub fn tick(&mut self, delta_ms: u16) {
        self.silence_ms = self.silence_ms.saturating_add(delta_ms);
    }
}

impl<U> MstpUart for EmbeddedMstpUart<U>
where
    U: SerialRead<u8> + SerialWrite<u8> + SerialErrorType,
{
    fn init(&mut self, _iface: &str) -> bool {
        // The peripheral is already configured and owned by the caller before
        // construction; there is no device path to open on a microcontroller.
        true
    }

    fn send(&mut self, bytes: &[u8]) {
        for &b in bytes {
            let _ = nb::block!(self.uart.write(b));
        }
        let _ = nb::block!(self.uart.flush());
    }

    fn read_byte(&mut self, out: &mut u8) -> bool {
        match self.uart.read() {
            Ok(b) => {
                *out = b;
                self.silence_ms = 0;
                true
            }
            Err(_) => false,
        }
    }

    fn transmitting(&self) -> bool {
        false
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }

    fn baud_rate_set(&mut self, baud: u32) {
        // Reconfiguring the UART's baud divider is peripheral-specific; a
        // board-support crate overrides this by wrapping `EmbeddedMstpUart`
        // rather than through this generic impl.
        self.baud = baud;
    }

    fn silence_ms(&self) -> u16 {
        self.silence_ms
    }

    fn silence_reset(&mut self) {
        self.silence_ms = 0;
    }
}

/// A byte-addressable NV store over a fixed-layout flash region: each
/// [`NvKey`] is assigned one length-prefixed [`SLOT_LEN`]-byte slot by
/// insertion order, recorded at construction time.
pub struct FlashNvStore<F> {
    flash: F,
    base_offset: u32,
    slots: Vec<NvKey>,
}

impl<F> FlashNvStore<F>
where
    F: ReadStorage<Error = ()> + Storage,
{
    /// `slots` fixes the key-to-offset mapping; callers must pass the same
    /// list (in the same order) across reboots; this crate keeps no table in
    /// flash itself.
    pub fn new(flash: F, base_offset: u32, slots: Vec<NvKey>) -> Self {
        FlashNvStore {
            flash,
            base_offset,
            slots,
        }
    }

    fn offset_for(&self, key: NvKey) -> Option<u32> {
        self.slots
            .iter()
            .position(|k| *k == key)
            .map(|i| self.base_offset + (i * SLOT_LEN) as u32)
    }
}

impl<F> NvStore for FlashNvStore<F>
where
    F: ReadStorage<Error = ()> + Storage,
{
    fn read(&self, key: NvKey) -> Option<Vec<u8>> {
        let offset = self.offset_for(key)?;
        let mut slot = vec![0u8; SLOT_LEN];
        self.flash.read(offset, &mut slot).ok()?;
        let len = slot[0] as usize;
        if len == 0 || len > SLOT_LEN - 1 {
            return None;
        }
        Some(slot[1..1 + len].to_vec())
    }

    fn write(&mut self, key: NvKey, value: &[u8]) -> Result<(), BacnetError> {
        if value.len() > SLOT_LEN - 1 {
            return Err(BacnetError::StorageError("value exceeds flash slot length"));
        }
        let offset = self
            .offset_for(key)
            .ok_or(BacnetError::StorageError("key has no reserved flash slot"))?;
        let mut slot = vec![0u8; SLOT_LEN];
        slot[0] = value.len() as u8;
        slot[1..1 + value.len()].copy_from_slice(value);
        self.flash
            .write(offset, &slot)
            .map_err(|_| BacnetError::StorageError("flash write failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    struct RamFlash {
        bytes: Vec<u8>,
    }

    impl ReadStorage for RamFlash {
        type Error = ();
        fn capacity(&self) -> usize {
            self.bytes.len()
        }
        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), ()> {
            let start = offset as usize;
            bytes.copy_from_slice(&self.bytes[start..start + bytes.len()]);
            Ok(())
        }
    }

    impl Storage for RamFlash {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), ()> {
            let start = offset as usize;
            self.bytes[start..start + bytes.len()].copy_from_slice(bytes);
            Ok(())
        }
    }

    #[test]
    fn write_then_read_round_trips_within_its_slot() {
        let flash = RamFlash {
            bytes: vec![0u8; SLOT_LEN * 2],
        };
        let mut store = FlashNvStore::new(flash, 0, vec![NvKey::Mac, NvKey::DeviceInstance]);
        store.write(NvKey::Mac, &[7]).unwrap();
        store.write(NvKey::DeviceInstance, &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.read(NvKey::Mac), Some(vec![7]));
        assert_eq!(store.read(NvKey::DeviceInstance), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn unreserved_key_is_rejected() {
        let flash = RamFlash {
            bytes: vec![0u8; SLOT_LEN],
        };
        let mut store = FlashNvStore::new(flash, 0, vec![NvKey::Mac]);
        assert!(store.write(NvKey::Uuid, &[1]).is_err());
    }

    #[test]
    fn oversized_value_is_rejected() {
        let flash = RamFlash {
            bytes: vec![0u8; SLOT_LEN],
        };
        let mut store = FlashNvStore::new(flash, 0, vec![NvKey::Mac]);
        let too_big = [0u8; SLOT_LEN];
        assert!(store.write(NvKey::Mac, &too_big).is_err());
    }
}
