// crates/bacnet-rs/src/object/priority_array.rs
//! The 16-level Priority_Array commandable-value algorithm (§4.4, Clause 19.2).
//!
//! A commandable property (e.g. Present_Value on an Analog_Output) is backed by
//! sixteen priority slots, numbered 1 (highest) through 16 (lowest), plus a
//! Relinquish_Default that applies when every slot is empty. `Priority_6` is
//! reserved by the standard for the minimum-on/minimum-off life-safety algorithm;
//! this generic array does not special-case it; callers that need that behavior
//! build it on top.

use crate::hal::BacnetError;

pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 16;
const SLOT_COUNT: usize = 16;

#[derive(Debug, Clone)]
pub struct PriorityArray<T: Copy> {
    slots: [Option<T>; SLOT_COUNT],
    relinquish_default: T,
}

impl<T: Copy> PriorityArray<T> {
    pub fn new(relinquish_default: T) -> Self {
        Self {
            slots: [None; SLOT_COUNT],
            relinquish_default,
        }
    }

    fn slot_index(priority: u8) -> Result<usize, BacnetError> {
        if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
            return Err(BacnetError::InvalidValue);
        }
        Ok((priority - 1) as usize)
    }

    /// Commands `value` at `priority`, or relinquishes that slot if `value` is `None`.
    pub fn write(&mut self, priority: u8, value: Option<T>) -> Result<(), BacnetError> {
        let idx = Self::slot_index(priority)?;
        self.slots[idx] = value;
        Ok(())
    }

    pub fn relinquish(&mut self, priority: u8) -> Result<(), BacnetError> {
        self.write(priority, None)
    }

    pub fn set_relinquish_default(&mut self, value: T) {
        self.relinquish_default = value;
    }

    pub fn relinquish_default(&self) -> T {
        self.relinquish_default
    }

    /// The effective value: the occupied slot with the lowest (most urgent) priority
    /// number, falling back to Relinquish_Default when every slot is empty.
    pub fn present_value(&self) -> T {
        self.slots
            .iter()
            .find_map(|s| *s)
            .unwrap_or(self.relinquish_default)
    }

    /// Which priority currently governs Present_Value, if any slot is occupied.
    pub fn active_priority(&self) -> Option<u8> {
        self.slots
            .iter()
            .position(|s| s.is_some())
            .map(|idx| (idx + 1) as u8)
    }

    pub fn at(&self, priority: u8) -> Result<Option<T>, BacnetError> {
        Ok(self.slots[Self::slot_index(priority)?])
    }

    pub fn is_relinquished_at(&self, priority: u8) -> Result<bool, BacnetError> {
        Ok(self.at(priority)?.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_array_reports_relinquish_default() {
        let arr: PriorityArray<f32> = PriorityArray::new(0.0);
        assert_eq!(arr.present_value(), 0.0);
        assert_eq!(arr.active_priority(), None);
    }

    #[test]
    fn higher_priority_number_loses_to_lower() {
        let mut arr: PriorityArray<f32> = PriorityArray::new(0.0);
        arr.write(16, Some(10.0)).unwrap();
        arr.write(8, Some(20.0)).unwrap();
        assert_eq!(arr.present_value(), 20.0);
        assert_eq!(arr.active_priority(), Some(8));

        arr.write(1, Some(99.0)).unwrap();
        assert_eq!(arr.present_value(), 99.0);
        assert_eq!(arr.active_priority(), Some(1));
    }

    #[test]
    fn relinquishing_falls_through_to_next_occupied_slot() {
        let mut arr: PriorityArray<f32> = PriorityArray::new(0.0);
        arr.write(8, Some(20.0)).unwrap();
        arr.write(1, Some(99.0)).unwrap();
        arr.relinquish(1).unwrap();
        assert_eq!(arr.present_value(), 20.0);
        arr.relinquish(8).unwrap();
        assert_eq!(arr.present_value(), 0.0);
    }

    #[test]
    fn out_of_range_priority_is_rejected() {
        let mut arr: PriorityArray<f32> = PriorityArray::new(0.0);
        assert_eq!(arr.write(0, Some(1.0)), Err(BacnetError::InvalidValue));
        assert_eq!(arr.write(17, Some(1.0)), Err(BacnetError::InvalidValue));
    }

    #[test]
    fn relinquish_default_can_be_updated() {
        let mut arr: PriorityArray<bool> = PriorityArray::new(false);
        arr.set_relinquish_default(true);
        assert_eq!(arr.present_value(), true);
    }
}
