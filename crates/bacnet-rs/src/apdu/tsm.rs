// crates/bacnet-rs/src/apdu/tsm.rs
//! Transaction State Machine: tracks in-flight confirmed requests by invoke ID and
//! drives their retry/timeout behavior (§4.2, §5, Clause 5.4).
//!
//! Bounded by `capacity` slots (`TsmExhausted` when full), matching the bounded,
//! allocation-aware posture the rest of this crate takes toward in-flight state.

use crate::common::Address;
use crate::hal::BacnetError;
use alloc::vec::Vec;

/// An in-flight confirmed request awaiting an ACK, Error, Reject or Abort.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub invoke_id: u8,
    pub destination: Address,
    /// The fully encoded APDU, retained so it can be retransmitted unchanged.
    pub apdu: Vec<u8>,
    pub retries_remaining: u8,
    pub timeout_ms: u32,
    elapsed_ms: u32,
}

/// What a call to [`Tsm::tick`] asks the caller to do with one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsmEvent {
    /// Retransmit `invoke_id`'s APDU to `destination`; the timer has been reset.
    Retransmit { invoke_id: u8, destination: Address },
    /// `invoke_id` exhausted its retries; the transaction has been removed.
    Exhausted { invoke_id: u8 },
}

pub struct Tsm {
    capacity: usize,
    transactions: Vec<Transaction>,
    next_invoke_id: u8,
}

impl Tsm {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transactions: Vec::new(),
            next_invoke_id: 0,
        }
    }

    fn allocate_invoke_id(&mut self) -> u8 {
        let id = self.next_invoke_id;
        self.next_invoke_id = self.next_invoke_id.wrapping_add(1);
        id
    }

    /// Registers a new outstanding request. Returns its invoke ID, or
    /// `TsmExhausted` if every slot is in use.
    pub fn begin(
        &mut self,
        destination: Address,
        apdu: Vec<u8>,
        timeout_ms: u32,
        retries: u8,
    ) -> Result<u8, BacnetError> {
        if self.transactions.len() >= self.capacity {
            return Err(BacnetError::TsmExhausted);
        }
        let invoke_id = self.allocate_invoke_id();
        self.transactions.push(Transaction {
            invoke_id,
            destination,
            apdu,
            retries_remaining: retries,
            timeout_ms,
            elapsed_ms: 0,
        });
        Ok(invoke_id)
    }

    /// A reply arrived for `invoke_id`: remove and return its transaction.
    pub fn complete(&mut self, invoke_id: u8) -> Option<Transaction> {
        let idx = self
            .transactions
            .iter()
            .position(|t| t.invoke_id == invoke_id)?;
        Some(self.transactions.remove(idx))
    }

    pub fn is_outstanding(&self, invoke_id: u8) -> bool {
        self.transactions.iter().any(|t| t.invoke_id == invoke_id)
    }

    pub fn outstanding_count(&self) -> usize {
        self.transactions.len()
    }

    /// Advances every transaction's timer by `delta_ms`, retransmitting timed-out
    /// ones with retries remaining and dropping those that have exhausted theirs.
    pub fn tick(&mut self, delta_ms: u32) -> Vec<TsmEvent> {
        let mut events = Vec::new();
        let mut exhausted = Vec::new();

        for t in self.transactions.iter_mut() {
            t.elapsed_ms += delta_ms;
            if t.elapsed_ms < t.timeout_ms {
                continue;
            }
            t.elapsed_ms = 0;
            if t.retries_remaining == 0 {
                exhausted.push(t.invoke_id);
            } else {
                t.retries_remaining -= 1;
                events.push(TsmEvent::Retransmit {
                    invoke_id: t.invoke_id,
                    destination: t.destination,
                });
            }
        }

        for invoke_id in exhausted {
            self.complete(invoke_id);
            events.push(TsmEvent::Exhausted { invoke_id });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn dest() -> Address {
        Address::local(&[1])
    }

    #[test]
    fn begin_assigns_increasing_invoke_ids() {
        let mut tsm = Tsm::new(4);
        let a = tsm.begin(dest(), vec![1], 1000, 2).unwrap();
        let b = tsm.begin(dest(), vec![2], 1000, 2).unwrap();
        assert_eq!(b, a.wrapping_add(1));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut tsm = Tsm::new(1);
        tsm.begin(dest(), vec![1], 1000, 0).unwrap();
        assert_eq!(
            tsm.begin(dest(), vec![2], 1000, 0),
            Err(BacnetError::TsmExhausted)
        );
    }

    #[test]
    fn complete_removes_and_frees_a_slot() {
        let mut tsm = Tsm::new(1);
        let id = tsm.begin(dest(), vec![1], 1000, 0).unwrap();
        assert!(tsm.complete(id).is_some());
        assert!(tsm.begin(dest(), vec![2], 1000, 0).is_ok());
    }

    #[test]
    fn tick_retransmits_then_eventually_reports_exhausted() {
        let mut tsm = Tsm::new(1);
        let id = tsm.begin(dest(), vec![9], 100, 1).unwrap();

        let events = tsm.tick(100);
        assert_eq!(
            events,
            vec![TsmEvent::Retransmit {
                invoke_id: id,
                destination: dest()
            }]
        );
        assert!(tsm.is_outstanding(id));

        let events = tsm.tick(100);
        assert_eq!(events, vec![TsmEvent::Exhausted { invoke_id: id }]);
        assert!(!tsm.is_outstanding(id));
    }

    #[test]
    fn tick_before_timeout_produces_no_events() {
        let mut tsm = Tsm::new(1);
        tsm.begin(dest(), vec![1], 1000, 2).unwrap();
        assert!(tsm.tick(500).is_empty());
    }
}
