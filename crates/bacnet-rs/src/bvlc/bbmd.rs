// crates/bacnet-rs/src/bvlc/bbmd.rs
//! BACnet Broadcast Management Device tables and forwarding logic (Annex J.4-J.5).
//!
//! A BBMD has two collaborators it distributes local broadcasts to: its
//! Broadcast Distribution Table (other BBMDs, one per IP subnet) and its Foreign
//! Device Table (remote devices registered for this subnet's broadcast traffic).
//! This module holds both tables and the pure decision logic for what to
//! forward where; the actual socket send is the caller's (`bacnet-rs-linux`'s)
//! job, kept out of this `no_std` core.

use alloc::vec::Vec;

/// An IPv4 endpoint: 4-byte address plus 2-byte UDP port, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IpEndpoint {
    pub addr: [u8; 4],
    pub port: u16,
}

/// One Broadcast Distribution Table entry (Annex J.4.1): a peer BBMD plus the
/// broadcast distribution mask describing which of its subnet's addresses are
/// reachable (all-ones for a directed broadcast to the whole subnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BdtEntry {
    pub peer: IpEndpoint,
    pub broadcast_mask: [u8; 4],
}

/// One Foreign Device Table entry (Annex J.5.1): a registered remote device, its
/// requested time-to-live, and the seconds remaining before the registration
/// lapses (Annex J.5.2.3's two-lease-periods grace window already folded in by
/// the caller when registering).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdtEntry {
    pub device: IpEndpoint,
    pub time_to_live_seconds: u16,
    pub seconds_remaining: u16,
}

#[derive(Default)]
pub struct BroadcastDistributionTable {
    entries: Vec<BdtEntry>,
}

impl BroadcastDistributionTable {
    pub fn new() -> Self {
        BroadcastDistributionTable { entries: Vec::new() }
    }

    pub fn set(&mut self, entries: Vec<BdtEntry>) {
        self.entries = entries;
    }

    pub fn entries(&self) -> &[BdtEntry] {
        &self.entries
    }

    /// Peers to forward a local broadcast to: every BDT entry other than this
    /// BBMD's own, per Annex J.4.3.1 (the own-entry case instead triggers a local
    /// broadcast, handled by the caller).
    pub fn forward_targets(&self, own: IpEndpoint) -> impl Iterator<Item = &BdtEntry> {
        self.entries.iter().filter(move |e| e.peer != own)
    }
}

#[derive(Default)]
pub struct ForeignDeviceTable {
    entries: Vec<FdtEntry>,
}

impl ForeignDeviceTable {
    pub fn new() -> Self {
        ForeignDeviceTable { entries: Vec::new() }
    }

    /// Registers or refreshes a foreign device (Annex J.5.2.3). The lease grace
    /// period (+30s) matches the two-lease-window slack real implementations use
    /// to tolerate network jitter around the renewal boundary.
    pub fn register(&mut self, device: IpEndpoint, time_to_live_seconds: u16) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.device == device) {
            existing.time_to_live_seconds = time_to_live_seconds;
            existing.seconds_remaining = time_to_live_seconds.saturating_add(30);
            return;
        }
        self.entries.push(FdtEntry {
            device,
            time_to_live_seconds,
            seconds_remaining: time_to_live_seconds.saturating_add(30),
        });
    }

    pub fn delete(&mut self, device: IpEndpoint) {
        self.entries.retain(|e| e.device != device);
    }

    pub fn entries(&self) -> &[FdtEntry] {
        &self.entries
    }

    /// Advances every entry's remaining lease time, dropping any that have
    /// expired. Call once per elapsed second.
    pub fn tick(&mut self, elapsed_seconds: u16) {
        for entry in self.entries.iter_mut() {
            entry.seconds_remaining = entry.seconds_remaining.saturating_sub(elapsed_seconds);
        }
        self.entries.retain(|e| e.seconds_remaining > 0);
    }
}

/// Broadcast distribution decisions for one BBMD (Annex J.4.3).
pub struct Bbmd {
    pub local: IpEndpoint,
    pub bdt: BroadcastDistributionTable,
    pub fdt: ForeignDeviceTable,
}

impl Bbmd {
    pub fn new(local: IpEndpoint) -> Self {
        Bbmd {
            local,
            bdt: BroadcastDistributionTable::new(),
            fdt: ForeignDeviceTable::new(),
        }
    }

    /// Given a broadcast NPDU originated locally (an Original-Broadcast-NPDU
    /// received from this BBMD's own BACnet/IP port), returns every endpoint the
    /// equivalent Forwarded-NPDU must be unicast to: each other BDT peer plus
    /// every registered foreign device. The caller still delivers the original
    /// broadcast onto its own local subnet directly.
    pub fn distribute_targets(&self) -> Vec<IpEndpoint> {
        let mut targets: Vec<IpEndpoint> = self
            .bdt
            .forward_targets(self.local)
            .map(|e| e.peer)
            .collect();
        targets.extend(self.fdt.entries().iter().map(|e| e.device));
        targets
    }

    /// Given a Forwarded-NPDU received from another BBMD (`origin`), returns the
    /// foreign devices it must additionally be relayed to (Annex J.4.3.2: a BBMD
    /// that receives a Forwarded-NPDU redistributes it to its own FDT, but never
    /// back out to other BDT peers, to avoid forwarding loops).
    pub fn relay_targets_for_forwarded_npdu(&self, _origin: IpEndpoint) -> Vec<IpEndpoint> {
        self.fdt.entries().iter().map(|e| e.device).collect()
    }
}
