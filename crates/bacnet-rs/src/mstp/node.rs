// crates/bacnet-rs/src/mstp/node.rs
//! Slave-node behavior (Clause 9.6 note 3): a node that never claims the token,
//! only answers Poll-For-Master and frames addressed directly to it.

use super::frame::{FrameType, MstpFrame};
use alloc::vec::Vec;

pub struct SlaveNode {
    pub this_station: u8,
}

impl SlaveNode {
    pub fn new(this_station: u8) -> Self {
        SlaveNode { this_station }
    }

    /// Reacts to one received frame; `None` means the frame required no reply.
    pub fn on_frame(&mut self, frame: &MstpFrame) -> Option<MstpFrame> {
        match frame.frame_type {
            FrameType::PollForMaster if frame.destination == self.this_station => {
                Some(MstpFrame {
                    frame_type: FrameType::ReplyToPollForMaster,
                    destination: frame.source,
                    source: self.this_station,
                    data: Vec::new(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slave_replies_to_poll_for_master_addressed_to_it() {
        let mut node = SlaveNode::new(7);
        let poll = MstpFrame {
            frame_type: FrameType::PollForMaster,
            destination: 7,
            source: 1,
            data: Vec::new(),
        };
        let reply = node.on_frame(&poll).unwrap();
        assert_eq!(reply.frame_type, FrameType::ReplyToPollForMaster);
        assert_eq!(reply.destination, 1);
        assert_eq!(reply.source, 7);
    }

    #[test]
    fn slave_ignores_poll_for_master_addressed_elsewhere() {
        let mut node = SlaveNode::new(7);
        let poll = MstpFrame {
            frame_type: FrameType::PollForMaster,
            destination: 8,
            source: 1,
            data: Vec::new(),
        };
        assert!(node.on_frame(&poll).is_none());
    }
}
