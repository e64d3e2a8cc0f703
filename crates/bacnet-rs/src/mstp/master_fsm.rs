// crates/bacnet-rs/src/mstp/master_fsm.rs
//! Master-node token-passing state machine (Clause 9.6): IDLE, USE_TOKEN,
//! WAIT_FOR_REPLY, DONE_WITH_TOKEN, PASS_TOKEN, NO_TOKEN, POLL_FOR_MASTER,
//! ANSWER_DATA_REQUEST.
//!
//! Sits above [`super::receive_fsm::ReceiveFsm`]: that layer recovers frames from
//! the wire, this layer decides what a recovered frame means for bus ownership
//! and what to transmit next. A node that is never granted the token (a pure
//! slave) never runs this FSM; it only ever answers requests addressed to it,
//! which this crate's [`super::node::SlaveNode`] covers.

use super::frame::{FrameType, MstpFrame, BROADCAST_ADDRESS};
use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// Clause 9.6 token-passing constants.
pub const MAX_MASTER_DEFAULT: u8 = 127;
pub const MAX_INFO_FRAMES_DEFAULT: u8 = 1;
/// Number of consecutive missed polls before a silent node is dropped from the ring.
const POLL_ATTEMPTS_BEFORE_GIVING_UP: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterState {
    Initialize,
    Idle,
    UseToken,
    WaitForReply,
    DoneWithToken,
    PassToken,
    NoToken,
    PollForMaster,
    AnswerDataRequest,
}

/// What the node wants transmitted as a result of a state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum MasterAction {
    Send(MstpFrame),
    None,
}

pub struct MasterNodeFsm {
    pub this_station: u8,
    pub next_station: u8,
    pub poll_station: u8,
    max_master: u8,
    max_info_frames: u8,
    frames_sent_with_token: u8,
    poll_attempts: u8,
    state: MasterState,
    /// Application frames queued to send once the token is held.
    outbound: VecDeque<MstpFrame>,
}

impl MasterNodeFsm {
    pub fn new(this_station: u8, max_master: u8, max_info_frames: u8) -> Self {
        let next_station = if this_station == max_master {
            0
        } else {
            this_station + 1
        };
        MasterNodeFsm {
            this_station,
            next_station,
            poll_station: next_station,
            max_master,
            max_info_frames,
            frames_sent_with_token: 0,
            poll_attempts: 0,
            state: MasterState::Initialize,
            outbound: VecDeque::new(),
        }
    }

    pub fn state(&self) -> MasterState {
        self.state
    }

    /// Queues an application frame to be sent the next time this node holds the
    /// token. Frames already queued beyond `max_info_frames` simply wait their turn.
    pub fn queue_frame(&mut self, frame: MstpFrame) {
        self.outbound.push_back(frame);
    }

    /// Called once at startup: a node that has never seen traffic must first find
    /// its ring neighbor by claiming the token for itself.
    pub fn initialize(&mut self) -> MasterAction {
        self.state = MasterState::DoneWithToken;
        MasterAction::None
    }

    /// Drives the FSM with one received frame addressed to (or broadcast past) this
    /// station.
    pub fn on_frame(&mut self, frame: &MstpFrame) -> MasterAction {
        match frame.frame_type {
            FrameType::Token if frame.destination == self.this_station => self.use_token(),
            FrameType::PollForMaster if frame.destination == self.this_station => {
                MasterAction::Send(MstpFrame {
                    frame_type: FrameType::ReplyToPollForMaster,
                    destination: frame.source,
                    source: self.this_station,
                    data: Vec::new(),
                })
            }
            FrameType::ReplyToPollForMaster if self.state == MasterState::PollForMaster => {
                self.next_station = frame.source;
                self.poll_station = self.next_station;
                self.poll_attempts = 0;
                self.pass_token()
            }
            FrameType::BacnetDataExpectingReply | FrameType::BacnetDataNotExpectingReply
                if frame.destination == self.this_station
                    || frame.destination == BROADCAST_ADDRESS =>
            {
                self.state = MasterState::AnswerDataRequest;
                MasterAction::None
            }
            _ => MasterAction::None,
        }
    }

    fn use_token(&mut self) -> MasterAction {
        self.state = MasterState::UseToken;
        self.frames_sent_with_token = 0;
        self.send_next_queued_or_pass()
    }

    fn send_next_queued_or_pass(&mut self) -> MasterAction {
        if self.frames_sent_with_token < self.max_info_frames {
            if let Some(frame) = self.outbound.pop_front() {
                self.frames_sent_with_token += 1;
                self.state = if frame.frame_type == FrameType::BacnetDataExpectingReply {
                    MasterState::WaitForReply
                } else {
                    MasterState::UseToken
                };
                return MasterAction::Send(frame);
            }
        }
        self.done_with_token()
    }

    /// Called when a reply (or its absence, after timeout) ends the wait for a
    /// BACnet-Data-Expecting-Reply exchange.
    pub fn reply_timeout_or_received(&mut self) -> MasterAction {
        self.send_next_queued_or_pass()
    }

    fn done_with_token(&mut self) -> MasterAction {
        self.state = MasterState::DoneWithToken;
        if self.should_poll_for_master() {
            self.poll_for_master()
        } else {
            self.pass_token()
        }
    }

    fn should_poll_for_master(&self) -> bool {
        self.next_station == self.station_after(self.this_station)
    }

    fn station_after(&self, station: u8) -> u8 {
        if station == self.max_master {
            0
        } else {
            station + 1
        }
    }

    fn poll_for_master(&mut self) -> MasterAction {
        self.state = MasterState::PollForMaster;
        let target = self.station_after(self.poll_station.max(self.this_station));
        self.poll_station = target;
        self.poll_attempts += 1;
        MasterAction::Send(MstpFrame {
            frame_type: FrameType::PollForMaster,
            destination: target,
            source: self.this_station,
            data: Vec::new(),
        })
    }

    /// Called when a poll-for-master attempt times out with no reply: either keep
    /// searching or give up and pass the token to the next known-good station.
    pub fn poll_timeout(&mut self) -> MasterAction {
        if self.poll_attempts >= POLL_ATTEMPTS_BEFORE_GIVING_UP
            || self.poll_station == self.station_after(self.this_station)
        {
            self.next_station = self.station_after(self.this_station);
            self.poll_attempts = 0;
            self.pass_token()
        } else {
            self.poll_for_master()
        }
    }

    fn pass_token(&mut self) -> MasterAction {
        self.state = MasterState::PassToken;
        MasterAction::Send(MstpFrame {
            frame_type: FrameType::Token,
            destination: self.next_station,
            source: self.this_station,
            data: Vec::new(),
        })
    }

    /// Called once the Token/PassToken transmission has gone out.
    pub fn token_sent(&mut self) {
        self.state = MasterState::NoToken;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiving_token_with_no_queued_data_passes_it_on() {
        let mut fsm = MasterNodeFsm::new(1, 5, 1);
        let token = MstpFrame {
            frame_type: FrameType::Token,
            destination: 1,
            source: 0,
            data: Vec::new(),
        };
        let action = fsm.on_frame(&token);
        match action {
            MasterAction::Send(f) => {
                assert_eq!(f.frame_type, FrameType::Token);
                assert_eq!(f.destination, 2);
            }
            MasterAction::None => panic!("expected a pass-token send"),
        }
    }

    #[test]
    fn queued_frame_is_sent_before_passing_token() {
        let mut fsm = MasterNodeFsm::new(1, 5, 2);
        fsm.queue_frame(MstpFrame {
            frame_type: FrameType::BacnetDataNotExpectingReply,
            destination: 3,
            source: 1,
            data: alloc::vec![1, 2, 3],
        });
        let token = MstpFrame {
            frame_type: FrameType::Token,
            destination: 1,
            source: 0,
            data: Vec::new(),
        };
        match fsm.on_frame(&token) {
            MasterAction::Send(f) => assert_eq!(f.frame_type, FrameType::BacnetDataNotExpectingReply),
            MasterAction::None => panic!("expected queued data frame"),
        }
    }

    #[test]
    fn poll_for_master_reply_updates_next_station() {
        let mut fsm = MasterNodeFsm::new(1, 10, 1);
        fsm.state = MasterState::PollForMaster;
        let reply = MstpFrame {
            frame_type: FrameType::ReplyToPollForMaster,
            destination: 1,
            source: 4,
            data: Vec::new(),
        };
        match fsm.on_frame(&reply) {
            MasterAction::Send(f) => {
                assert_eq!(f.frame_type, FrameType::Token);
                assert_eq!(f.destination, 4);
            }
            MasterAction::None => panic!("expected pass-token to new neighbor"),
        }
        assert_eq!(fsm.next_station, 4);
    }

    #[test]
    fn poll_for_master_is_addressed_to_next_candidate_and_wraps_at_max_master() {
        let mut fsm = MasterNodeFsm::new(10, 10, 1);
        fsm.next_station = 0;
        fsm.poll_station = 0;
        match fsm.done_with_token() {
            MasterAction::Send(f) => assert_eq!(f.frame_type, FrameType::PollForMaster),
            MasterAction::None => panic!("expected poll-for-master"),
        }
    }
}
