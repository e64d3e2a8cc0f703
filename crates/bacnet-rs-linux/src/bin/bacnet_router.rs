// crates/bacnet-rs-linux/src/bin/bacnet_router.rs
//! `bacnet-router`: hosts one collaborator thread per configured port and
//! bridges NPDUs between them through [`bacnet_rs::router::Router`] (§4.8).
//!
//! Port descriptors are given as positional arguments:
//!
//! ```text
//! --bip:<iface>:<port>
//! --mstp:<iface>:<baud>:<parity>:<databits>:<stopbits>:<max_master>:<max_info_frames>:<mac>
//! ```
//!
//! Exit codes: `0` clean shutdown, `1` a port failed to initialize, `2` the
//! arguments themselves were invalid.

use bacnet_rs::bvlc::{decode_bvlc, encode_bvlc, BvlcFrame, BvlcFunction};
use bacnet_rs::hal::{DataLink, MstpUart};
use bacnet_rs::mstp::{self, FrameType, MasterAction, MasterNodeFsm, MstpFrame, ReceiveEvent, ReceiveFsm};
use bacnet_rs::router::{PortInfo, Router, RouterAction};
use bacnet_rs_linux::{BacnetIpLink, SerialMstpUart};
use std::env;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

/// Depth of each port's egress mailbox (§4.8: bounded, drop-on-full rather than
/// block the router thread indefinitely).
const MAILBOX_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
#[allow(dead_code)]
enum PortDescriptor {
    Bip {
        iface: String,
        port: u16,
    },
    Mstp {
        iface: String,
        baud: u32,
        // Parsed and validated but not yet wired into `SerialMstpUart::init`,
        // which currently only configures the baud rate.
        parity: String,
        data_bits: u8,
        stop_bits: u8,
        max_master: u8,
        max_info_frames: u8,
        mac: u8,
    },
}

const USAGE: &str = "usage: bacnet-router (--bip:<iface>:<port> | --mstp:<iface>:<baud>:<parity>:<databits>:<stopbits>:<max_master>:<max_info_frames>:<mac>)+";

/// Splits one `--bip:...`/`--mstp:...` argument into its colon-separated
/// fields. Deliberately not a general-purpose argument parser: the grammar is
/// small and fixed, so a hand-rolled split is clearer than pulling in a
/// framework for nine fields.
fn parse_descriptor(arg: &str) -> Result<PortDescriptor, String> {
    if let Some(rest) = arg.strip_prefix("--bip:") {
        let fields: Vec<&str> = rest.split(':').collect();
        let [iface, port] = fields.as_slice() else {
            return Err(format!("--bip: expects <iface>:<port>, got '{rest}'"));
        };
        let port: u16 = port.parse().map_err(|_| format!("invalid port '{port}'"))?;
        Ok(PortDescriptor::Bip {
            iface: (*iface).to_string(),
            port,
        })
    } else if let Some(rest) = arg.strip_prefix("--mstp:") {
        let fields: Vec<&str> = rest.split(':').collect();
        let [iface, baud, parity, data_bits, stop_bits, max_master, max_info_frames, mac] = fields.as_slice()
        else {
            return Err(format!(
                "--mstp: expects <iface>:<baud>:<parity>:<databits>:<stopbits>:<max_master>:<max_info_frames>:<mac>, got '{rest}'"
            ));
        };
        Ok(PortDescriptor::Mstp {
            iface: (*iface).to_string(),
            baud: baud.parse().map_err(|_| format!("invalid baud '{baud}'"))?,
            parity: (*parity).to_string(),
            data_bits: data_bits
                .parse()
                .map_err(|_| format!("invalid data bits '{data_bits}'"))?,
            stop_bits: stop_bits
                .parse()
                .map_err(|_| format!("invalid stop bits '{stop_bits}'"))?,
            max_master: max_master
                .parse()
                .map_err(|_| format!("invalid max_master '{max_master}'"))?,
            max_info_frames: max_info_frames
                .parse()
                .map_err(|_| format!("invalid max_info_frames '{max_info_frames}'"))?,
            mac: mac.parse().map_err(|_| format!("invalid mac '{mac}'"))?,
        })
    } else {
        Err(format!("unrecognized argument '{arg}' (expected --bip: or --mstp:)"))
    }
}

fn parse_args(args: &[String]) -> Result<Vec<PortDescriptor>, String> {
    if args.is_empty() {
        return Err(USAGE.to_string());
    }
    args.iter().map(|a| parse_descriptor(a)).collect()
}

/// One message a port collaborator hands to the router main loop (§4.8).
enum RouterEvent {
    Inbound { port_id: u8, bytes: Vec<u8> },
    InitFailed { port_id: u8 },
}

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let descriptors = match parse_args(&args) {
        Ok(d) => d,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let (ingress_tx, ingress_rx) = mpsc::channel::<RouterEvent>();
    let mut ports = Vec::new();
    let mut egress_senders = Vec::new();
    let mut handles = Vec::new();

    for (idx, desc) in descriptors.into_iter().enumerate() {
        let port_id = idx as u8;
        // Each configured port is treated as its own directly attached network,
        // numbered by position; a real deployment would take this from its own
        // configuration rather than the CLI's flat port-descriptor grammar.
        ports.push(PortInfo {
            id: port_id,
            network: port_id as u16 + 1,
        });
        let (egress_tx, egress_rx) = mpsc::sync_channel::<Vec<u8>>(MAILBOX_CAPACITY);
        egress_senders.push(egress_tx);
        let ingress_tx = ingress_tx.clone();
        handles.push(match desc {
            PortDescriptor::Bip { iface, port } => {
                thread::spawn(move || run_bip_port(port_id, iface, port, ingress_tx, egress_rx))
            }
            PortDescriptor::Mstp {
                iface,
                baud,
                max_master,
                max_info_frames,
                mac,
                ..
            } => thread::spawn(move || {
                run_mstp_port(port_id, iface, baud, max_master, max_info_frames, mac, ingress_tx, egress_rx)
            }),
        });
    }
    drop(ingress_tx);

    let mut router = Router::new(ports, MAILBOX_CAPACITY);
    let mut init_failed = false;

    for event in ingress_rx {
        match event {
            RouterEvent::InitFailed { port_id } => {
                log::error!("port {port_id} failed to initialize");
                init_failed = true;
            }
            RouterEvent::Inbound { port_id, bytes } => {
                let actions = match router.handle_inbound(port_id, &bytes) {
                    Ok(actions) => actions,
                    Err(e) => {
                        log::warn!("port {port_id}: dropping malformed NPDU: {e}");
                        continue;
                    }
                };
                for action in actions {
                    apply_action(&egress_senders, action);
                }
            }
        }
    }

    for h in handles {
        let _ = h.join();
    }

    if init_failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn apply_action(egress_senders: &[SyncSender<Vec<u8>>], action: RouterAction) {
    match action {
        RouterAction::Deliver { arrival_port, apdu } => {
            log::debug!("port {arrival_port}: {} octet APDU for the local application layer", apdu.len());
        }
        RouterAction::SendOn { port_id, frame } => {
            if let Some(tx) = egress_senders.get(port_id as usize) {
                match tx.try_send(frame) {
                    Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                    Err(TrySendError::Full(_)) => log::warn!("port {port_id}: egress mailbox full, dropping frame"),
                }
            }
        }
        RouterAction::DiscoverRoute { network } => {
            log::debug!("no route to network {network}; a Who-Is-Router-To-Network would be broadcast here");
        }
    }
}

fn run_bip_port(port_id: u8, iface: String, port: u16, ingress_tx: Sender<RouterEvent>, egress_rx: Receiver<Vec<u8>>) {
    let bind_addr = format!("{iface}:{port}");
    let broadcast_addr = broadcast_address_for(&iface, port);
    let mut link = match BacnetIpLink::bind(&bind_addr, &broadcast_addr) {
        Ok(link) => link,
        Err(e) => {
            log::error!("port {port_id}: failed to bind BACnet/IP socket on {bind_addr}: {e}");
            let _ = ingress_tx.send(RouterEvent::InitFailed { port_id });
            return;
        }
    };
    log::info!("port {port_id}: BACnet/IP on {bind_addr}, broadcasting to {broadcast_addr}");

    loop {
        while let Ok(npdu) = egress_rx.try_recv() {
            let mut buf = [0u8; 1500];
            let bvlc = BvlcFrame {
                function: BvlcFunction::OriginalBroadcastNpdu,
                body: npdu,
            };
            match encode_bvlc(&mut buf, &bvlc) {
                Ok(n) => {
                    if let Err(e) = link.send_frame(&buf[..n]) {
                        log::warn!("port {port_id}: send failed: {e}");
                    }
                }
                Err(e) => log::warn!("port {port_id}: failed to encode BVLC frame: {e}"),
            }
        }

        let mut buf = [0u8; 1500];
        match link.receive_frame(&mut buf) {
            Ok(0) => {}
            Ok(n) => match decode_bvlc(&buf[..n]) {
                Ok(bvlc) => match bvlc.function {
                    BvlcFunction::OriginalUnicastNpdu | BvlcFunction::OriginalBroadcastNpdu => {
                        if ingress_tx
                            .send(RouterEvent::Inbound { port_id, bytes: bvlc.body })
                            .is_err()
                        {
                            return;
                        }
                    }
                    other => log::debug!("port {port_id}: ignoring unsupported BVLC function {other:?}"),
                },
                Err(e) => log::warn!("port {port_id}: failed to decode BVLC header: {e}"),
            },
            Err(e) => log::warn!("port {port_id}: receive failed: {e}"),
        }
    }
}

/// Derives a /24 broadcast address from `iface`'s own dotted-quad address.
/// A simplification: deriving the real subnet broadcast address requires
/// querying the interface's netmask, which this driver deliberately doesn't do.
fn broadcast_address_for(iface: &str, port: u16) -> String {
    let mut octets: Vec<&str> = iface.split('.').collect();
    if octets.len() == 4 {
        octets[3] = "255";
        format!("{}:{port}", octets.join("."))
    } else {
        format!("255.255.255.255:{port}")
    }
}

fn run_mstp_port(
    port_id: u8,
    iface: String,
    baud: u32,
    max_master: u8,
    max_info_frames: u8,
    mac: u8,
    ingress_tx: Sender<RouterEvent>,
    egress_rx: Receiver<Vec<u8>>,
) {
    let mut uart = SerialMstpUart::new(baud);
    if !uart.init(&iface) {
        log::error!("port {port_id}: failed to open MS/TP serial port {iface}");
        let _ = ingress_tx.send(RouterEvent::InitFailed { port_id });
        return;
    }
    log::info!("port {port_id}: MS/TP on {iface} at {baud} baud, this_station={mac}");

    let mut receive_fsm = ReceiveFsm::new();
    let mut master = MasterNodeFsm::new(mac, max_master, max_info_frames);
    master.initialize();

    loop {
        while let Ok(npdu) = egress_rx.try_recv() {
            master.queue_frame(MstpFrame {
                frame_type: FrameType::BacnetDataNotExpectingReply,
                destination: mstp::frame::BROADCAST_ADDRESS,
                source: mac,
                data: npdu,
            });
        }

        if let Some(event) = mstp::poll(&mut receive_fsm, &mut uart) {
            let action = match event {
                ReceiveEvent::Frame(frame) => {
                    if frame.frame_type == FrameType::BacnetDataNotExpectingReply
                        || frame.frame_type == FrameType::BacnetDataExpectingReply
                    {
                        if frame.destination == mac || frame.destination == mstp::frame::BROADCAST_ADDRESS {
                            if ingress_tx
                                .send(RouterEvent::Inbound { port_id, bytes: frame.data.clone() })
                                .is_err()
                            {
                                return;
                            }
                        }
                    }
                    master.on_frame(&frame)
                }
                ReceiveEvent::Error => MasterAction::None,
            };
            transmit(&mut uart, &mut master, action);
        }
    }
}

fn transmit(uart: &mut SerialMstpUart, master: &mut MasterNodeFsm, action: MasterAction) {
    if let MasterAction::Send(frame) = action {
        let is_token_pass = frame.frame_type == FrameType::Token;
        let mut buf = [0u8; 8 + mstp::frame::MAX_FRAME_DATA_LEN + 2];
        match mstp::frame::encode_frame(&mut buf, &frame) {
            Ok(n) => {
                uart.send(&buf[..n]);
                if is_token_pass {
                    master.token_sent();
                }
            }
            Err(e) => log::warn!("failed to encode outgoing MS/TP frame: {e}"),
        }
    }
}
