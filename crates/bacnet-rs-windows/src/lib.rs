// crates/bacnet-rs-windows/src/lib.rs
#![cfg(target_os = "windows")]
//! Windows drivers. Thinner than the Linux collaborator: BACnet/IP over a UDP
//! socket and MS/TP over a COM-port serial link, with no raw-Ethernet data
//! link and no NV-store backend (Windows deployments of this stack are
//! expected to persist configuration through their own installer/registry
//! conventions rather than this crate's).

use bacnet_rs::hal::{BacnetError, DataLink, MstpUart};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// A BACnet/IP port bound to one UDP socket, addressed exactly like its Linux
/// counterpart (see `bacnet-rs-linux::BacnetIpLink`): every send goes to this
/// port's configured broadcast address.
pub struct BacnetIpLink {
    socket: UdpSocket,
    broadcast_addr: SocketAddr,
    mac: [u8; 6],
}

impl BacnetIpLink {
    pub fn bind(bind_addr: &str, broadcast_addr: &str) -> Result<Self, BacnetError> {
        let socket = UdpSocket::bind(bind_addr).map_err(|_| BacnetError::IoError)?;
        socket.set_broadcast(true).map_err(|_| BacnetError::IoError)?;
        socket
            .set_read_timeout(Some(Duration::from_millis(100)))
            .map_err(|_| BacnetError::IoError)?;
        let broadcast_addr: SocketAddr = broadcast_addr
            .parse()
            .map_err(|_| BacnetError::InvalidValue)?;
        let local = socket.local_addr().map_err(|_| BacnetError::IoError)?;
        let mac = ip_port_to_mac(local);
        Ok(Self {
            socket,
            broadcast_addr,
            mac,
        })
    }
}

fn ip_port_to_mac(addr: SocketAddr) -> [u8; 6] {
    let ip = match addr.ip() {
        std::net::IpAddr::V4(v4) => v4.octets(),
        std::net::IpAddr::V6(_) => [0, 0, 0, 0],
    };
    let port = addr.port();
    [ip[0], ip[1], ip[2], ip[3], (port >> 8) as u8, (port & 0xFF) as u8]
}

impl DataLink for BacnetIpLink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), BacnetError> {
        self.socket
            .send_to(frame, self.broadcast_addr)
            .map_err(|_| BacnetError::IoError)?;
        Ok(())
    }

    fn receive_frame(&mut self, buffer: &mut [u8]) -> Result<usize, BacnetError> {
        match self.socket.recv_from(buffer) {
            Ok((n, _)) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {
                Ok(0)
            }
            Err(_) => Err(BacnetError::IoError),
        }
    }

    fn local_mac(&self) -> &[u8] {
        &self.mac
    }
}

/// MS/TP over a Windows COM-port serial link (e.g. `"COM3"`), implementing the
/// same byte-oriented contract as the Linux driver's `SerialMstpUart`.
pub struct SerialMstpUart {
    port: Option<Box<dyn serialport::SerialPort>>,
    baud: u32,
    last_activity: Instant,
}

impl SerialMstpUart {
    pub fn new(baud: u32) -> Self {
        SerialMstpUart {
            port: None,
            baud,
            last_activity: Instant::now(),
        }
    }
}

impl MstpUart for SerialMstpUart {
    fn init(&mut self, iface: &str) -> bool {
        match serialport::new(iface, self.baud)
            .timeout(Duration::from_millis(5))
            .open()
        {
            Ok(port) => {
                self.port = Some(port);
                self.last_activity = Instant::now();
                true
            }
            Err(_) => false,
        }
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Some(port) = self.port.as_mut() {
            let _ = port.write_all(bytes);
        }
    }

    fn read_byte(&mut self, out: &mut u8) -> bool {
        let Some(port) = self.port.as_mut() else {
            return false;
        };
        let mut buf = [0u8; 1];
        match port.read(&mut buf) {
            Ok(1) => {
                *out = buf[0];
                self.last_activity = Instant::now();
                true
            }
            _ => false,
        }
    }

    fn transmitting(&self) -> bool {
        false
    }

    fn baud_rate(&self) -> u32 {
        self.baud
    }

    fn baud_rate_set(&mut self, baud: u32) {
        self.baud = baud;
        if let Some(port) = self.port.as_mut() {
            let _ = port.set_baud_rate(baud);
        }
    }

    fn silence_ms(&self) -> u16 {
        self.last_activity.elapsed().as_millis().min(u16::MAX as u128) as u16
    }

    fn silence_reset(&mut self) {
        self.last_activity = Instant::now();
    }
}
