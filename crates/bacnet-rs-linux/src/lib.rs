// crates/bacnet-rs-linux/src/lib.rs
#![cfg(target_os = "linux")]
//! Linux drivers for the two data links this stack targets: BACnet/IP over a
//! UDP socket and MS/TP over an RS-485 serial port, plus a file-backed
//! [`NvStore`]. These are the platform-specific collaborators the `no_std`
//! core (§1 out-of-scope: "physical transport and persistence") never touches
//! directly.

use bacnet_rs::hal::{BacnetError, DataLink, MstpUart, NvKey, NvStore};
use std::fs;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// A BACnet/IP port bound to one UDP socket. Every send goes out to this
/// port's configured broadcast address: the constrained `DataLink::send_frame`
/// signature carries no per-call destination (mirroring how a raw-Ethernet
/// frame already carries its destination MAC in its own bytes), so unicast
/// addressing for BACnet/IP happens one layer up, at the BVLC
/// Original-Unicast-NPDU vs Original-Broadcast-NPDU distinction, while this
/// driver always hands the datagram to the kernel addressed at the subnet
/// broadcast address.
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

/// MS/TP over an RS-485 serial port, implementing the byte-oriented contract
/// [`bacnet_rs::mstp::receive_fsm`] drives.
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

/// A byte-addressable NV store backed by one file per key under `dir`.
pub struct FileNvStore {
    dir: PathBuf,
}

impl FileNvStore {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileNvStore { dir })
    }

    fn path_for(&self, key: NvKey) -> PathBuf {
        let name = match key {
            NvKey::Mac => "mac".to_string(),
            NvKey::MaxMaster => "max_master".to_string(),
            NvKey::MaxInfoFrames => "max_info_frames".to_string(),
            NvKey::PriorityArraySlot(object_type, instance, priority) => {
                format!("priority_{object_type}_{instance}_{priority}")
            }
            NvKey::OutOfService(object_type, instance) => {
                format!("oos_{object_type}_{instance}")
            }
            NvKey::DeviceInstance => "device_instance".to_string(),
            NvKey::Uuid => "uuid".to_string(),
        };
        self.dir.join(name)
    }
}

impl NvStore for FileNvStore {
    fn read(&self, key: NvKey) -> Option<Vec<u8>> {
        fs::read(self.path_for(key)).ok()
    }

    fn write(&mut self, key: NvKey, value: &[u8]) -> Result<(), BacnetError> {
        fs::write(self.path_for(key), value).map_err(|_| BacnetError::StorageError("fs write failed"))
    }
}
