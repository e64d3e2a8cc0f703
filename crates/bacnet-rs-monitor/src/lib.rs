// crates/bacnet-rs-monitor/src/lib.rs

// This crate will require std for the web server and tokio
extern crate alloc;

// Module for the core data models
pub mod model;
// Module for the web server and WebSocket logic
mod server;

use log::{error, info};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

// Imports for 'in-process' mode
#[cfg(feature = "in-process")]
use crate::model::RouterSnapshot;
#[cfg(feature = "in-process")]
use crossbeam_channel::Receiver;
#[cfg(feature = "in-process")]
use tokio::sync::broadcast;

// Imports for 'standalone' mode
#[cfg(feature = "standalone")]
use bacnet_rs::hal::DataLink;

/// The default port for the web monitor.
const DEFAULT_MONITOR_PORT: u16 = 3000;
/// The capacity of the broadcast channel for WebSocket clients.
const BROADCAST_CHANNEL_CAPACITY: usize = 32;

/// Starts the web monitor in "in-process" mode.
///
/// This function is intended to be run in a dedicated, non-real-time thread
/// (e.g., by the `bacnet-router` process after spawning its port and router
/// threads). It will start a web server and WebSocket endpoint.
///
/// * `receiver`: The `crossbeam-channel` to receive `RouterSnapshot` updates
///   from the router's main loop.
#[cfg(feature = "in-process")]
pub async fn start_in_process_monitor(
    receiver: Receiver<RouterSnapshot>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), DEFAULT_MONITOR_PORT);

    // This channel distributes snapshots from the bridge task to all
    // connected WebSocket clients.
    let (snapshot_tx, _) = broadcast::channel::<RouterSnapshot>(BROADCAST_CHANNEL_CAPACITY);

    // `spawn_blocking` moves the blocking `receiver.recv()` call off the async
    // runtime, so it never stalls the web server.
    let bridge_tx = snapshot_tx.clone();
    tokio::task::spawn_blocking(move || {
        info!("Starting router-to-monitor channel bridge task.");
        while let Ok(snapshot) = receiver.recv() {
            if let Err(e) = bridge_tx.send(snapshot) {
                // All WebSocket clients (and the server) have disconnected.
                error!("Failed to broadcast snapshot (no receivers?): {}. Shutting down bridge.", e);
                break;
            }
        }
        info!("Router-to-monitor channel bridge task shut down.");
    });

    server::start_web_server(addr, snapshot_tx).await;

    Ok(())
}

/// Starts the web monitor in "standalone" (out-of-process) mode.
///
/// This function runs as its own BACnet device on the bus, issuing
/// Who-Is-Router-To-Network and ReadProperty requests to poll a router
/// process's neighbors for diagnostic data, rather than receiving snapshots
/// over an in-process channel.
///
/// * `link`: A boxed, thread-safe [`DataLink`] (e.g. `bacnet-rs-linux`'s
///   `BacnetIpLink`) bound to the same network as the router being observed.
#[cfg(feature = "standalone")]
pub async fn start_standalone_monitor(
    mut link: Box<dyn DataLink + Send>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Standalone monitor logic would run here.");

    // 1. Broadcast a Who-Is to discover devices on the attached segment.
    // 2. For each I-Am reply, issue ReadPropertyMultiple for the properties
    //    shown on the dashboard (Object_List, Out_Of_Service, Present_Value).
    // 3. Spawn the web server (axum) in a separate async task.
    // 4. Loop: poll on an interval, update an in-memory RouterSnapshot-shaped
    //    state, and broadcast it the same way in-process mode does.

    let _ = link.local_mac();
    Ok(())
}
