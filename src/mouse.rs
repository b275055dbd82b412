// Background reader for the raw pointer device.
// Publishes the latest button byte through an atomic; the control loop reads
// it without locking. Staleness is bounded by the device's report rate.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use tracing::{debug, warn};

pub const MICE_DEVICE: &str = "/dev/input/mice";

/// Snapshot of the PS/2 button bits (byte 0 of each packet).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons(u8);

impl Buttons {
    pub const fn from_bits(bits: u8) -> Self { Self(bits) }
    pub fn primary(self) -> bool { self.0 & 0x1 != 0 }
    pub fn middle(self) -> bool { self.0 & 0x4 != 0 }
    /// Auxiliary trigger: the middle button.
    pub fn aux(self) -> bool { self.middle() }
}

/// Shared last-write-wins button state.
#[derive(Debug, Clone, Default)]
pub struct ButtonState(Arc<AtomicU8>);

impl ButtonState {
    pub fn snapshot(&self) -> Buttons {
        Buttons::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, bits: u8) {
        self.0.store(bits, Ordering::Relaxed);
    }
}

/// Open `path` and start the poller thread. Failing to open is fatal for
/// the caller: without buttons the trigger inputs never fire.
pub fn spawn_poller(path: &str) -> Result<ButtonState> {
    let device = File::open(path)
        .map_err(|source| Error::InputDevice { path: path.to_string(), source })?;
    let state = ButtonState::default();
    let shared = state.clone();
    let _poller = thread::Builder::new()
        .name("button-poller".into())
        .spawn(move || poll_packets(device, &shared))
        .map_err(|source| Error::InputDevice { path: path.to_string(), source })?;
    debug!(path, "button poller started");
    Ok(state)
}

/// Read whole 3-byte packets until the stream ends or fails. Short reads are
/// joined so byte 0 of every stored packet is the button byte.
fn poll_packets(mut device: impl Read, state: &ButtonState) {
    let mut packet = [0u8; 3];
    loop {
        match device.read_exact(&mut packet) {
            Ok(()) => state.store(packet[0]),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                warn!("pointer device closed");
                return;
            }
            Err(e) => {
                warn!(error = %e, "pointer device read failed");
                return;
            }
        }
    }
}
