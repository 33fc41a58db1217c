//! Radio transport seam and bounded-wait helpers.
//!
//! The protocol engine does not talk to a radio. It expects an addressed,
//! acknowledged datagram service (e.g. a RadioHead-style reliable datagram
//! manager on an RFM95) behind the [`Transport`] trait:
//!
//! - `send`: deliver bytes to an address, blocking until acknowledged or failed
//! - `receive`: non-blocking; `nb::Error::WouldBlock` while nothing is pending
//!
//! Retries and backoff stay inside the transport. On top of it this module adds:
//! - [`receive_from`]: poll in 1 ms steps until a frame from one address
//!   arrives or the timeout runs out
//! - [`discard_pending`]: empty the receive queue before a new request
//! - `run_phaser_loop`: blocking phaser service loop (feature `delay-loop`)
//! - `mock::MockTransport`: in-memory transport (feature `std`)

use embedded_hal::delay::DelayNs;

use crate::consts::Address;
use crate::error::{ErrorKind, Result};

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "std")]
pub mod mock;

/// Metadata of a received frame.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Received {
    /// Number of bytes written to the receive buffer.
    pub len: usize,
    /// Sender address.
    pub from: Address,
    /// Signal strength of the frame, in dBm.
    pub rssi: i16,
}

/// Addressed datagram service provided by the radio layer.
pub trait Transport {
    /// Transport specific failure.
    type Error;

    /// Sends `bytes` to `to`, returning once the peer acknowledged or the
    /// transport gave up.
    fn send(&mut self, to: Address, bytes: &[u8]) -> core::result::Result<(), Self::Error>;

    /// Copies the next pending frame into `buf`.
    ///
    /// Frames longer than `buf` are truncated. Returns
    /// `nb::Error::WouldBlock` when nothing is pending.
    fn receive(&mut self, buf: &mut [u8]) -> nb::Result<Received, Self::Error>;
}

/// Polls `transport` until a frame from `from` arrives, for at most
/// `timeout_ms` milliseconds.
///
/// Frames from any other address are read and discarded. Each empty or
/// discarded poll costs one millisecond of the budget.
///
/// # Errors
/// - [`ErrorKind::NoReply`] when the budget runs out
/// - [`ErrorKind::ReceiveFailure`] when the transport reports an error
pub fn receive_from<T, D>(
    transport: &mut T,
    delay: &mut D,
    from: Address,
    buf: &mut [u8],
    timeout_ms: u32,
) -> Result<Received>
where
    T: Transport,
    D: DelayNs,
{
    let mut remaining = timeout_ms;
    loop {
        match transport.receive(buf) {
            Ok(received) if received.from == from => {
                return Ok(Received {
                    len: received.len.min(buf.len()),
                    ..received
                });
            }
            Ok(received) => {
                debug!("discarding {} bytes from {}", received.len, received.from);
            }
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(_)) => return Err(ErrorKind::ReceiveFailure),
        }
        if remaining == 0 {
            return Err(ErrorKind::NoReply);
        }
        remaining -= 1;
        delay.delay_ms(1);
    }
}

/// Reads and drops every frame the transport already holds.
///
/// Stops at the first `WouldBlock` or transport error. `buf` is scratch space.
///
/// # Returns
/// The number of frames dropped.
pub fn discard_pending<T>(transport: &mut T, buf: &mut [u8]) -> usize
where
    T: Transport,
{
    let mut dropped = 0;
    while let Ok(received) = transport.receive(buf) {
        trace!("dropping stale frame of {} bytes from {}", received.len, received.from);
        dropped += 1;
    }
    dropped
}
