//! In-memory [`Transport`] for bench setups and tests.

use std::collections::VecDeque;

use super::{Received, Transport};
use crate::consts::Address;

/// Failure injected by [`MockTransport`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum MockError {
    /// `fail_send` was set.
    SendRejected,
    /// `fail_receive` was set.
    ReceiveFailed,
}

/// A frame queued for delivery.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Pending {
    /// Sender address.
    pub from: Address,
    /// Frame bytes.
    pub bytes: Vec<u8>,
    /// Reported signal strength, in dBm.
    pub rssi: i16,
}

/// Queue-backed transport: frames pushed with [`push`](MockTransport::push) are
/// handed out by `receive`, and everything sent is recorded in `sent`.
#[derive(Default, Debug)]
pub struct MockTransport {
    /// Frames waiting to be received, oldest first.
    pub inbox: VecDeque<Pending>,
    /// Every accepted `send`, in order.
    pub sent: Vec<(Address, Vec<u8>)>,
    /// Reject every `send`.
    pub fail_send: bool,
    /// Fail every `receive`.
    pub fail_receive: bool,
    receive_calls: usize,
}

impl MockTransport {
    /// Empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a frame from `from`.
    pub fn push(&mut self, from: Address, bytes: &[u8], rssi: i16) {
        self.inbox.push_back(Pending {
            from,
            bytes: bytes.to_vec(),
            rssi,
        });
    }

    /// Number of `receive` calls so far.
    pub fn receive_calls(&self) -> usize {
        self.receive_calls
    }
}

impl Transport for MockTransport {
    type Error = MockError;

    fn send(&mut self, to: Address, bytes: &[u8]) -> Result<(), MockError> {
        if self.fail_send {
            return Err(MockError::SendRejected);
        }
        self.sent.push((to, bytes.to_vec()));
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> nb::Result<Received, MockError> {
        self.receive_calls += 1;
        if self.fail_receive {
            return Err(nb::Error::Other(MockError::ReceiveFailed));
        }
        let pending = self.inbox.pop_front().ok_or(nb::Error::WouldBlock)?;
        let len = pending.bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&pending.bytes[..len]);
        Ok(Received {
            len,
            from: pending.from,
            rssi: pending.rssi,
        })
    }
}
