//! Shack-side dispatch: the controller.
//!
//! The controller sends one request to its phaser and waits a bounded time for
//! the matching reply. Only one request is ever outstanding; `&mut self` on
//! [`Controller::exchange`] enforces that.
//!
//! ```text
//! Idle -> Sending -> AwaitingReply -> Applying -> Idle
//!                                  \-> TimedOut -> Idle
//! ```
//!
//! Replies are taken as-is: they carry no authentication tag. The controller's
//! [`NodeState::current_direction`] only ever changes from a position reply, so
//! it always shows what the phaser last reported, never what was requested.
//!
//! Frames still queued when a new request goes out (late replies to an earlier,
//! timed-out request) are discarded first, so a reply always belongs to the
//! request that precedes it.

use embedded_hal::delay::DelayNs;

use crate::command::Command;
use crate::config::LinkConfig;
use crate::consts::RX_BUF_LEN;
use crate::direction::Direction;
use crate::error::{ErrorKind, Result};
use crate::state::NodeState;
use crate::telemetry::{Reply, TelemetrySnapshot};
use crate::transport::{Transport, discard_pending, receive_from};

/// Where the controller is in the current exchange.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum ControllerMode {
    /// No request outstanding.
    #[default]
    Idle,
    /// Handing the sealed request to the transport.
    Sending,
    /// Polling for the phaser's reply.
    AwaitingReply,
    /// Decoding the reply and updating telemetry.
    Applying,
    /// The reply did not arrive in time.
    TimedOut,
}

/// The controller state machine.
#[derive(Debug)]
pub struct Controller {
    /// Node configuration.
    pub config: LinkConfig,
    /// Direction bookkeeping. `target_direction` is unused here.
    pub state: NodeState,
    /// Current step of the exchange.
    pub mode: ControllerMode,
    /// Last telemetry reported by the phaser.
    pub telemetry: TelemetrySnapshot,
    /// Requests the transport accepted.
    pub tx_good: u16,
    /// Requests the transport failed to deliver.
    pub tx_failed: u16,
    /// Replies decoded and applied.
    pub rx_good: u16,
    /// Replies that failed to decode or did not match the request.
    pub rx_bad: u16,
    /// Exchanges that ended without a reply.
    pub timeouts: u16,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(LinkConfig::controller())
    }
}

impl Controller {
    /// Creates a controller that believes the antenna points north.
    pub const fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: NodeState::new(),
            mode: ControllerMode::Idle,
            telemetry: TelemetrySnapshot {
                position: Direction::N,
                rssi_tx: 0,
                rssi_rx: 0,
                bus_voltage_mv: 0,
                bus_current_ma: 0,
                supply_voltage_mv: 0,
                reflected_power_w: 0.0,
            },
            tx_good: 0,
            tx_failed: 0,
            rx_good: 0,
            rx_bad: 0,
            timeouts: 0,
        }
    }

    /// Sends `command` to the phaser and applies its reply.
    ///
    /// # Errors
    /// - [`ErrorKind::SendFailure`]: the transport rejected the request
    /// - [`ErrorKind::NoReply`]: nothing came back within `reply_timeout_ms`
    /// - [`ErrorKind::ReceiveFailure`]: the transport failed while waiting
    /// - [`ErrorKind::UnexpectedReply`]: the reply shape does not fit the request
    /// - any reply decode error
    ///
    /// On error, state and telemetry are unchanged.
    pub fn exchange<T, D>(
        &mut self,
        transport: &mut T,
        delay: &mut D,
        command: Command,
    ) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        let result = self.run(transport, delay, command);
        if let Err(e) = result {
            warn!("exchange failed: {}", e);
        }
        self.mode = ControllerMode::Idle;
        result
    }

    fn run<T, D>(&mut self, transport: &mut T, delay: &mut D, command: Command) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        self.mode = ControllerMode::Sending;
        let frame = command.seal(self.config.auth_key)?;
        let mut buf = [0u8; RX_BUF_LEN];
        let stale = discard_pending(transport, &mut buf);
        if stale > 0 {
            debug!("discarded {} stale frames", stale);
        }
        if transport.send(self.config.peer_address, &frame).is_err() {
            self.tx_failed = self.tx_failed.wrapping_add(1);
            return Err(ErrorKind::SendFailure);
        }
        self.tx_good = self.tx_good.wrapping_add(1);
        trace!("request sent, {} bytes", frame.len());

        self.mode = ControllerMode::AwaitingReply;
        let received = match receive_from(
            transport,
            delay,
            self.config.peer_address,
            &mut buf,
            self.config.reply_timeout_ms,
        ) {
            Ok(received) => received,
            Err(ErrorKind::NoReply) => {
                self.mode = ControllerMode::TimedOut;
                self.timeouts = self.timeouts.wrapping_add(1);
                return Err(ErrorKind::NoReply);
            }
            Err(e) => return Err(e),
        };

        self.mode = ControllerMode::Applying;
        let reply = Reply::decode(&buf[..received.len])
            .and_then(|reply| {
                if reply.shape() == command.reply_shape() {
                    Ok(reply)
                } else {
                    Err(ErrorKind::UnexpectedReply)
                }
            })
            .inspect_err(|_| self.rx_bad = self.rx_bad.wrapping_add(1))?;

        self.telemetry.apply(&reply);
        self.telemetry.rssi_rx = received.rssi;
        if let Reply::Position(report) = reply {
            self.state.current_direction = report.position;
            debug!("phaser reports {}", report.position);
        }
        let _ = self.state.bump_packet_count();
        self.rx_good = self.rx_good.wrapping_add(1);
        Ok(reply)
    }

    /// Steers the antenna to `direction` now.
    pub fn set_direction<T, D>(
        &mut self,
        transport: &mut T,
        delay: &mut D,
        direction: Direction,
    ) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        self.exchange(
            transport,
            delay,
            Command::SetDirection {
                direction,
                immediate: true,
            },
        )
    }

    /// Stages `direction` as the phaser's pending target without moving.
    pub fn stage_direction<T, D>(
        &mut self,
        transport: &mut T,
        delay: &mut D,
        direction: Direction,
    ) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        self.exchange(
            transport,
            delay,
            Command::SetDirection {
                direction,
                immediate: false,
            },
        )
    }

    /// Moves to the staged target.
    pub fn execute_move<T, D>(&mut self, transport: &mut T, delay: &mut D) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        self.exchange(transport, delay, Command::ExecuteMove)
    }

    /// Refreshes position and supply telemetry.
    pub fn query_position<T, D>(&mut self, transport: &mut T, delay: &mut D) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        self.exchange(transport, delay, Command::QueryPosition)
    }

    /// Refreshes the reflected power reading.
    pub fn query_power<T, D>(&mut self, transport: &mut T, delay: &mut D) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        self.exchange(transport, delay, Command::QueryPower)
    }

    /// Sends a stop.
    pub fn stop<T, D>(&mut self, transport: &mut T, delay: &mut D) -> Result<Reply>
    where
        T: Transport,
        D: DelayNs,
    {
        self.exchange(transport, delay, Command::Stop)
    }
}
