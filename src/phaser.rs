//! Remote-side dispatch: the phaser.
//!
//! The phaser sits at the antenna, answers requests from its one registered
//! controller and drives the switch box relays. Every frame walks the same
//! fixed path:
//!
//! ```text
//! Idle -> Authenticating -> Decoding -> Executing -> Replying -> Idle
//! ```
//!
//! A frame that fails any step before `Executing` is dropped without a reply and
//! without touching [`NodeState`]. Every frame that reaches `Replying` gets
//! exactly one reply, built from freshly sampled sensors.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
//! use phaser_link::command::Command;
//! use phaser_link::config::PhaserConfig;
//! use phaser_link::direction::Direction;
//! use phaser_link::phaser::Phaser;
//! use phaser_link::sensor::Readings;
//!
//! let relays = [(); 6].map(|_| PinMock::new(&[PinTransaction::set(PinState::Low)]));
//! let mut phaser = Phaser::new(relays, Readings::default(), PhaserConfig::default());
//!
//! let frame = Command::QueryPosition.seal(phaser.config.link.auth_key).unwrap();
//! let reply = phaser.handle_frame(211, &frame, -90).unwrap();
//! assert_eq!(&reply[..4], b";000");
//! assert_eq!(phaser.state.current_direction, Direction::N);
//! # for pin in phaser.relays.iter_mut() { pin.done(); }
//! ```

use embedded_hal::digital::OutputPin;

use crate::auth;
use crate::command::Command;
use crate::config::PhaserConfig;
use crate::consts::{Address, RELAY_COUNT, RX_BUF_LEN};
use crate::direction::{Direction, RelayVector};
use crate::error::{ErrorKind, Result};
use crate::sensor::{Sensors, reflected_power_watts};
use crate::state::NodeState;
use crate::telemetry::{ReplyFrame, TelemetrySnapshot};
use crate::transport::Transport;

/// Output stage switching the antenna elements.
pub trait RelayBank {
    /// Drives every relay to the matching entry of `states` (`true` = energised).
    fn apply(&mut self, states: &RelayVector);
}

impl<P> RelayBank for [P; RELAY_COUNT]
where
    P: OutputPin,
{
    fn apply(&mut self, states: &RelayVector) {
        for (pin, &on) in self.iter_mut().zip(states.iter()) {
            if on {
                let _ = pin.set_high();
            } else {
                let _ = pin.set_low();
            }
        }
    }
}

/// Where the phaser is in handling the current frame.
///
/// Outside of [`Phaser::handle_frame`] the phaser is always [`Idle`](PhaserMode::Idle).
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum PhaserMode {
    /// Waiting for a frame.
    #[default]
    Idle,
    /// Checking the authentication tag.
    Authenticating,
    /// Parsing the payload into a command.
    Decoding,
    /// Applying the command to state and relays.
    Executing,
    /// Sampling sensors and encoding the reply.
    Replying,
}

/// The phaser state machine.
///
/// ## Type Parameters
///
/// - `R`: the relay outputs, usually `[P; 6]` of [`OutputPin`]s
/// - `S`: the analog readings, see [`Sensors`]
#[derive(Debug)]
pub struct Phaser<R, S> {
    /// Node configuration.
    pub config: PhaserConfig,
    /// Direction bookkeeping.
    pub state: NodeState,
    /// Current step of the frame path.
    pub mode: PhaserMode,
    /// Relay outputs.
    pub relays: R,
    /// Sensor source.
    pub sensors: S,

    /// Frames that were authenticated, decoded and answered.
    pub rx_good: u16,

    /// Frames from the peer dropped for a bad tag or an undecodable payload.
    pub rx_bad: u16,

    /// Frames dropped because they came from another address.
    pub rx_foreign: u16,

    /// Replies the transport accepted.
    pub tx_good: u16,

    /// Replies the transport failed to deliver.
    pub tx_failed: u16,
}

impl<R, S> Phaser<R, S>
where
    R: RelayBank,
    S: Sensors,
{
    /// Creates a phaser pointing north.
    ///
    /// The north relay vector is applied immediately so the hardware matches
    /// [`NodeState::new`].
    pub fn new(relays: R, sensors: S, config: PhaserConfig) -> Self {
        let mut phaser = Self {
            config,
            state: NodeState::new(),
            mode: PhaserMode::Idle,
            relays,
            sensors,
            rx_good: 0,
            rx_bad: 0,
            rx_foreign: 0,
            tx_good: 0,
            tx_failed: 0,
        };
        phaser.switch_to(Direction::N);
        phaser
    }

    /// Runs one received frame through the full path.
    ///
    /// # Arguments
    /// - `from`: transport address of the sender
    /// - `frame`: payload plus authentication tag
    /// - `rssi`: signal strength of the frame, reported back in position replies
    ///
    /// # Returns
    /// The reply to send back to the controller.
    ///
    /// # Errors
    /// Every error is a silent drop (see [`ErrorKind::is_silent_drop`]): the
    /// caller must not answer, and state is unchanged.
    pub fn handle_frame(&mut self, from: Address, frame: &[u8], rssi: i16) -> Result<ReplyFrame> {
        let result = self.dispatch(from, frame, rssi);
        self.mode = PhaserMode::Idle;
        match &result {
            Ok(_) => self.rx_good = self.rx_good.wrapping_add(1),
            Err(ErrorKind::ForeignSender) => {
                self.rx_foreign = self.rx_foreign.wrapping_add(1);
                debug!("ignoring frame from {}", from);
            }
            Err(e) => {
                self.rx_bad = self.rx_bad.wrapping_add(1);
                warn!("dropping frame from {}: {}", from, e);
            }
        }
        result
    }

    fn dispatch(&mut self, from: Address, frame: &[u8], rssi: i16) -> Result<ReplyFrame> {
        if from != self.config.link.peer_address {
            return Err(ErrorKind::ForeignSender);
        }

        self.mode = PhaserMode::Authenticating;
        let payload = auth::open(self.config.link.auth_key, frame)?;

        self.mode = PhaserMode::Decoding;
        let command = Command::decode(payload)?;
        let _ = self.state.bump_packet_count();

        self.mode = PhaserMode::Executing;
        self.execute(command);

        self.mode = PhaserMode::Replying;
        let snapshot = self.sample(rssi);
        Ok(snapshot.encode(command.reply_shape()))
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::SetDirection {
                direction,
                immediate: true,
            } => {
                self.state.current_direction = direction;
                self.switch_to(direction);
            }
            Command::SetDirection {
                direction,
                immediate: false,
            } => {
                self.state.target_direction = direction;
                debug!("staged {}", direction);
            }
            Command::ExecuteMove => {
                let target = self.state.target_direction;
                self.state.current_direction = target;
                self.switch_to(target);
            }
            Command::QueryPosition | Command::QueryPower | Command::Stop => {}
        }
    }

    fn switch_to(&mut self, direction: Direction) {
        let states = self.config.antenna.relay_vector(direction);
        self.relays.apply(&states);
        info!("antenna switched to {}", direction);
    }

    /// Reads every sensor once and builds the snapshot a reply is encoded from.
    pub fn sample(&mut self, rssi: i16) -> TelemetrySnapshot {
        let raw = self.sensors.reflected_power_raw();
        TelemetrySnapshot {
            position: self.state.current_direction,
            rssi_tx: rssi,
            rssi_rx: 0,
            bus_voltage_mv: self.sensors.bus_voltage_mv(),
            bus_current_ma: self.sensors.bus_current_ma(),
            supply_voltage_mv: self.sensors.supply_voltage_mv(),
            reflected_power_w: reflected_power_watts(raw, self.config.conversion_factor),
        }
    }

    /// Receives at most one frame from `transport` and answers it.
    ///
    /// # Returns
    /// - `Ok(())` when a frame was handled and its reply sent
    /// - `Err(nb::Error::WouldBlock)` when nothing was pending
    /// - `Err(nb::Error::Other(_))` when the frame was dropped, the receive
    ///   failed ([`ErrorKind::ReceiveFailure`]) or the reply could not be sent
    ///   ([`ErrorKind::SendFailure`]); in the last case the command has already
    ///   been executed
    pub fn poll<T>(&mut self, transport: &mut T) -> nb::Result<(), ErrorKind>
    where
        T: Transport,
    {
        let mut buf = [0u8; RX_BUF_LEN];
        let received = transport.receive(&mut buf).map_err(|e| match e {
            nb::Error::WouldBlock => nb::Error::WouldBlock,
            nb::Error::Other(_) => nb::Error::Other(ErrorKind::ReceiveFailure),
        })?;
        let len = received.len.min(buf.len());
        trace!("received {} bytes from {}", len, received.from);

        let reply = self.handle_frame(received.from, &buf[..len], received.rssi)?;
        match transport.send(self.config.link.peer_address, &reply) {
            Ok(()) => {
                self.tx_good = self.tx_good.wrapping_add(1);
                Ok(())
            }
            Err(_) => {
                self.tx_failed = self.tx_failed.wrapping_add(1);
                warn!("reply to {} not delivered", self.config.link.peer_address);
                Err(nb::Error::Other(ErrorKind::SendFailure))
            }
        }
    }

    /// Polls until the transport has nothing pending.
    ///
    /// # Returns
    /// The number of frames answered.
    pub fn serve_pending<T>(&mut self, transport: &mut T) -> usize
    where
        T: Transport,
    {
        let mut answered = 0;
        loop {
            match self.poll(transport) {
                Ok(()) => answered += 1,
                Err(nb::Error::WouldBlock) => return answered,
                Err(nb::Error::Other(ErrorKind::ReceiveFailure)) => return answered,
                Err(nb::Error::Other(_)) => {}
            }
        }
    }
}
