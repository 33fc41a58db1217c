use embedded_hal::delay::DelayNs;

use super::Transport;
use crate::phaser::{Phaser, RelayBank};
use crate::sensor::Sensors;

/// Runs a blocking loop that serves the controller's requests forever.
///
/// Each pass calls [`Phaser::poll`]. When nothing was pending the loop sleeps
/// `config.link.poll_interval_ms` before polling again; a handled frame (or a
/// dropped one) is followed immediately by the next poll.
///
/// # Arguments
/// - `phaser`: the phaser state machine, already wired to its relays and sensors
/// - `transport`: the radio datagram service
/// - `delay`: a delay provider from the HAL
///
/// # Example
/// ```rust,no_run
/// # use phaser_link::transport::{Transport, Received};
/// # struct Radio;
/// # impl Transport for Radio {
/// #     type Error = ();
/// #     fn send(&mut self, _: u8, _: &[u8]) -> Result<(), ()> { Ok(()) }
/// #     fn receive(&mut self, _: &mut [u8]) -> nb::Result<Received, ()> { Err(nb::Error::WouldBlock) }
/// # }
/// use embedded_hal_mock::eh1::delay::NoopDelay;
/// use phaser_link::config::PhaserConfig;
/// use phaser_link::phaser::Phaser;
/// use phaser_link::sensor::Readings;
/// use phaser_link::transport::run_phaser_loop;
///
/// let relays = [(); 6].map(|_| embedded_hal_mock::eh1::digital::Mock::new(&[]));
/// let mut phaser = Phaser::new(relays, Readings::default(), PhaserConfig::default());
/// run_phaser_loop(&mut phaser, &mut Radio, &mut NoopDelay::new());
/// ```
///
/// # Notes
/// - Never returns; intended for single-purpose firmware.
/// - Dropped frames and failed sends are logged and counted by the phaser.
pub fn run_phaser_loop<R, S, T, D>(phaser: &mut Phaser<R, S>, transport: &mut T, delay: &mut D) -> !
where
    R: RelayBank,
    S: Sensors,
    T: Transport,
    D: DelayNs,
{
    loop {
        match phaser.poll(transport) {
            Err(nb::Error::WouldBlock) => delay.delay_ms(phaser.config.link.poll_interval_ms),
            Ok(()) | Err(nb::Error::Other(_)) => {}
        }
    }
}
