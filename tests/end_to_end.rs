use std::collections::VecDeque;
use std::convert::Infallible;

use embedded_hal_mock::eh1::delay::NoopDelay;
use phaser_link::auth;
use phaser_link::command::Command;
use phaser_link::config::{LinkConfig, PhaserConfig};
use phaser_link::consts::{Address, CONTROLLER_ADDRESS, DEFAULT_AUTH_KEY, PHASER_ADDRESS};
use phaser_link::controller::Controller;
use phaser_link::direction::{Direction, RelayVector, relay_vector_of};
use phaser_link::phaser::{Phaser, RelayBank};
use phaser_link::sensor::Readings;
use phaser_link::telemetry::Reply;
use phaser_link::transport::{Received, Transport};
use phaser_link::ErrorKind;

/// Records every relay vector the phaser applies.
#[derive(Default, Debug)]
struct Relays(Vec<RelayVector>);

impl RelayBank for Relays {
    fn apply(&mut self, states: &RelayVector) {
        self.0.push(*states);
    }
}

/// Wires a controller straight into a phaser: every send is handled on the spot
/// and any reply is queued for the controller's next receive.
#[derive(Debug)]
struct Bench {
    phaser: Phaser<Relays, Readings>,
    replies: VecDeque<Vec<u8>>,
    late: Vec<Vec<u8>>,
    hold_replies: bool,
    replies_sent: usize,
    sender: Address,
    corrupt_byte: Option<usize>,
}

impl Bench {
    fn new() -> Self {
        let readings = Readings {
            bus_voltage_mv: 13_800,
            bus_current_ma: 500,
            supply_voltage_mv: 4_200,
            reflected_power_raw: 500,
        };
        Self {
            phaser: Phaser::new(Relays::default(), readings, PhaserConfig::default()),
            replies: VecDeque::new(),
            late: Vec::new(),
            hold_replies: false,
            replies_sent: 0,
            sender: CONTROLLER_ADDRESS,
            corrupt_byte: None,
        }
    }

    /// Delivers replies held back while `hold_replies` was set.
    fn release_late_replies(&mut self) {
        self.replies.extend(self.late.drain(..));
    }

    fn last_relays(&self) -> RelayVector {
        *self.phaser.relays.0.last().unwrap()
    }
}

impl Transport for Bench {
    type Error = Infallible;

    fn send(&mut self, to: Address, bytes: &[u8]) -> Result<(), Infallible> {
        assert_eq!(to, PHASER_ADDRESS);
        let mut frame = bytes.to_vec();
        if let Some(i) = self.corrupt_byte.take() {
            frame[i] ^= 0x5a;
        }
        match self.phaser.handle_frame(self.sender, &frame, -95) {
            Ok(reply) => {
                self.replies_sent += 1;
                if self.hold_replies {
                    self.late.push(reply.to_vec());
                } else {
                    self.replies.push_back(reply.to_vec());
                }
            }
            Err(e) => assert!(e.is_silent_drop(), "{e:?} must not be answered"),
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> nb::Result<Received, Infallible> {
        let reply = self.replies.pop_front().ok_or(nb::Error::WouldBlock)?;
        buf[..reply.len()].copy_from_slice(&reply);
        Ok(Received {
            len: reply.len(),
            from: PHASER_ADDRESS,
            rssi: -101,
        })
    }
}

#[test]
fn test_set_direction_round_trip() {
    let mut bench = Bench::new();
    let mut controller = Controller::default();
    let mut delay = NoopDelay::new();

    let reply = controller
        .set_direction(&mut bench, &mut delay, Direction::NE)
        .unwrap();

    match reply {
        Reply::Position(report) => {
            assert_eq!(report.position, Direction::NE);
            assert_eq!(report.rssi, -95);
        }
        Reply::Power(_) => panic!("expected a position reply"),
    }
    assert_eq!(bench.phaser.state.current_direction, Direction::NE);
    assert_eq!(bench.last_relays(), relay_vector_of(Direction::NE));
    assert_eq!(controller.state.current_direction, Direction::NE);
    assert_eq!(controller.telemetry.rssi_tx, -95);
    assert_eq!(controller.telemetry.rssi_rx, -101);
    assert_eq!(controller.telemetry.bus_voltage_mv, 13_800);
    assert_eq!(controller.telemetry.bus_current_ma, 500);
    assert_eq!(controller.telemetry.supply_voltage_mv, 4_200);
}

#[test]
fn test_power_query_round_trip() {
    let mut bench = Bench::new();
    let mut controller = Controller::default();

    let frame = Command::QueryPower.seal(DEFAULT_AUTH_KEY).unwrap();
    let reply = bench
        .phaser
        .handle_frame(CONTROLLER_ADDRESS, &frame, -90)
        .unwrap();
    assert_eq!(&reply[..], b"V1498.2");

    let _ = controller
        .query_power(&mut bench, &mut NoopDelay::new())
        .unwrap();
    assert!((controller.telemetry.reflected_power_w - 1498.2).abs() < 0.01);
    assert_eq!(controller.state.current_direction, Direction::N);
}

#[test]
fn test_malformed_set_direction_gets_no_reply() {
    let mut bench = Bench::new();
    let frame = auth::seal(DEFAULT_AUTH_KEY, b"XYZ045\r").unwrap();

    bench.send(PHASER_ADDRESS, &frame).unwrap();

    assert_eq!(bench.replies_sent, 0);
    assert_eq!(bench.phaser.state.current_direction, Direction::N);
    assert_eq!(bench.phaser.state.packet_count, 0);
    assert_eq!(bench.phaser.rx_bad, 1);
}

#[test]
fn test_corrupted_tag_times_out() {
    let mut bench = Bench::new();
    let mut controller = Controller::default();
    bench.corrupt_byte = Some(7);

    assert_eq!(
        controller.set_direction(&mut bench, &mut NoopDelay::new(), Direction::S),
        Err(ErrorKind::NoReply)
    );
    assert_eq!(bench.replies_sent, 0);
    assert_eq!(bench.phaser.state.current_direction, Direction::N);
    assert_eq!(bench.phaser.relays.0.len(), 1);
    assert_eq!(controller.state.current_direction, Direction::N);
}

#[test]
fn test_staged_direction_moves_on_execute() {
    let mut bench = Bench::new();
    let mut controller = Controller::default();
    let mut delay = NoopDelay::new();

    let _ = controller
        .stage_direction(&mut bench, &mut delay, Direction::SW)
        .unwrap();
    assert_eq!(bench.phaser.state.target_direction, Direction::SW);
    assert_eq!(bench.phaser.state.current_direction, Direction::N);
    assert_eq!(controller.state.current_direction, Direction::N);

    let _ = controller.execute_move(&mut bench, &mut delay).unwrap();
    assert_eq!(bench.phaser.state.current_direction, Direction::SW);
    assert_eq!(bench.last_relays(), relay_vector_of(Direction::SW));
    assert_eq!(controller.state.current_direction, Direction::SW);
    assert_eq!(bench.phaser.state.packet_count, 2);
    assert_eq!(controller.state.packet_count, 2);
}

#[test]
fn test_foreign_sender_gets_no_reply() {
    let mut bench = Bench::new();
    let mut controller = Controller::default();
    bench.sender = 99;

    assert_eq!(
        controller.query_position(&mut bench, &mut NoopDelay::new()),
        Err(ErrorKind::NoReply)
    );
    assert_eq!(bench.replies_sent, 0);
    assert_eq!(bench.phaser.rx_foreign, 1);
}

#[test]
fn test_wrong_key_gets_no_reply() {
    let mut bench = Bench::new();
    let mut controller = Controller::new(LinkConfig {
        auth_key: b"SOME-OTHER-KEY",
        ..LinkConfig::controller()
    });

    assert_eq!(
        controller.set_direction(&mut bench, &mut NoopDelay::new(), Direction::E),
        Err(ErrorKind::NoReply)
    );
    assert_eq!(bench.phaser.state.current_direction, Direction::N);
    assert_eq!(controller.timeouts, 1);
}

#[test]
fn test_every_direction_round_trips() {
    let mut bench = Bench::new();
    let mut controller = Controller::default();
    let mut delay = NoopDelay::new();

    for direction in Direction::ALL {
        let _ = controller
            .set_direction(&mut bench, &mut delay, direction)
            .unwrap();
        assert_eq!(controller.state.current_direction, direction);
        assert_eq!(bench.last_relays(), relay_vector_of(direction));
    }
}

#[test]
fn test_late_reply_does_not_answer_next_request() {
    let mut bench = Bench::new();
    let mut controller = Controller::default();
    let mut delay = NoopDelay::new();

    bench.hold_replies = true;
    assert_eq!(
        controller.set_direction(&mut bench, &mut delay, Direction::NE),
        Err(ErrorKind::NoReply)
    );
    assert_eq!(bench.phaser.state.current_direction, Direction::NE);
    assert_eq!(controller.state.current_direction, Direction::N);

    bench.hold_replies = false;
    bench.release_late_replies();
    let reply = controller
        .set_direction(&mut bench, &mut delay, Direction::S)
        .unwrap();
    match reply {
        Reply::Position(report) => assert_eq!(report.position, Direction::S),
        Reply::Power(_) => panic!("expected a position reply"),
    }
    assert_eq!(controller.state.current_direction, Direction::S);
    assert!(bench.replies.is_empty());

    let _ = controller.query_power(&mut bench, &mut delay).unwrap();
    assert!(bench.replies.is_empty());
}
