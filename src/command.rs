//! DCU-1 style command encoding and decoding.
//!
//! Commands are short, fixed-position ASCII payloads. The receiver tells them
//! apart purely by length and by marker bytes at fixed positions:
//!
//! | Command                         | Len | Layout                      |
//! |---------------------------------|-----|-----------------------------|
//! | [`Command::SetDirection`] now   | 7   | `A P 1 a a a \r`            |
//! | [`Command::SetDirection`] staged| 7   | `A P 1 a a a ;`             |
//! | [`Command::QueryPosition`]      | 3   | `<any> I 1`                 |
//! | [`Command::ExecuteMove`]        | 3   | `<any> M 1`                 |
//! | [`Command::Stop`]               | 1   | `;`                         |
//! | [`Command::QueryPower`]         | 1   | `V`                         |
//!
//! `aaa` is the azimuth from [`crate::direction`]. On a set-direction command the
//! terminator decides what the phaser does: `\r` switches the relays at once,
//! `;` only records a target that a later [`Command::ExecuteMove`] applies.

use heapless::Vec;

use crate::auth::{self, Frame};
use crate::consts::{
    AZIMUTH_LEN, CMD_MARKER_INFO, CMD_MARKER_MOVE, CMD_POWER, CMD_QUERY_LEAD, CMD_QUERY_TAIL,
    CMD_SET_PREFIX, CMD_STOP, CMD_TERMINATOR_NOW, CMD_TERMINATOR_STAGE, MAX_COMMAND_LEN,
    QUERY_LEN, SET_DIRECTION_LEN, SINGLE_BYTE_LEN,
};
use crate::direction::{Direction, direction_of_azimuth_bytes};
use crate::error::{ErrorKind, Result};

/// A command payload without its tag.
pub type Payload = Vec<u8, MAX_COMMAND_LEN>;

/// A request from the controller to the phaser.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Command {
    /// Steer to `direction`. With `immediate` the relays switch on receipt,
    /// otherwise the direction is only staged as the pending target.
    SetDirection {
        /// Requested compass point.
        direction: Direction,
        /// `true` for "move now" (`\r`), `false` for "stage" (`;`).
        immediate: bool,
    },
    /// Report the current position.
    QueryPosition,
    /// Move to the staged target.
    ExecuteMove,
    /// Report the reflected power.
    QueryPower,
    /// Stop. Nothing moves; the phaser reports its position.
    Stop,
}

/// The kind of reply a command produces.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ReplyShape {
    /// `;` position and supply telemetry.
    Position,
    /// `V` reflected power.
    Power,
}

impl Command {
    /// Payload bytes for this command, without the tag.
    pub fn encode(&self) -> Payload {
        let mut out = Payload::new();
        // Every arm is at most MAX_COMMAND_LEN bytes.
        let _ = match *self {
            Command::SetDirection {
                direction,
                immediate,
            } => {
                let terminator = if immediate {
                    CMD_TERMINATOR_NOW
                } else {
                    CMD_TERMINATOR_STAGE
                };
                out.extend_from_slice(&CMD_SET_PREFIX)
                    .and_then(|_| out.extend_from_slice(direction.azimuth().as_bytes()))
                    .and_then(|_| out.push(terminator).map_err(|_| ()))
            }
            Command::QueryPosition => {
                out.extend_from_slice(&[CMD_QUERY_LEAD, CMD_MARKER_INFO, CMD_QUERY_TAIL])
            }
            Command::ExecuteMove => {
                out.extend_from_slice(&[CMD_QUERY_LEAD, CMD_MARKER_MOVE, CMD_QUERY_TAIL])
            }
            Command::QueryPower => out.push(CMD_POWER).map_err(|_| ()),
            Command::Stop => out.push(CMD_STOP).map_err(|_| ()),
        };
        out
    }

    /// Encodes the command and appends its tag under `key`.
    pub fn seal(&self, key: &[u8]) -> Result<Frame> {
        auth::seal(key, &self.encode())
    }

    /// Decodes a payload (tag already stripped).
    pub fn decode(payload: &[u8]) -> Result<Command> {
        match payload.len() {
            SINGLE_BYTE_LEN => match payload[0] {
                CMD_POWER => Ok(Command::QueryPower),
                CMD_STOP => Ok(Command::Stop),
                _ => Err(ErrorKind::UnknownSingleByteCommand),
            },
            QUERY_LEN => match payload[1] {
                CMD_MARKER_INFO => Ok(Command::QueryPosition),
                CMD_MARKER_MOVE => Ok(Command::ExecuteMove),
                _ => Err(ErrorKind::UnknownFrameShape),
            },
            SET_DIRECTION_LEN => {
                let (prefix, rest) = payload.split_at(CMD_SET_PREFIX.len());
                if *prefix != CMD_SET_PREFIX {
                    return Err(ErrorKind::MalformedSetDirection);
                }
                let (azimuth, terminator) = rest.split_at(AZIMUTH_LEN);
                let immediate = match terminator[0] {
                    CMD_TERMINATOR_NOW => true,
                    CMD_TERMINATOR_STAGE => false,
                    _ => return Err(ErrorKind::MalformedSetDirection),
                };
                let direction = direction_of_azimuth_bytes(azimuth)?;
                Ok(Command::SetDirection {
                    direction,
                    immediate,
                })
            }
            _ => Err(ErrorKind::UnknownFrameShape),
        }
    }

    /// Checks the tag of a received frame under `key` and decodes its payload.
    pub fn open(key: &[u8], frame: &[u8]) -> Result<Command> {
        Command::decode(auth::open(key, frame)?)
    }

    /// The reply the phaser sends back for this command.
    pub fn reply_shape(&self) -> ReplyShape {
        match self {
            Command::QueryPower => ReplyShape::Power,
            _ => ReplyShape::Position,
        }
    }
}
