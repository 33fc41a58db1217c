//! Eight-point compass model and relay switching tables.
//!
//! The antenna switch can be steered to one of eight compass points. Each point
//! has a canonical three digit azimuth used on the wire (`"000"` .. `"315"`), a
//! short human name used on the console (`N` .. `NW`), and a six element relay
//! state vector used by the phaser to select the elements.
//!
//! ## Relay Tables
//!
//! Each row holds the states `{R1, R2, R3, R4, R5/6, R7/8}`, `true` meaning the
//! relay is energised. Two switch boxes are supported:
//!
//! - [`AntennaKind::RemoteQth`]: the 8-direction reference table, also returned by
//!   [`relay_vector_of`]
//! - [`AntennaKind::Comtek`]: a 4-position box; neighbouring points share a pattern
//!
//! ## Parsing
//!
//! - [`direction_of_azimuth`]: strict, wire-format azimuths only (plus `"360"`)
//! - [`direction_of_name`]: case-insensitive compass names
//! - [`Direction::from_str`](core::str::FromStr): console input, a name or a
//!   plain angle such as `45` or `360`

use core::fmt;
use core::str::FromStr;

use crate::consts::{DIRECTION_COUNT, RELAY_COUNT};
use crate::error::{ErrorKind, Result};

/// A relay state vector, one entry per relay output.
pub type RelayVector = [bool; RELAY_COUNT];

/// One of the eight compass points the antenna can be steered to.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug, Hash)]
pub enum Direction {
    /// North, `000`.
    #[default]
    N,
    /// Northeast, `045`.
    NE,
    /// East, `090`.
    E,
    /// Southeast, `135`.
    SE,
    /// South, `180`.
    S,
    /// Southwest, `225`.
    SW,
    /// West, `270`.
    W,
    /// Northwest, `315`.
    NW,
}

static AZIMUTHS: [&str; DIRECTION_COUNT] = ["000", "045", "090", "135", "180", "225", "270", "315"];

static NAMES: [&str; DIRECTION_COUNT] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

static DEGREES: [u16; DIRECTION_COUNT] = [0, 45, 90, 135, 180, 225, 270, 315];

static REMOTEQTH_RELAYS: [RelayVector; DIRECTION_COUNT] = [
    [false, false, false, false, false, false],
    [false, false, true, true, false, true],
    [true, true, true, true, true, true],
    [false, true, true, false, false, true],
    [false, false, false, false, true, true],
    [true, true, false, false, false, true],
    [true, true, true, true, false, false],
    [true, false, false, true, false, false],
];

static COMTEK_RELAYS: [RelayVector; DIRECTION_COUNT] = [
    [false, false, false, false, false, false],
    [false, false, false, false, false, false],
    [true, false, false, false, false, false],
    [true, false, false, false, false, false],
    [false, true, false, false, false, false],
    [false, true, false, false, false, false],
    [true, true, false, false, false, false],
    [true, true, false, false, false, false],
];

/// Azimuth accepted as an alias of north.
const NORTH_ALIAS: &str = "360";

impl Direction {
    /// All compass points in clockwise order starting at north.
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Position of this point in [`Direction::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks up a compass point by its position in [`Direction::ALL`].
    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    /// Canonical three digit azimuth, e.g. `"045"`.
    pub fn azimuth(self) -> &'static str {
        AZIMUTHS[self.index()]
    }

    /// Short compass name, e.g. `"NE"`.
    pub fn name(self) -> &'static str {
        NAMES[self.index()]
    }

    /// Heading in degrees.
    pub fn degrees(self) -> u16 {
        DEGREES[self.index()]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = ErrorKind;

    /// Parses console input: a compass name, or a whole-degree angle naming one
    /// of the eight points (`0`, `45`, ..., `315`, and `360` for north).
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(direction) = direction_of_name(s) {
            return Ok(direction);
        }
        let angle: u16 = s.parse().map_err(|_| ErrorKind::UnknownName)?;
        if angle == 360 {
            return Ok(Direction::N);
        }
        DEGREES
            .iter()
            .position(|&d| d == angle)
            .and_then(Direction::from_index)
            .ok_or(ErrorKind::UnknownName)
    }
}

/// Switch box wired to the phaser relays.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum AntennaKind {
    /// RemoteQTH 8-direction controller, six relays.
    #[default]
    RemoteQth,
    /// Comtek 4-direction controller, two relays. Neighbouring compass points
    /// (N/NE, E/SE, S/SW, W/NW) select the same pattern.
    Comtek,
}

impl AntennaKind {
    /// Relay states that steer this switch box to `direction`.
    pub fn relay_vector(self, direction: Direction) -> RelayVector {
        match self {
            AntennaKind::RemoteQth => REMOTEQTH_RELAYS[direction.index()],
            AntennaKind::Comtek => COMTEK_RELAYS[direction.index()],
        }
    }
}

/// Canonical azimuth string of `direction`.
pub fn azimuth_of(direction: Direction) -> &'static str {
    direction.azimuth()
}

/// Reference (RemoteQTH) relay vector of `direction`.
pub fn relay_vector_of(direction: Direction) -> RelayVector {
    AntennaKind::RemoteQth.relay_vector(direction)
}

/// Maps a wire azimuth back to its compass point.
///
/// Only the eight canonical strings and `"360"` are accepted; anything else,
/// including other valid-looking headings such as `"044"`, is
/// [`ErrorKind::UnknownAzimuth`].
pub fn direction_of_azimuth(azimuth: &str) -> Result<Direction> {
    if azimuth == NORTH_ALIAS {
        return Ok(Direction::N);
    }
    AZIMUTHS
        .iter()
        .position(|&a| a == azimuth)
        .and_then(Direction::from_index)
        .ok_or(ErrorKind::UnknownAzimuth)
}

/// Same as [`direction_of_azimuth`], for raw wire bytes.
pub fn direction_of_azimuth_bytes(azimuth: &[u8]) -> Result<Direction> {
    let azimuth = core::str::from_utf8(azimuth).map_err(|_| ErrorKind::UnknownAzimuth)?;
    direction_of_azimuth(azimuth)
}

/// Maps a compass name (`N`, `ne`, `Sw`, ...) to its compass point.
pub fn direction_of_name(name: &str) -> Result<Direction> {
    NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name))
        .and_then(Direction::from_index)
        .ok_or(ErrorKind::UnknownName)
}
