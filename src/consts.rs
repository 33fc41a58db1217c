//! Constants shared by both ends of the phaser link.
//!
//! Everything the controller and the phaser must agree on at build time lives
//! here: node addresses, the authentication seed and key, frame markers and
//! lengths, reply layout sizes, and the sensor conversion constants.
//!
//! ## Key Concepts
//!
//! - **Addresses**: two fixed logical addresses, never discovered at runtime.
//! - **Frames**: a payload followed by a two byte tag (high byte first).
//! - **Markers**: single ASCII bytes at fixed positions that select the frame shape.
//! - **Buffer Sizing**: the largest command frame and the largest reply bound every
//!   `heapless` buffer in the crate.
//!
//! These values should be used wherever framing or buffer logic is implemented to
//! keep both nodes byte-for-byte compatible.

/// A logical node address on the radio link.
pub type Address = u8;

/// Address of the controller unit in the shack.
pub const CONTROLLER_ADDRESS: Address = 211;

/// Address of the phaser unit at the antenna.
pub const PHASER_ADDRESS: Address = 212;

/// Shared key mixed into every command tag.
///
/// Both nodes must be built with the same key. Changing it is a deployment
/// concern, see [`LinkConfig`](crate::config::LinkConfig).
pub const DEFAULT_AUTH_KEY: &[u8] = b"N2RD-ANTENNA-KEY";

/// Initial accumulator value for [`compute_tag`](crate::auth::compute_tag).
pub const AUTH_SEED: u16 = 0xb33f;

/// Left rotation applied to the accumulator for every payload byte.
pub const AUTH_ROTATE: u32 = 5;

/// Length (in bytes) of the authentication tag appended to a command payload.
pub const AUTH_TAG_LEN: usize = 2;

/// Number of relay outputs driven by the phaser.
pub const RELAY_COUNT: usize = 6;

/// Number of compass points the switch can be steered to.
pub const DIRECTION_COUNT: usize = 8;

/// Length (in bytes) of an azimuth string on the wire, e.g. `045`.
pub const AZIMUTH_LEN: usize = 3;

/// `AP1` prefix of a set-direction command.
pub const CMD_SET_PREFIX: [u8; 3] = *b"AP1";

/// Terminator of a set-direction command that moves the antenna on receipt.
pub const CMD_TERMINATOR_NOW: u8 = b'\r';

/// Terminator of a set-direction command that only stages a target.
pub const CMD_TERMINATOR_STAGE: u8 = b';';

/// Leading byte written in front of three byte query frames.
///
/// Receivers ignore this position.
pub const CMD_QUERY_LEAD: u8 = b'A';

/// Middle marker of the position query frame `AI1`.
pub const CMD_MARKER_INFO: u8 = b'I';

/// Middle marker of the move-to-target frame `AM1`.
pub const CMD_MARKER_MOVE: u8 = b'M';

/// Trailing byte of three byte query frames.
pub const CMD_QUERY_TAIL: u8 = b'1';

/// Single byte stop command.
pub const CMD_STOP: u8 = b';';

/// Single byte reflected power query.
pub const CMD_POWER: u8 = b'V';

/// Payload length of a set-direction command.
pub const SET_DIRECTION_LEN: usize = 7;

/// Payload length of a position or move query.
pub const QUERY_LEN: usize = 3;

/// Payload length of a single byte command.
pub const SINGLE_BYTE_LEN: usize = 1;

/// Largest command payload, excluding the tag.
pub const MAX_COMMAND_LEN: usize = SET_DIRECTION_LEN;

/// Largest command frame, including the tag.
pub const MAX_FRAME_LEN: usize = MAX_COMMAND_LEN + AUTH_TAG_LEN;

/// Leading marker of a position reply.
pub const REPLY_MARKER_POSITION: u8 = b';';

/// Leading marker of a reflected power reply.
pub const REPLY_MARKER_POWER: u8 = b'V';

/// Length of a position reply: `;AAArRRRRvVVVVViIIIbBBBB`.
pub const POSITION_REPLY_LEN: usize = 24;

/// Number of characters following the marker of a power reply.
pub const POWER_FIELD_WIDTH: usize = 6;

/// Length of a power reply: `V` followed by six characters.
pub const POWER_REPLY_LEN: usize = 1 + POWER_FIELD_WIDTH;

/// Largest reply frame either node produces.
pub const MAX_REPLY_LEN: usize = POSITION_REPLY_LEN;

/// Receive buffer size used by both nodes. Larger than any valid frame so that
/// oversized frames are still seen (and rejected) whole.
pub const RX_BUF_LEN: usize = 32;

/// Largest reflected power a power reply can carry, in watts.
pub const MAX_REPORTED_POWER_W: f32 = 9_999.9;

/// Scale from an averaged reflected power ADC count to volts at the coupler.
pub const REFLECTED_POWER_CONVERSION_FACTOR: f32 = 0.5474;

/// Reference impedance used to turn coupler volts into watts.
pub const REFERENCE_IMPEDANCE_OHMS: f32 = 50.0;

/// Number of ADC samples averaged for one reflected power reading.
pub const ADC_AVG_COUNT: u8 = 10;

/// Spacing between averaged ADC samples, in milliseconds.
pub const ADC_SAMPLE_INTERVAL_MS: u32 = 10;

/// Time the controller waits for a reply, in milliseconds.
pub const REPLY_TIMEOUT_MS: u32 = 1_000;

/// Idle delay between two polls of the phaser service loop, in milliseconds.
pub const POLL_INTERVAL_MS: u32 = 10;
