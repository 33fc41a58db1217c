//! Telemetry replies sent by the phaser.
//!
//! Two reply shapes exist, chosen by the request that produced them and never
//! mixed:
//!
//! - **Position reply**, 24 bytes: `;AAArRRRRvVVVVViIIIbBBBB`
//! - **Power reply**, 7 bytes: `V` followed by the reflected power in watts,
//!   six characters, one decimal, right-justified (`"1498.2"`, `"  12.3"`)
//!
//! The position reply has no delimiters or length prefixes; every value sits at
//! a fixed offset behind a one byte marker. The layout is declared once in
//! [`POSITION_LAYOUT`] and read by both the encoder and the decoder.
//!
//! | Field      | Marker | Offset | Width | Example |
//! |------------|--------|--------|-------|---------|
//! | azimuth    | `;`    | 1      | 3     | `045`   |
//! | RSSI (dBm) | `r`    | 5      | 4     | `-095`  |
//! | bus mV     | `v`    | 10     | 5     | `13800` |
//! | bus mA     | `i`    | 16     | 3     | `500`   |
//! | supply mV  | `b`    | 20     | 4     | `4200`  |
//!
//! A value that does not fit its field is clamped to the largest value the field
//! can hold, so the offsets never move.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::command::ReplyShape;
use crate::consts::{
    MAX_REPLY_LEN, MAX_REPORTED_POWER_W, POSITION_REPLY_LEN, POWER_FIELD_WIDTH, POWER_REPLY_LEN,
    REPLY_MARKER_POSITION, REPLY_MARKER_POWER,
};
use crate::direction::{Direction, direction_of_azimuth_bytes};
use crate::error::{ErrorKind, Result};

/// Bytes of an encoded reply.
pub type ReplyFrame = Vec<u8, MAX_REPLY_LEN>;

/// What a position reply field carries.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum FieldKind {
    /// Three digit azimuth of the current direction.
    Azimuth,
    /// Signed RSSI with an explicit sign, e.g. `-095`.
    Rssi,
    /// Zero-padded bus voltage in millivolts.
    BusVoltage,
    /// Zero-padded bus current in milliamps.
    BusCurrent,
    /// Zero-padded supply voltage in millivolts.
    SupplyVoltage,
}

/// Position of one value inside a position reply.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Field {
    /// Byte written directly in front of the value.
    pub marker: u8,
    /// Offset of the first value byte.
    pub offset: usize,
    /// Number of value bytes.
    pub width: usize,
    /// What the value means.
    pub kind: FieldKind,
}

impl Field {
    const fn new(marker: u8, offset: usize, width: usize, kind: FieldKind) -> Self {
        Self {
            marker,
            offset,
            width,
            kind,
        }
    }

    /// Offset of the marker byte.
    pub const fn marker_offset(&self) -> usize {
        self.offset - 1
    }

    /// One past the last value byte.
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// Layout of the position reply, in wire order.
pub const POSITION_LAYOUT: [Field; 5] = [
    Field::new(REPLY_MARKER_POSITION, 1, 3, FieldKind::Azimuth),
    Field::new(b'r', 5, 4, FieldKind::Rssi),
    Field::new(b'v', 10, 5, FieldKind::BusVoltage),
    Field::new(b'i', 16, 3, FieldKind::BusCurrent),
    Field::new(b'b', 20, 4, FieldKind::SupplyVoltage),
];

/// The phaser's view of itself at the moment of a request.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Clone, Copy, Default, Debug)]
pub struct TelemetrySnapshot {
    /// Current antenna direction.
    pub position: Direction,
    /// Signal strength of the controller's transmission as heard by the phaser,
    /// in dBm. This is the RSSI carried in the position reply.
    pub rssi_tx: i16,
    /// Signal strength of the reply as heard by the controller, in dBm. Filled
    /// in by the controller from its transport; never on the wire.
    pub rssi_rx: i16,
    /// Relay bus voltage in millivolts.
    pub bus_voltage_mv: u32,
    /// Relay bus current in milliamps.
    pub bus_current_ma: u32,
    /// Phaser supply voltage in millivolts.
    pub supply_voltage_mv: u32,
    /// Reflected power in watts.
    pub reflected_power_w: f32,
}

/// Decoded position reply.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct PositionReport {
    /// Direction the phaser reports.
    pub position: Direction,
    /// RSSI the phaser measured on the request, in dBm.
    pub rssi: i16,
    /// Relay bus voltage in millivolts.
    pub bus_voltage_mv: u32,
    /// Relay bus current in milliamps.
    pub bus_current_ma: u32,
    /// Phaser supply voltage in millivolts.
    pub supply_voltage_mv: u32,
}

/// Decoded power reply.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct PowerReport {
    /// Reflected power in watts, one decimal of precision.
    pub reflected_power_w: f32,
}

/// A reply received by the controller.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Reply {
    /// `;` reply.
    Position(PositionReport),
    /// `V` reply.
    Power(PowerReport),
}

impl Reply {
    /// Decodes a reply by its leading marker byte.
    pub fn decode(bytes: &[u8]) -> Result<Reply> {
        match bytes.first() {
            Some(&REPLY_MARKER_POSITION) => decode_position(bytes).map(Reply::Position),
            Some(&REPLY_MARKER_POWER) => decode_power(bytes).map(Reply::Power),
            _ => Err(ErrorKind::UnknownReplyShape),
        }
    }

    /// Shape of this reply.
    pub fn shape(&self) -> ReplyShape {
        match self {
            Reply::Position(_) => ReplyShape::Position,
            Reply::Power(_) => ReplyShape::Power,
        }
    }
}

impl TelemetrySnapshot {
    /// Encodes the reply of the given shape.
    pub fn encode(&self, shape: ReplyShape) -> ReplyFrame {
        match shape {
            ReplyShape::Position => self.encode_position(),
            ReplyShape::Power => self.encode_power(),
        }
    }

    /// Encodes a position reply.
    pub fn encode_position(&self) -> ReplyFrame {
        let mut out = [b'0'; POSITION_REPLY_LEN];
        for field in POSITION_LAYOUT.iter() {
            out[field.marker_offset()] = field.marker;
            let value = &mut out[field.offset..field.end()];
            match field.kind {
                FieldKind::Azimuth => value.copy_from_slice(self.position.azimuth().as_bytes()),
                FieldKind::Rssi => write_signed(value, i32::from(self.rssi_tx)),
                FieldKind::BusVoltage => write_unsigned(value, self.bus_voltage_mv),
                FieldKind::BusCurrent => write_unsigned(value, self.bus_current_ma),
                FieldKind::SupplyVoltage => write_unsigned(value, self.supply_voltage_mv),
            }
        }
        let mut frame = ReplyFrame::new();
        let _ = frame.extend_from_slice(&out);
        frame
    }

    /// Encodes a power reply.
    pub fn encode_power(&self) -> ReplyFrame {
        let mut frame = ReplyFrame::new();
        let _ = frame.push(REPLY_MARKER_POWER);
        let _ = frame.extend_from_slice(&format_power(self.reflected_power_w));
        frame
    }

    /// Folds a received reply into this snapshot.
    ///
    /// A position reply replaces the position and supply fields; a power reply
    /// replaces only the reflected power.
    pub fn apply(&mut self, reply: &Reply) {
        match reply {
            Reply::Position(report) => {
                self.position = report.position;
                self.rssi_tx = report.rssi;
                self.bus_voltage_mv = report.bus_voltage_mv;
                self.bus_current_ma = report.bus_current_ma;
                self.supply_voltage_mv = report.supply_voltage_mv;
            }
            Reply::Power(report) => self.reflected_power_w = report.reflected_power_w,
        }
    }
}

/// Decodes a position reply.
pub fn decode_position(bytes: &[u8]) -> Result<PositionReport> {
    if bytes.len() < POSITION_REPLY_LEN {
        return Err(ErrorKind::TruncatedPositionReply);
    }
    let mut report = PositionReport {
        position: Direction::N,
        rssi: 0,
        bus_voltage_mv: 0,
        bus_current_ma: 0,
        supply_voltage_mv: 0,
    };
    for field in POSITION_LAYOUT.iter() {
        if bytes[field.marker_offset()] != field.marker {
            return Err(ErrorKind::MalformedTelemetryField);
        }
        let value = &bytes[field.offset..field.end()];
        match field.kind {
            FieldKind::Azimuth => report.position = direction_of_azimuth_bytes(value)?,
            FieldKind::Rssi => {
                report.rssi = i16::try_from(read_signed(value)?)
                    .map_err(|_| ErrorKind::MalformedTelemetryField)?
            }
            FieldKind::BusVoltage => report.bus_voltage_mv = read_unsigned(value)?,
            FieldKind::BusCurrent => report.bus_current_ma = read_unsigned(value)?,
            FieldKind::SupplyVoltage => report.supply_voltage_mv = read_unsigned(value)?,
        }
    }
    Ok(report)
}

/// Decodes a power reply. Bytes past the six power characters are ignored.
pub fn decode_power(bytes: &[u8]) -> Result<PowerReport> {
    if bytes.len() < POWER_REPLY_LEN {
        return Err(ErrorKind::TruncatedPowerReply);
    }
    let text = core::str::from_utf8(&bytes[1..POWER_REPLY_LEN])
        .map_err(|_| ErrorKind::MalformedTelemetryField)?;
    let watts: f32 = text
        .trim()
        .parse()
        .map_err(|_| ErrorKind::MalformedTelemetryField)?;
    if !watts.is_finite() || watts < 0.0 {
        return Err(ErrorKind::MalformedTelemetryField);
    }
    Ok(PowerReport {
        reflected_power_w: watts,
    })
}

fn pow10(width: usize) -> u32 {
    (0..width).fold(1u32, |acc, _| acc.saturating_mul(10))
}

// Zero-padded decimal, clamped to `width` nines.
fn write_unsigned(out: &mut [u8], value: u32) {
    let max = pow10(out.len()) - 1;
    let mut v = value.min(max);
    for byte in out.iter_mut().rev() {
        *byte = b'0' + (v % 10) as u8;
        v /= 10;
    }
}

// Explicit sign followed by zero-padded magnitude, e.g. `-095`, `+000`.
fn write_signed(out: &mut [u8], value: i32) {
    let (sign, digits) = out.split_at_mut(1);
    sign[0] = if value < 0 { b'-' } else { b'+' };
    write_unsigned(digits, value.unsigned_abs());
}

fn read_unsigned(value: &[u8]) -> Result<u32> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(ErrorKind::MalformedTelemetryField);
    }
    Ok(value
        .iter()
        .fold(0u32, |acc, &b| acc * 10 + u32::from(b - b'0')))
}

fn read_signed(value: &[u8]) -> Result<i32> {
    let (sign, digits) = value
        .split_first()
        .ok_or(ErrorKind::MalformedTelemetryField)?;
    let magnitude =
        i32::try_from(read_unsigned(digits)?).map_err(|_| ErrorKind::MalformedTelemetryField)?;
    match sign {
        b'-' => Ok(-magnitude),
        b'+' => Ok(magnitude),
        _ => Err(ErrorKind::MalformedTelemetryField),
    }
}

// Watts with one decimal, right-justified in six characters.
fn format_power(watts: f32) -> [u8; POWER_FIELD_WIDTH] {
    let clamped = if watts.is_finite() {
        watts.clamp(0.0, MAX_REPORTED_POWER_W)
    } else {
        0.0
    };
    let tenths = libm::roundf(clamped * 10.0) as u32;
    let mut text: String<POWER_FIELD_WIDTH> = String::new();
    let _ = write!(text, "{:>4}.{}", tenths / 10, tenths % 10);
    let mut out = [b' '; POWER_FIELD_WIDTH];
    out.copy_from_slice(text.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            position: Direction::NE,
            rssi_tx: -95,
            rssi_rx: -101,
            bus_voltage_mv: 13_800,
            bus_current_ma: 500,
            supply_voltage_mv: 4_200,
            reflected_power_w: 1498.2338,
        }
    }

    #[test]
    fn test_layout_is_contiguous() {
        let mut next = 0;
        for field in POSITION_LAYOUT.iter() {
            assert_eq!(field.marker_offset(), next);
            next = field.end();
        }
        assert_eq!(next, POSITION_REPLY_LEN);
    }

    #[test]
    fn test_position_reply_bytes() {
        let frame = snapshot().encode_position();
        assert_eq!(frame.as_slice(), b";045r-095v13800i500b4200");
    }

    #[test]
    fn test_positive_rssi_keeps_sign() {
        let mut s = snapshot();
        s.rssi_tx = 7;
        assert_eq!(&s.encode_position()[4..9], b"r+007");
        s.rssi_tx = 0;
        assert_eq!(&s.encode_position()[4..9], b"r+000");
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut s = snapshot();
        s.bus_voltage_mv = 250_000;
        s.bus_current_ma = 1_234;
        s.supply_voltage_mv = 12_000;
        s.rssi_tx = -1_200;
        let frame = s.encode_position();
        assert_eq!(frame.len(), POSITION_REPLY_LEN);
        assert_eq!(frame.as_slice(), b";045r-999v99999i999b9999");
    }

    #[test]
    fn test_position_round_trip() {
        let s = snapshot();
        let report = decode_position(&s.encode_position()).unwrap();
        assert_eq!(report.position, s.position);
        assert_eq!(report.rssi, s.rssi_tx);
        assert_eq!(report.bus_voltage_mv, s.bus_voltage_mv);
        assert_eq!(report.bus_current_ma, s.bus_current_ma);
        assert_eq!(report.supply_voltage_mv, s.supply_voltage_mv);
    }

    #[test]
    fn test_position_decode_failures() {
        assert_eq!(
            decode_position(b";045r-095v13800i500b420"),
            Err(ErrorKind::TruncatedPositionReply)
        );
        assert_eq!(
            decode_position(b";045x-095v13800i500b4200"),
            Err(ErrorKind::MalformedTelemetryField)
        );
        assert_eq!(
            decode_position(b";045r-095v13a00i500b4200"),
            Err(ErrorKind::MalformedTelemetryField)
        );
        assert_eq!(
            decode_position(b";045r 095v13800i500b4200"),
            Err(ErrorKind::MalformedTelemetryField)
        );
        assert_eq!(
            decode_position(b";046r-095v13800i500b4200"),
            Err(ErrorKind::UnknownAzimuth)
        );
    }

    #[test]
    fn test_power_reply_bytes() {
        assert_eq!(snapshot().encode_power().as_slice(), b"V1498.2");
        let mut s = snapshot();
        s.reflected_power_w = 12.34;
        assert_eq!(s.encode_power().as_slice(), b"V  12.3");
        s.reflected_power_w = 0.0;
        assert_eq!(s.encode_power().as_slice(), b"V   0.0");
        s.reflected_power_w = 25_000.0;
        assert_eq!(s.encode_power().as_slice(), b"V9999.9");
        s.reflected_power_w = f32::NAN;
        assert_eq!(s.encode_power().as_slice(), b"V   0.0");
    }

    #[test]
    fn test_power_round_trip_within_a_tenth() {
        for watts in [0.04_f32, 3.75, 99.95, 1498.2338, 9_999.9] {
            let mut s = snapshot();
            s.reflected_power_w = watts;
            let report = decode_power(&s.encode_power()).unwrap();
            assert!((report.reflected_power_w - watts).abs() <= 0.1 + f32::EPSILON * watts);
        }
    }

    #[test]
    fn test_power_decode_failures() {
        assert_eq!(decode_power(b"V1498."), Err(ErrorKind::TruncatedPowerReply));
        assert_eq!(decode_power(b"V14x8.2"), Err(ErrorKind::MalformedTelemetryField));
        assert_eq!(decode_power(b"V  -1.0"), Err(ErrorKind::MalformedTelemetryField));
        assert_eq!(
            decode_power(b"V1500.6trailing").map(|r| r.reflected_power_w),
            Ok(1500.6)
        );
    }

    #[test]
    fn test_reply_dispatch_on_marker() {
        let s = snapshot();
        assert_eq!(
            Reply::decode(&s.encode(ReplyShape::Position)).map(|r| r.shape()),
            Ok(ReplyShape::Position)
        );
        assert_eq!(
            Reply::decode(&s.encode(ReplyShape::Power)).map(|r| r.shape()),
            Ok(ReplyShape::Power)
        );
        assert_eq!(Reply::decode(b""), Err(ErrorKind::UnknownReplyShape));
        assert_eq!(Reply::decode(b"X045"), Err(ErrorKind::UnknownReplyShape));
    }

    #[test]
    fn test_apply_keeps_shapes_apart() {
        let mut local = TelemetrySnapshot::default();
        local.apply(&Reply::Power(PowerReport {
            reflected_power_w: 12.5,
        }));
        assert_eq!(local.position, Direction::N);
        assert_eq!(local.reflected_power_w, 12.5);

        let report = decode_position(&snapshot().encode_position()).unwrap();
        local.apply(&Reply::Position(report));
        assert_eq!(local.position, Direction::NE);
        assert_eq!(local.bus_voltage_mv, 13_800);
        assert_eq!(local.reflected_power_w, 12.5);
    }
}
