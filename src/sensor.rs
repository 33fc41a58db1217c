//! Sensor readings consumed by the phaser.
//!
//! Acquisition itself (the INA-style bus monitor, the reflected power ADC) is
//! board specific and lives outside this crate behind the [`Sensors`] trait. The
//! crate only provides the small amount of arithmetic both ends agree on:
//!
//! - [`average_samples`]: spaced averaging of raw ADC counts
//! - [`reflected_power_watts`]: ADC count to watts, `(raw * k)² / 50 Ω`

use embedded_hal::delay::DelayNs;

use crate::consts::REFERENCE_IMPEDANCE_OHMS;

/// Source of the phaser's analog readings.
///
/// Every reply re-samples through this trait; nothing is cached between requests.
pub trait Sensors {
    /// Relay bus voltage in millivolts.
    fn bus_voltage_mv(&mut self) -> u32;

    /// Relay bus current in milliamps.
    fn bus_current_ma(&mut self) -> u32;

    /// Phaser supply voltage in millivolts.
    fn supply_voltage_mv(&mut self) -> u32;

    /// Averaged reflected power ADC count.
    fn reflected_power_raw(&mut self) -> u16;
}

/// A fixed set of readings. Useful on the bench and in tests.
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct Readings {
    /// Relay bus voltage in millivolts.
    pub bus_voltage_mv: u32,
    /// Relay bus current in milliamps.
    pub bus_current_ma: u32,
    /// Supply voltage in millivolts.
    pub supply_voltage_mv: u32,
    /// Averaged reflected power ADC count.
    pub reflected_power_raw: u16,
}

impl Sensors for Readings {
    fn bus_voltage_mv(&mut self) -> u32 {
        self.bus_voltage_mv
    }

    fn bus_current_ma(&mut self) -> u32 {
        self.bus_current_ma
    }

    fn supply_voltage_mv(&mut self) -> u32 {
        self.supply_voltage_mv
    }

    fn reflected_power_raw(&mut self) -> u16 {
        self.reflected_power_raw
    }
}

/// Converts an averaged ADC count into reflected power.
///
/// `voltage = raw * conversion_factor`, `watts = voltage² / 50`.
pub fn reflected_power_watts(raw: u16, conversion_factor: f32) -> f32 {
    let volts = f32::from(raw) * conversion_factor;
    volts * volts / REFERENCE_IMPEDANCE_OHMS
}

/// Takes `count` samples spaced `interval_ms` apart and returns their
/// truncated mean. A `count` of zero takes a single sample.
///
/// # Arguments
/// - `delay`: delay provider used between samples
/// - `count`: number of samples to average
/// - `interval_ms`: spacing between samples, in milliseconds
/// - `sample`: reads one raw ADC count
pub fn average_samples<D, F>(delay: &mut D, count: u8, interval_ms: u32, mut sample: F) -> u16
where
    D: DelayNs,
    F: FnMut() -> u16,
{
    let count = count.max(1);
    let mut sum: u32 = 0;
    for _ in 0..count {
        sum += u32::from(sample());
        delay.delay_ms(interval_ms);
    }
    (sum / u32::from(count)) as u16
}
