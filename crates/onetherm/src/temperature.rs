//! Temperature register decoding.
//!
//! The sensor stores its last conversion in the first two scratchpad bytes as
//! a signed 16-bit fixed-point value with 4 fractional bits: 16 ticks per
//! degree Celsius at 12-bit resolution.
//!
//! Decoding never touches the bus. It splits the value into a whole part and
//! a non-negative fractional magnitude, the way a character display prints
//! it:
//!
//! - Celsius: the fractional part is in ten-thousandths of a degree, one
//!   tick being 625.
//! - Fahrenheit: the fractional part is in tenths of a degree.
//!
//! Integer divisions truncate toward zero.

use core::fmt;

// Temperature resolution of the sensor.
// Each bit in the 12-bit temperature reading corresponds to 0.0625 °C.
const TEMPERATURE_RESOLUTION_C_PER_LSB: f32 = 0.0625;

// Ten-thousandths of a degree Celsius per tick.
const CELSIUS_FRACTION_PER_LSB: u16 = 625;

// 32 °F expressed in tenths.
const FAHRENHEIT_OFFSET_TENTHS: i32 = 320;

/// Temperature unit of a [`TemperatureReading`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Unit {
    /// Degrees Celsius, four fractional digits.
    #[default]
    Celsius,
    /// Degrees Fahrenheit, one fractional digit.
    Fahrenheit,
}

impl Unit {
    /// Returns the unit symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }
}

/// The two temperature bytes of the scratchpad, as read from the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScratchBytes {
    lsb: u8,
    msb: u8,
}

impl ScratchBytes {
    /// Creates [`ScratchBytes`] from scratchpad byte 0 and byte 1.
    #[must_use]
    pub const fn new(lsb: u8, msb: u8) -> Self {
        Self { lsb, msb }
    }

    /// Scratchpad byte 0.
    #[must_use]
    pub const fn lsb(&self) -> u8 {
        self.lsb
    }

    /// Scratchpad byte 1.
    #[must_use]
    pub const fn msb(&self) -> u8 {
        self.msb
    }

    /// The register as a signed tick count.
    #[must_use]
    pub const fn raw(&self) -> i16 {
        i16::from_le_bytes([self.lsb, self.msb])
    }

    /// The register in degrees Celsius.
    #[must_use]
    pub fn celsius_f32(&self) -> f32 {
        f32::from(self.raw()) * TEMPERATURE_RESOLUTION_C_PER_LSB
    }
}

/// A decoded temperature.
///
/// The sign is carried by [`whole`](Self::whole). Since a reading between
/// `-1` and `0` has a whole part of `0`, [`is_negative`](Self::is_negative)
/// tells such readings apart from positive ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemperatureReading {
    unit: Unit,
    whole: i16,
    fractional: u16,
    negative: bool,
}

impl TemperatureReading {
    /// Decodes `bytes` into `unit`.
    ///
    /// Celsius uses [`to_celsius`], Fahrenheit [`to_fahrenheit`].
    #[must_use]
    pub fn decode(bytes: ScratchBytes, unit: Unit) -> Self {
        match unit {
            Unit::Celsius => to_celsius(bytes),
            Unit::Fahrenheit => to_fahrenheit(bytes),
        }
    }

    /// The unit of the reading.
    #[must_use]
    pub const fn unit(&self) -> Unit {
        self.unit
    }

    /// The whole part, truncated toward zero.
    #[must_use]
    pub const fn whole(&self) -> i16 {
        self.whole
    }

    /// The fractional magnitude: ten-thousandths for Celsius, tenths for
    /// Fahrenheit.
    #[must_use]
    pub const fn fractional(&self) -> u16 {
        self.fractional
    }

    /// Whether the reading is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// The reading as a floating point value.
    #[must_use]
    pub fn as_f32(&self) -> f32 {
        let scale = match self.unit {
            Unit::Celsius => 10_000.0,
            Unit::Fahrenheit => 10.0,
        };
        let magnitude = f32::from(self.whole.unsigned_abs()) + f32::from(self.fractional) / scale;
        if self.negative { -magnitude } else { magnitude }
    }
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative && self.whole == 0 {
            f.write_str("-")?;
        }
        match self.unit {
            Unit::Celsius => write!(f, "{}.{:04}", self.whole, self.fractional),
            Unit::Fahrenheit => write!(f, "{}.{}", self.whole, self.fractional),
        }
    }
}

/// Decodes Celsius with the positive-only formula.
///
/// The whole part takes the low 3 bits of byte 1 and the high nibble of
/// byte 0, so every sign bit is dropped: `-10 °C` (`0x60, 0xFF`) decodes as
/// `118.0000`. For every non-negative register it agrees with [`to_celsius`].
#[must_use]
pub fn to_celsius_reference(bytes: ScratchBytes) -> TemperatureReading {
    let whole = (i16::from(bytes.msb & 0x07) << 4) | i16::from(bytes.lsb >> 4);
    let fractional = u16::from(bytes.lsb & 0x0F) * CELSIUS_FRACTION_PER_LSB;

    TemperatureReading {
        unit: Unit::Celsius,
        whole,
        fractional,
        negative: false,
    }
}

/// Decodes Celsius over the full two's-complement range.
#[must_use]
pub fn to_celsius(bytes: ScratchBytes) -> TemperatureReading {
    let raw = bytes.raw();

    TemperatureReading {
        unit: Unit::Celsius,
        whole: raw / 16,
        fractional: (raw % 16).unsigned_abs() * CELSIUS_FRACTION_PER_LSB,
        negative: raw < 0,
    }
}

/// Decodes Fahrenheit in tenths of a degree.
///
/// `10·F = 18·C + 320 = 16·C + 2·C + 320`, where the register already holds
/// `16·C` and `2·C` is `raw / 8`. Both that division
/// and the split into whole and tenths truncate toward zero, including for
/// negative values.
#[must_use]
pub fn to_fahrenheit(bytes: ScratchBytes) -> TemperatureReading {
    let raw = i32::from(bytes.raw());
    let tenths = raw + raw / 8 + FAHRENHEIT_OFFSET_TENTHS;

    // Bounded by the i16 register: |tenths| < 37_000.
    TemperatureReading {
        unit: Unit::Fahrenheit,
        whole: (tenths / 10) as i16,
        fractional: (tenths % 10).unsigned_abs() as u16,
        negative: tenths < 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn celsius(lsb: u8, msb: u8) -> TemperatureReading {
        TemperatureReading::decode(ScratchBytes::new(lsb, msb), Unit::Celsius)
    }

    fn fahrenheit(lsb: u8, msb: u8) -> TemperatureReading {
        TemperatureReading::decode(ScratchBytes::new(lsb, msb), Unit::Fahrenheit)
    }

    #[test]
    fn test_celsius_decode() {
        let reading = celsius(0x91, 0x01);

        assert_eq!(reading.whole(), 25);
        assert_eq!(reading.fractional(), 625);
        assert!(!reading.is_negative());
        assert_eq!(reading.to_string(), "25.0625");
    }

    #[test]
    fn test_fahrenheit_decode() {
        let reading = fahrenheit(0x90, 0x01);

        assert_eq!(reading.whole(), 77);
        assert_eq!(reading.fractional(), 0);
        assert_eq!(reading.to_string(), "77.0");
    }

    #[test]
    fn test_power_on_value() {
        // 0x0550 = 85.0 °C.
        assert_eq!(celsius(0x50, 0x05).to_string(), "85.0000");
        assert_eq!(fahrenheit(0x50, 0x05).to_string(), "185.0");
    }

    #[test]
    fn test_range_limits() {
        // 0x07D0 = 125 °C, 0xFC90 = -55 °C.
        assert_eq!(celsius(0xD0, 0x07).to_string(), "125.0000");
        assert_eq!(fahrenheit(0xD0, 0x07).to_string(), "257.0");
        assert_eq!(celsius(0x90, 0xFC).to_string(), "-55.0000");
        assert_eq!(fahrenheit(0x90, 0xFC).to_string(), "-67.0");
    }

    #[test]
    fn test_reference_celsius_drops_sign() {
        // -10 °C: raw -160.
        let reference = to_celsius_reference(ScratchBytes::new(0x60, 0xFF));
        assert_eq!(reference.whole(), 118);
        assert_eq!(reference.fractional(), 0);
        assert!(!reference.is_negative());

        let reading = celsius(0x60, 0xFF);
        assert_eq!(reading.whole(), -10);
        assert_eq!(reading.fractional(), 0);
        assert!(reading.is_negative());
    }

    #[test]
    fn test_reference_celsius_agrees_when_positive() {
        for raw in 0..=0x07FFi16 {
            let [lsb, msb] = raw.to_le_bytes();
            let bytes = ScratchBytes::new(lsb, msb);
            assert_eq!(to_celsius_reference(bytes), to_celsius(bytes));
        }
    }

    #[test]
    fn test_negative_celsius_fraction() {
        // -10.0625 °C: raw -161.
        let reading = celsius(0x5F, 0xFF);
        assert_eq!(reading.whole(), -10);
        assert_eq!(reading.fractional(), 625);
        assert_eq!(reading.to_string(), "-10.0625");

        // -0.5 °C: raw -8, whole part is zero.
        let reading = celsius(0xF8, 0xFF);
        assert_eq!(reading.whole(), 0);
        assert_eq!(reading.fractional(), 5000);
        assert!(reading.is_negative());
        assert_eq!(reading.to_string(), "-0.5000");
    }

    #[test]
    fn test_negative_fahrenheit_truncates() {
        // -10 °C = 14.0 °F.
        assert_eq!(fahrenheit(0x60, 0xFF).to_string(), "14.0");

        // -18.5 °C: raw -296, tenths -13.
        let reading = fahrenheit(0xD8, 0xFE);
        assert_eq!(reading.whole(), -1);
        assert_eq!(reading.fractional(), 3);

        // -17.9375 °C: raw -287, raw / 8 truncates to -35, tenths -2.
        let reading = fahrenheit(0xE1, 0xFE);
        assert_eq!(reading.whole(), 0);
        assert_eq!(reading.fractional(), 2);
        assert!(reading.is_negative());
        assert_eq!(reading.to_string(), "-0.2");
    }

    #[test]
    fn test_decode_is_pure() {
        let bytes = ScratchBytes::new(0x91, 0x01);

        let first = TemperatureReading::decode(bytes, Unit::Fahrenheit);
        for _ in 0..10 {
            assert_eq!(TemperatureReading::decode(bytes, Unit::Fahrenheit), first);
        }
    }

    #[test]
    fn test_float_conversions() {
        assert!((ScratchBytes::new(0x6E, 0xFE).celsius_f32() + 25.125).abs() < f32::EPSILON);
        assert!((celsius(0xF8, 0xFF).as_f32() + 0.5).abs() < f32::EPSILON);
        assert!((fahrenheit(0x90, 0x01).as_f32() - 77.0).abs() < f32::EPSILON);
    }
}
