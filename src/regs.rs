//! The byte-addressed register file exposed to the host bus.
//!
//! This is the entire surface the host sees: a flat array of bytes with
//! bounds-checked single-byte reads and writes. Protocol framing lives in
//! the communication layer; address translation from the bus address space
//! lives in the device dispatch.
//!
//! Derived fields (states, codes, temperature, gains, duty, uptime) are
//! republished every 100 ms, so host writes to them are transient; the
//! set-point word is the one write the device consumes. State bytes use 0
//! for "not yet published".

use num_traits::float::FloatCore;

/// Heater supervision state, `1..=6`.
pub const HEATER_STATE: u8 = 0x00;
/// Heater diagnostic code.
pub const HEATER_CODE: u8 = 0x01;
/// Set-point, u16 little-endian in 0.1 °C units. Read/write.
pub const SETPOINT: u8 = 0x02;
/// Sensor acquisition state, `1..=3`.
pub const SENSOR_STATE: u8 = 0x04;
/// Sensor diagnostic code.
pub const SENSOR_CODE: u8 = 0x05;
/// Last validated temperature, i16 little-endian in 0.1 °C units. Valid
/// while the sensor state reads "has data".
pub const TEMPERATURE: u8 = 0x06;
/// Commanded duty cycle in whole percent.
pub const DUTY: u8 = 0x08;
/// Proportional gain, u16 little-endian, hundredths.
pub const KP: u8 = 0x09;
/// Integral gain, u16 little-endian, hundredths.
pub const KI: u8 = 0x0B;
/// Derivative gain, u16 little-endian, hundredths.
pub const KD: u8 = 0x0D;
/// Uptime, u16 little-endian seconds, wrapping.
pub const UPTIME: u8 = 0x0F;

/// Total addressable size; offsets past [`UPTIME`] are reserved and read
/// as zero.
pub const SIZE: usize = 0x18;

/// Register access failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    /// The address is outside the register file; nothing was read or
    /// written.
    #[cfg_attr(feature = "std", error("register address out of range"))]
    InvalidAddress,
}

/// The flat byte-addressable register file.
pub struct RegisterFile {
    bytes: [u8; SIZE],
}

impl RegisterFile {
    /// Creates a zeroed register file.
    pub const fn new() -> Self {
        Self { bytes: [0; SIZE] }
    }

    /// Reads one byte.
    ///
    /// # Errors
    /// [`RegisterError::InvalidAddress`] when `address` is out of range.
    pub fn read(&self, address: u8) -> Result<u8, RegisterError> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(RegisterError::InvalidAddress)
    }

    /// Writes one byte. All in-range locations accept writes; derived
    /// fields are simply overwritten at the next publish.
    ///
    /// # Errors
    /// [`RegisterError::InvalidAddress`] when `address` is out of range;
    /// nothing is mutated.
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), RegisterError> {
        match self.bytes.get_mut(address as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RegisterError::InvalidAddress),
        }
    }

    /// Reads a little-endian word.
    ///
    /// # Errors
    /// [`RegisterError::InvalidAddress`] when either byte is out of range.
    pub fn read_u16(&self, address: u8) -> Result<u16, RegisterError> {
        let low = self.read(address)?;
        let high = self.read(address + 1)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Writes a little-endian word.
    ///
    /// # Errors
    /// [`RegisterError::InvalidAddress`] when either byte is out of range;
    /// the low byte may have been written.
    pub fn write_u16(&mut self, address: u8, value: u16) -> Result<(), RegisterError> {
        let [low, high] = value.to_le_bytes();
        self.write(address, low)?;
        self.write(address + 1, high)
    }

    /// Infallible store for the device publish path; `address` is a module
    /// constant known to be in range.
    pub(crate) fn put(&mut self, address: u8, value: u8) {
        if let Some(slot) = self.bytes.get_mut(address as usize) {
            *slot = value;
        }
    }

    /// Infallible word store for the device publish path.
    pub(crate) fn put_u16(&mut self, address: u8, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.put(address, low);
        self.put(address + 1, high);
    }

    /// Infallible word load for the device publish path.
    pub(crate) fn word(&self, address: u8) -> u16 {
        let low = self.bytes.get(address as usize).copied().unwrap_or(0);
        let high = self.bytes.get(address as usize + 1).copied().unwrap_or(0);
        u16::from_le_bytes([low, high])
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes a signed temperature into 0.1 °C register units.
pub fn encode_temperature(celsius: f32) -> u16 {
    (FloatCore::round(celsius * 10.0) as i16) as u16
}

/// Decodes a signed temperature from 0.1 °C register units.
pub fn decode_temperature(raw: u16) -> f32 {
    (raw as i16) as f32 / 10.0
}

/// Encodes the (non-negative) set-point into 0.1 °C register units.
pub fn encode_setpoint(celsius: f32) -> u16 {
    FloatCore::round(celsius * 10.0) as u16
}

/// Decodes the set-point from 0.1 °C register units.
pub fn decode_setpoint(raw: u16) -> f32 {
    raw as f32 / 10.0
}

/// Encodes a PID gain into hundredths.
pub fn encode_gain(gain: f32) -> u16 {
    FloatCore::round(gain * 100.0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_access_fails_without_mutation() {
        let mut regs = RegisterFile::new();
        assert_eq!(regs.read(SIZE as u8), Err(RegisterError::InvalidAddress));
        assert_eq!(
            regs.write(SIZE as u8, 0xAA),
            Err(RegisterError::InvalidAddress)
        );
        assert_eq!(regs.read(0xFF), Err(RegisterError::InvalidAddress));
    }

    #[test]
    fn test_words_are_little_endian() {
        let mut regs = RegisterFile::new();
        regs.write_u16(SETPOINT, 0x0807).unwrap();
        assert_eq!(regs.read(SETPOINT).unwrap(), 0x07);
        assert_eq!(regs.read(SETPOINT + 1).unwrap(), 0x08);
        assert_eq!(regs.read_u16(SETPOINT).unwrap(), 0x0807);
    }

    #[test]
    fn test_temperature_encoding_is_signed_tenths() {
        assert_eq!(encode_temperature(150.05), 1501); // rounds to nearest tenth
        assert_eq!(decode_temperature(encode_temperature(-12.5)), -12.5);
        assert_eq!(decode_setpoint(encode_setpoint(200.0)), 200.0);
    }
}
