//! MCP3208 12-bit ADC over SPI (single-ended mode).
//!
//! One conversion is a 3-byte full-duplex transfer:
//!
//! ```text
//! tx: 0000 01 1 D2 | D1 D0 xx xxxx | xxxx xxxx
//! rx: xxxx xxxx    | xxx0 B11..B8  | B7..B0
//! ```

use jog_traits::AnalogChannel;

pub const CHANNELS: u8 = 8;
pub const FULL_SCALE: u16 = 4095;

/// Request frame for a single-ended conversion on `channel` (0..=7).
#[inline]
pub fn command_frame(channel: u8) -> [u8; 3] {
    let ch = channel & 0x07;
    [0x06 | (ch >> 2), (ch & 0x03) << 6, 0x00]
}

/// Extract the 12-bit result from a response frame.
#[inline]
pub fn decode_frame(rx: [u8; 3]) -> u16 {
    (u16::from(rx[1] & 0x0F) << 8) | u16::from(rx[2])
}

/// Which ADC input each logical channel is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMap {
    pub hotend: u8,
    pub bed: u8,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self { hotend: 0, bed: 1 }
    }
}

impl ChannelMap {
    pub fn input(&self, channel: AnalogChannel) -> u8 {
        match channel {
            AnalogChannel::Hotend => self.hotend,
            AnalogChannel::Bed => self.bed,
        }
    }
}

#[cfg(feature = "hardware")]
pub use device::{Mcp3208, SpiSettings};

#[cfg(feature = "hardware")]
mod device {
    use super::{CHANNELS, ChannelMap, command_frame, decode_frame};
    use crate::error::{HwError, Result};
    use jog_traits::{AnalogChannel, AnalogInput};
    use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

    #[derive(Debug, Clone, Copy)]
    pub struct SpiSettings {
        pub bus: u8,
        pub slave_select: u8,
        pub clock_hz: u32,
    }

    pub struct Mcp3208 {
        spi: Spi,
        map: ChannelMap,
    }

    fn bus(n: u8) -> Result<Bus> {
        Ok(match n {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            2 => Bus::Spi2,
            3 => Bus::Spi3,
            4 => Bus::Spi4,
            5 => Bus::Spi5,
            6 => Bus::Spi6,
            other => return Err(HwError::Spi(format!("no SPI bus {other}"))),
        })
    }

    fn slave_select(n: u8) -> Result<SlaveSelect> {
        Ok(match n {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported slave select {other}"))),
        })
    }

    impl Mcp3208 {
        pub fn new(settings: SpiSettings, map: ChannelMap) -> Result<Self> {
            if map.hotend >= CHANNELS || map.bed >= CHANNELS {
                return Err(HwError::Spi(format!(
                    "channel out of range (hotend {}, bed {})",
                    map.hotend, map.bed
                )));
            }
            let spi = Spi::new(
                bus(settings.bus)?,
                slave_select(settings.slave_select)?,
                settings.clock_hz,
                Mode::Mode0,
            )
            .map_err(|e| HwError::Spi(e.to_string()))?;
            tracing::debug!(
                bus = settings.bus,
                ss = settings.slave_select,
                clock_hz = settings.clock_hz,
                "mcp3208 opened"
            );
            Ok(Self { spi, map })
        }

        pub fn read_input(&mut self, input: u8) -> Result<u16> {
            let tx = command_frame(input);
            let mut rx = [0u8; 3];
            self.spi
                .transfer(&mut rx, &tx)
                .map_err(|e| HwError::Spi(e.to_string()))?;
            let value = decode_frame(rx);
            tracing::trace!(input, value, "mcp3208 conversion");
            Ok(value)
        }
    }

    impl AnalogInput for Mcp3208 {
        fn read(
            &mut self,
            channel: AnalogChannel,
        ) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
            let input = self.map.input(channel);
            self.read_input(input).map_err(Into::into)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, [0x06, 0x00, 0x00])]
    #[case(1, [0x06, 0x40, 0x00])]
    #[case(3, [0x06, 0xC0, 0x00])]
    #[case(4, [0x07, 0x00, 0x00])]
    #[case(7, [0x07, 0xC0, 0x00])]
    fn command_frames(#[case] channel: u8, #[case] frame: [u8; 3]) {
        assert_eq!(command_frame(channel), frame);
    }

    #[test]
    fn decode_ignores_leading_bits() {
        assert_eq!(decode_frame([0xFF, 0xEF, 0xFF]), FULL_SCALE);
        assert_eq!(decode_frame([0x00, 0x08, 0x00]), 2048);
        assert_eq!(decode_frame([0xAA, 0x00, 0x2A]), 42);
    }

    #[test]
    fn channel_map_routes_logical_inputs() {
        let map = ChannelMap { hotend: 5, bed: 2 };
        assert_eq!(map.input(AnalogChannel::Hotend), 5);
        assert_eq!(map.input(AnalogChannel::Bed), 2);
    }
}
