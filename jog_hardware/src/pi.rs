//! Raspberry Pi GPIO outputs and UART command link (rppal).

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;

use jog_traits::{Level, PinBank, SerialSource};
use rppal::gpio::{Gpio, OutputPin};
use rppal::uart::{Parity, Uart};

use crate::error::{HwError, Result};

/// Output pins claimed up front; writes to any other pin fail.
pub struct GpioPins {
    outputs: HashMap<u8, OutputPin>,
}

impl GpioPins {
    pub fn new(pins: &[u8]) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut outputs = HashMap::with_capacity(pins.len());
        for &pin in pins {
            let out = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
                .into_output();
            outputs.insert(pin, out);
        }
        tracing::debug!(count = outputs.len(), "gpio outputs claimed");
        Ok(Self { outputs })
    }
}

impl PinBank for GpioPins {
    fn write(
        &mut self,
        pin: u8,
        level: Level,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let out = self
            .outputs
            .get_mut(&pin)
            .ok_or_else(|| HwError::Gpio(format!("pin {pin} not claimed as output")))?;
        match level {
            Level::High => out.set_high(),
            Level::Low => out.set_low(),
        }
        Ok(())
    }
}

const UART_CHUNK: usize = 64;

/// Non-blocking 8N1 serial port.
pub struct UartSerial {
    uart: Uart,
    pending: VecDeque<u8>,
}

impl UartSerial {
    pub fn open(device: impl AsRef<Path>, baud: u32) -> Result<Self> {
        let path = device.as_ref();
        let mut uart = Uart::with_path(path, baud, Parity::None, 8, 1)
            .map_err(|e| HwError::Uart(format!("{}: {e}", path.display())))?;
        // return immediately with whatever is buffered
        uart.set_read_mode(0, Duration::ZERO)
            .map_err(|e| HwError::Uart(e.to_string()))?;
        tracing::info!(device = %path.display(), baud, "uart opened");
        Ok(Self {
            uart,
            pending: VecDeque::with_capacity(UART_CHUNK),
        })
    }
}

impl SerialSource for UartSerial {
    fn read_byte(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            let mut buf = [0u8; UART_CHUNK];
            match self.uart.read(&mut buf) {
                Ok(n) => self.pending.extend(&buf[..n]),
                Err(e) => tracing::warn!(error = %e, "uart read failed"),
            }
        }
        self.pending.pop_front()
    }
}
