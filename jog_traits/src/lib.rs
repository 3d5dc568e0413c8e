pub mod clock;

pub use clock::{Clock, MonotonicClock, TestClock};

/// Logic level driven onto a digital output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[inline]
    pub fn from_high(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// The two analog inputs of the board. The bed channel doubles as the
/// tracking input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogChannel {
    Hotend,
    Bed,
}

/// Digital outputs addressed by pin number (step, dir and the shared enable line).
pub trait PinBank {
    fn write(
        &mut self,
        pin: u8,
        level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// 12-bit analog sampling, values in `0..=4095`.
pub trait AnalogInput {
    fn read(
        &mut self,
        channel: AnalogChannel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// External supervisory timer that resets the board unless refreshed.
pub trait Watchdog {
    fn refresh(&mut self);
}

/// Non-blocking byte source behind the command line.
pub trait SerialSource {
    /// Next available byte, or `None` when nothing is buffered right now.
    fn read_byte(&mut self) -> Option<u8>;

    /// True once the source can never yield another byte (EOF, hang-up).
    fn is_closed(&self) -> bool {
        false
    }
}

impl<T: PinBank + ?Sized> PinBank for Box<T> {
    fn write(
        &mut self,
        pin: u8,
        level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write(pin, level)
    }
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read(
        &mut self,
        channel: AnalogChannel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(channel)
    }
}

impl<T: Watchdog + ?Sized> Watchdog for Box<T> {
    fn refresh(&mut self) {
        (**self).refresh();
    }
}

impl<T: SerialSource + ?Sized> SerialSource for Box<T> {
    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// In-memory byte source: yields the queued bytes, then reports closed.
impl SerialSource for std::collections::VecDeque<u8> {
    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.is_empty()
    }
}
