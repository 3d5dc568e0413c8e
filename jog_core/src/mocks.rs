//! Test and helper mocks for jog_core.
//!
//! Every mock is a cheap-to-clone handle over shared state, so a test can
//! hand one clone to the controller and inspect the other afterwards.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use jog_traits::{AnalogChannel, AnalogInput, Level, PinBank, Watchdog};

use crate::console::Console;

/// Pin bank that records every write in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingPins {
    log: Arc<Mutex<Vec<(u8, Level)>>>,
}

impl RecordingPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(u8, Level)> {
        self.log.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of low→high transitions written to `pin`.
    pub fn rising_edges(&self, pin: u8) -> usize {
        let mut last = Level::Low;
        let mut edges = 0;
        for (p, level) in self.writes() {
            if p != pin {
                continue;
            }
            if last == Level::Low && level == Level::High {
                edges += 1;
            }
            last = level;
        }
        edges
    }

    pub fn last_level(&self, pin: u8) -> Option<Level> {
        self.writes()
            .into_iter()
            .rev()
            .find(|(p, _)| *p == pin)
            .map(|(_, l)| l)
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.log.lock() {
            g.clear();
        }
    }
}

impl PinBank for RecordingPins {
    fn write(
        &mut self,
        pin: u8,
        level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut g) = self.log.lock() {
            g.push((pin, level));
        }
        Ok(())
    }
}

/// Pin bank that records writes and fails every write after the first `ok_writes`.
#[derive(Debug, Clone)]
pub struct FailingPins {
    inner: RecordingPins,
    ok_writes: usize,
    seen: Arc<AtomicUsize>,
}

impl FailingPins {
    pub fn after(ok_writes: usize) -> Self {
        Self {
            inner: RecordingPins::new(),
            ok_writes,
            seen: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn recorded(&self) -> &RecordingPins {
        &self.inner
    }
}

impl PinBank for FailingPins {
    fn write(
        &mut self,
        pin: u8,
        level: Level,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let n = self.seen.fetch_add(1, Ordering::Relaxed);
        if n >= self.ok_writes {
            return Err(Box::new(std::io::Error::other("gpio write rejected")));
        }
        self.inner.write(pin, level)
    }
}

/// Analog input with a settable value per channel and an optional queue of
/// scripted samples that is consumed first.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnalog {
    state: Arc<Mutex<AnalogState>>,
}

#[derive(Debug, Default)]
struct AnalogState {
    fixed: HashMap<AnalogChannel, u16>,
    queued: HashMap<AnalogChannel, VecDeque<u16>>,
    reads: usize,
    fail: bool,
}

impl ScriptedAnalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, channel: AnalogChannel, value: u16) -> Self {
        self.set(channel, value);
        self
    }

    pub fn set(&self, channel: AnalogChannel, value: u16) {
        if let Ok(mut g) = self.state.lock() {
            g.fixed.insert(channel, value);
        }
    }

    pub fn queue(&self, channel: AnalogChannel, values: impl IntoIterator<Item = u16>) {
        if let Ok(mut g) = self.state.lock() {
            g.queued.entry(channel).or_default().extend(values);
        }
    }

    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut g) = self.state.lock() {
            g.fail = fail;
        }
    }

    pub fn reads(&self) -> usize {
        self.state.lock().map(|g| g.reads).unwrap_or(0)
    }
}

impl AnalogInput for ScriptedAnalog {
    fn read(
        &mut self,
        channel: AnalogChannel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let mut g = self
            .state
            .lock()
            .map_err(|_| std::io::Error::other("analog state poisoned"))?;
        if g.fail {
            return Err("adc conversion timeout".into());
        }
        g.reads += 1;
        if let Some(v) = g.queued.get_mut(&channel).and_then(VecDeque::pop_front) {
            return Ok(v);
        }
        Ok(g.fixed.get(&channel).copied().unwrap_or(0))
    }
}

/// Watchdog that counts refreshes.
#[derive(Debug, Clone, Default)]
pub struct CountingWatchdog {
    count: Arc<AtomicUsize>,
}

impl CountingWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl Watchdog for CountingWatchdog {
    fn refresh(&mut self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Console that keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Remove and return everything written so far.
    pub fn take(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|mut g| std::mem::take(&mut *g))
            .unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl Console for MemoryConsole {
    fn line(&mut self, text: &str) {
        if let Ok(mut g) = self.lines.lock() {
            g.push(text.to_string());
        }
    }
}
