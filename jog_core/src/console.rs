//! Operator-facing diagnostic channel.
//!
//! This is the text the person at the serial terminal reads (command echoes,
//! thermistor readings, tracking status). It is separate from
//! `tracing`, which carries the structured log.

pub trait Console {
    fn line(&mut self, text: &str);
}

impl<T: Console + ?Sized> Console for Box<T> {
    fn line(&mut self, text: &str) {
        (**self).line(text);
    }
}

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&mut self, text: &str) {
        use std::io::Write;
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

/// Appends every line to a transcript file and forwards it to an inner console.
///
/// The file is opened once in `new`. If it cannot be opened, or a later
/// write fails, the failure is logged and lines still reach `inner`.
pub struct TranscriptConsole<C> {
    path: String,
    file: Option<std::fs::File>,
    inner: C,
}

impl<C: Console> TranscriptConsole<C> {
    pub fn new(path: String, inner: C) -> Self {
        let file = match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "transcript open failed");
                None
            }
        };
        Self { path, file, inner }
    }
}

impl<C: Console> Console for TranscriptConsole<C> {
    fn line(&mut self, text: &str) {
        use std::io::Write;
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = writeln!(file, "{text}") {
                tracing::warn!(path = %self.path, error = %e, "transcript write failed");
            }
        }
        self.inner.line(text);
    }
}
