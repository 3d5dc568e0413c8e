//! Non-blocking serial source over any blocking reader.
//!
//! A background thread owns the reader and forwards chunks through a bounded
//! channel; the tick loop only ever polls. When the reader reaches EOF the
//! channel disconnects and, once buffered bytes are consumed, the source
//! reports itself closed.
use crossbeam_channel as xch;
use jog_traits::SerialSource;
use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Chunks buffered between reader thread and tick loop.
pub const DEFAULT_CHUNKS: usize = 64;
const CHUNK_BYTES: usize = 64;

pub struct ByteFeeder {
    rx: xch::Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    disconnected: bool,
    bytes_read: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl ByteFeeder {
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_CHUNKS)
    }

    pub fn with_capacity<R: Read + Send + 'static>(mut reader: R, chunks: usize) -> Self {
        let (tx, rx) = xch::bounded::<Vec<u8>>(chunks.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let bytes_read = Arc::new(AtomicU64::new(0));
        let bytes_clone = bytes_read.clone();

        let join_handle = std::thread::spawn(move || {
            let mut buf = [0u8; CHUNK_BYTES];
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("feeder thread received shutdown signal");
                    break;
                }
                match reader.read(&mut buf) {
                    Ok(0) => {
                        tracing::debug!("feeder reached end of input");
                        break;
                    }
                    Ok(n) => {
                        bytes_clone.fetch_add(n as u64, Ordering::Relaxed);
                        // Consumer gone; nothing left to feed
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "feeder read failed");
                        break;
                    }
                }
            }
            tracing::trace!("feeder thread exiting");
        });

        Self {
            rx,
            pending: VecDeque::new(),
            disconnected: false,
            bytes_read,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Bytes pulled from the reader so far (including not yet consumed ones).
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    fn refill(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(xch::TryRecvError::Empty) => break,
                Err(xch::TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
    }
}

impl SerialSource for ByteFeeder {
    fn read_byte(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            self.refill();
        }
        self.pending.pop_front()
    }

    fn is_closed(&self) -> bool {
        self.disconnected && self.pending.is_empty()
    }
}

impl Drop for ByteFeeder {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // A reader blocked in read() (stdin, a tty) cannot be interrupted; only
        // join a thread that has already finished and detach the rest.
        if let Some(handle) = self.join_handle.take() {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    tracing::warn!(?e, "feeder thread panicked");
                }
            } else {
                tracing::trace!("feeder thread detached");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn drain_until_closed(feeder: &mut ByteFeeder) -> Vec<u8> {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut out = Vec::new();
        while !feeder.is_closed() && Instant::now() < deadline {
            match feeder.read_byte() {
                Some(b) => out.push(b),
                None => std::thread::sleep(Duration::from_millis(1)),
            }
        }
        out
    }

    #[test]
    fn forwards_every_byte_then_closes() {
        let input: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let mut feeder = ByteFeeder::with_capacity(Cursor::new(input.clone()), 2);
        let got = drain_until_closed(&mut feeder);
        assert_eq!(got, input);
        assert!(feeder.is_closed());
        assert_eq!(feeder.bytes_read(), 1000);
    }

    #[test]
    fn empty_reader_closes() {
        let mut feeder = ByteFeeder::spawn(Cursor::new(Vec::new()));
        assert!(drain_until_closed(&mut feeder).is_empty());
        assert!(feeder.is_closed());
    }
}
