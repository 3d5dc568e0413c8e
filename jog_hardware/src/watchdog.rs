//! Linux `/dev/watchdog` keepalive.
//!
//! Any write pets the timer. Writing `V` right before close is the "magic
//! close" that disarms it, so a clean shutdown does not reboot the board.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use jog_traits::Watchdog;

use crate::error::{HwError, Result};

pub struct DevWatchdog {
    file: File,
    path: PathBuf,
    refreshes: u64,
}

impl DevWatchdog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| HwError::Watchdog(format!("open {}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), "watchdog armed");
        Ok(Self {
            file,
            path,
            refreshes: 0,
        })
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl Watchdog for DevWatchdog {
    fn refresh(&mut self) {
        match self.file.write_all(b"\0").and_then(|()| self.file.flush()) {
            Ok(()) => self.refreshes += 1,
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "watchdog keepalive failed"),
        }
    }
}

impl Drop for DevWatchdog {
    fn drop(&mut self) {
        if let Err(e) = self.file.write_all(b"V").and_then(|()| self.file.flush()) {
            tracing::warn!(error = %e, "watchdog magic close failed; board may reset");
        } else {
            tracing::debug!(refreshes = self.refreshes, "watchdog disarmed");
        }
    }
}
