//! Flash-filesystem record log.
//!
//! Implements [`RecordLogPort`] with plain `std::fs` files.  Each recording
//! session opens a new numbered file (`0001.log`, `0002.log`, ...) under the
//! log directory and appends one CSV line per record.
//!
//! The directory has a byte budget.  `open()` refuses once the existing
//! logs already use it, and `append()` refuses the first line that would
//! cross it; both report [`StorageError::Full`].
//!
//! On ESP-IDF the directory lives on a SPIFFS partition mounted by
//! [`mount`] before the adapter is used.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::app::ports::RecordLogPort;
use crate::error::StorageError;

/// Mount point of the log partition on target.
pub const LOG_MOUNT: &str = "/logs";

const LOG_EXTENSION: &str = "log";

/// Register the SPIFFS `storage` partition at [`LOG_MOUNT`].
#[cfg(target_os = "espidf")]
pub fn mount() -> Result<(), StorageError> {
    use esp_idf_svc::sys::*;

    let conf = esp_vfs_spiffs_conf_t {
        base_path: b"/logs\0".as_ptr() as *const _,
        partition_label: b"storage\0".as_ptr() as *const _,
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: the strings are static and null-terminated; called once from
    // main before any file access.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK {
        log::error!("record log: SPIFFS mount failed ({})", ret);
        return Err(StorageError::IoError);
    }
    info!("record log: SPIFFS mounted at {}", LOG_MOUNT);
    Ok(())
}

pub struct FileRecordLog {
    dir: PathBuf,
    max_bytes: u64,
    used: u64,
    current: Option<(PathBuf, BufWriter<File>)>,
}

impl FileRecordLog {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: u32) -> Self {
        Self {
            dir: dir.into(),
            max_bytes: u64::from(max_bytes),
            used: 0,
            current: None,
        }
    }

    /// Path of the log being written, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|(p, _)| p.as_path())
    }

    /// Bytes used by all logs in the directory, as of the last open/append.
    pub fn used_bytes(&self) -> u64 {
        self.used
    }

    fn log_files(&self) -> Result<Vec<(u32, u64)>, StorageError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            warn!("record log: cannot list {}: {}", self.dir.display(), e);
            StorageError::IoError
        })?;
        let mut logs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|x| x.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            let Some(n) = path.file_stem().and_then(|s| s.to_str()).and_then(|s| s.parse().ok())
            else {
                continue;
            };
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            logs.push((n, len));
        }
        Ok(logs)
    }
}

impl RecordLogPort for FileRecordLog {
    fn open(&mut self) -> Result<(), StorageError> {
        self.close();
        fs::create_dir_all(&self.dir).map_err(|_| StorageError::IoError)?;

        let logs = self.log_files()?;
        self.used = logs.iter().map(|(_, len)| len).sum();
        if self.used >= self.max_bytes {
            warn!("record log: {} of {} bytes used, not logging", self.used, self.max_bytes);
            return Err(StorageError::Full);
        }

        let next = logs.iter().map(|(n, _)| n + 1).max().unwrap_or(1);
        let path = self.dir.join(format!("{:04}.{}", next, LOG_EXTENSION));
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                warn!("record log: cannot create {}: {}", path.display(), e);
                StorageError::IoError
            })?;
        info!("record log: writing {}", path.display());
        self.current = Some((path, BufWriter::new(file)));
        Ok(())
    }

    fn append(&mut self, line: &str) -> Result<(), StorageError> {
        let Some((_, writer)) = self.current.as_mut() else {
            return Err(StorageError::NotFound);
        };
        let len = line.len() as u64 + 1;
        if self.used + len > self.max_bytes {
            info!("record log: full after {} bytes", self.used);
            return Err(StorageError::Full);
        }
        writeln!(writer, "{}", line).map_err(|e| {
            debug!("record log: write failed: {}", e);
            StorageError::IoError
        })?;
        self.used += len;
        Ok(())
    }

    fn close(&mut self) {
        if let Some((path, mut writer)) = self.current.take() {
            if let Err(e) = writer.flush() {
                warn!("record log: flush of {} failed: {}", path.display(), e);
            }
            info!("record log: closed {}", path.display());
        }
    }
}

impl Drop for FileRecordLog {
    fn drop(&mut self) {
        self.close();
    }
}
