//! Logging utilities
//!
//! Tracing subscriber setup plus a size-based rotating file writer used for
//! the optional JSON log file.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Default maximum log file size (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of log files kept, including the live one
pub const DEFAULT_MAX_FILES: usize = 5;

// ============================================================================
// Subscriber Setup
// ============================================================================

/// Install the global tracing subscriber
///
/// JSON events go to stderr, filtered by `RUST_LOG` or `log_level`. When
/// `log_file` is set, the same events are also appended to a rotating file.
pub fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    let console_layer = fmt::layer()
        .json()
        .with_writer(io::stderr)
        .with_filter(build_filter(log_level));

    let file_layer = match log_file {
        Some(path) => {
            let writer = RotatingFileWriter::with_defaults(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(build_filter(log_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(path) = log_file {
        tracing::info!(
            path = %path.display(),
            max_file_size = DEFAULT_MAX_FILE_SIZE,
            max_files = DEFAULT_MAX_FILES,
            "Logging to file"
        );
    }

    Ok(())
}

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

// ============================================================================
// Rotating File Writer
// ============================================================================

/// A size-based rotating file writer
///
/// When a write would push the live file past `max_size`, it is renamed to
/// `<name>.1`, older files shift up by one, and anything past `max_files`
/// is deleted. Clones share the same underlying file.
#[derive(Debug, Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<WriterState>>,
}

#[derive(Debug)]
struct WriterState {
    base_path: PathBuf,
    file: Option<File>,
    current_size: u64,
    max_size: u64,
    max_files: usize,
}

impl RotatingFileWriter {
    /// Create a writer appending to `path`
    ///
    /// # Arguments
    /// * `path` - Live log file (e.g., logs/rotator.log)
    /// * `max_size` - Size in bytes that triggers rotation
    /// * `max_files` - Files kept in total, including the live one
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let current_size = fs::metadata(&base_path).map(|m| m.len()).unwrap_or(0);
        let file = open_append(&base_path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(WriterState {
                base_path,
                file: Some(file),
                current_size,
                max_size,
                max_files: max_files.max(1),
            })),
        })
    }

    /// Create a writer with the defaults (10MB, 5 files)
    pub fn with_defaults(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }

    fn state(&self) -> io::Result<MutexGuard<'_, WriterState>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl WriterState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        if self.max_files == 1 {
            fs::remove_file(&self.base_path).ok();
        } else {
            // <name>.{max_files-1} is the oldest kept
            let oldest = self.rotated_path(self.max_files - 1);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.max_files - 1).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            if self.base_path.exists() {
                fs::rename(&self.base_path, self.rotated_path(1))?;
            }
        }

        self.file = Some(open_append(&self.base_path)?);
        self.current_size = 0;
        Ok(())
    }

    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = self
            .base_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}", index));
        self.base_path.with_file_name(name)
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state()?;

        if state.current_size > 0 && state.current_size + buf.len() as u64 > state.max_size {
            state.rotate()?;
        }

        let written = match state.file.as_mut() {
            Some(file) => file.write(buf)?,
            None => return Err(io::Error::new(io::ErrorKind::Other, "Log file not open")),
        };
        state.current_size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.state()?;
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> fmt::MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
