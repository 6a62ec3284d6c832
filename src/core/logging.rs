//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + size-rotated file)
//! - Configuration logging at startup

use anyhow::Result;
use simplelog::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::config;

/// Initialize logger for both console and file output
///
/// Creates the parent directory of the log file if needed.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(log_file_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }

    let log_file = RotatingFile::open(
        log_file_path,
        config::log_file::MAX_BYTES,
        config::log_file::BACKUP_COUNT,
    )
    .map_err(|e| anyhow::anyhow!("Failed to open log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Append-only log file that rolls over to `<path>.1 .. <path>.N` once it
/// grows past `max_bytes`.
///
/// Rotation only happens at a line boundary, so a record is never split
/// across two files.
pub struct RotatingFile {
    path: PathBuf,
    file: fs_err::File,
    written: u64,
    max_bytes: u64,
    backups: usize,
    at_line_start: bool,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            file,
            written,
            max_bytes,
            backups,
            at_line_start: true,
        })
    }

    /// `<path>.<index>`
    fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = fs_err::OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&self.path)?;
        } else {
            for index in (1..self.backups).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs_err::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            fs_err::rename(&self.path, self.rotated_path(1))?;
            self.file = open_append(&self.path)?;
        }

        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.at_line_start && self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }

        let n = self.file.write(buf)?;
        self.written += n as u64;
        if n > 0 {
            self.at_line_start = buf[n - 1] == b'\n';
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<fs_err::File> {
    fs_err::OpenOptions::new().create(true).append(true).open(path)
}

/// Logs the effective configuration at application startup
///
/// Secrets are never logged: only whether the token is present and which
/// database backend the URL selects.
pub fn log_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🎼 Repertuar bot configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_empty() {
        log::error!("❌ BOT_TOKEN: not set");
    } else {
        log::info!("✅ BOT_TOKEN: set");
    }

    match config::DATABASE_URL.as_deref() {
        Some(url) => {
            let scheme = url.split("://").next().unwrap_or_default();
            log::info!("✅ DATABASE_URL: {} backend", scheme);
        }
        None => log::error!("❌ DATABASE_URL: not set"),
    }

    if config::admin::ADMIN_USERNAME.is_empty() {
        log::warn!("⚠️  ADMIN_USERNAME: not set, admin commands are disabled");
    } else {
        log::info!("✅ ADMIN_USERNAME: @{}", config::admin::ADMIN_USERNAME.as_str());
    }

    match *config::admin::ADMIN_CHAT_ID {
        Some(chat_id) => log::info!("✅ ADMIN_CHAT_ID: {}", chat_id),
        None => log::info!("ADMIN_CHAT_ID: not set, song requests go to the admin's last chat"),
    }

    log::info!("Backups directory: {}", config::BACKUP_DIR.as_str());
    log::info!("Conversation timeout: {}s", *config::conversation::TTL_SECS);
}
