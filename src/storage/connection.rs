//! Single owned database connection with ping-and-reconnect.
//!
//! Two states: disconnected (`None`) and connected (`Some`). Every operation
//! goes through [`ConnectionSlot::connect_if_need`], which pings a held
//! connection and reconnects when the ping fails or nothing is held. The
//! returned guard keeps the connection locked for the whole operation.

use sqlx::{ConnectOptions, Connection};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use super::error::{StorageError, StorageResult};

pub(crate) struct ConnectionSlot<C: Connection> {
    options: <C as Connection>::Options,
    conn: Mutex<Option<C>>,
    backend: &'static str,
}

impl<C: Connection> ConnectionSlot<C> {
    pub fn new(options: <C as Connection>::Options, backend: &'static str) -> Self {
        Self {
            options,
            conn: Mutex::new(None),
            backend,
        }
    }

    /// Returns a live connection, reconnecting if needed.
    pub async fn connect_if_need(&self) -> StorageResult<MappedMutexGuard<'_, C>> {
        let mut guard = self.conn.lock().await;

        let alive = match guard.as_mut() {
            Some(conn) => match conn.ping().await {
                Ok(()) => true,
                Err(e) => {
                    log::error!("Error checking {} connection: {}", self.backend, e);
                    false
                }
            },
            None => false,
        };

        if !alive {
            log::info!("Connecting to {} database", self.backend);
            let conn = self.options.connect().await?;
            *guard = Some(conn);
            log::info!("Connection to {} database established", self.backend);
        }

        MutexGuard::try_map(guard, Option::as_mut).map_err(|_| StorageError::NotConnected)
    }

    /// Closes the held connection, leaving the slot disconnected
    pub async fn close(&self) {
        let conn = self.conn.lock().await.take();
        if let Some(conn) = conn {
            match conn.close().await {
                Ok(()) => log::info!("Closed {} connection", self.backend),
                Err(e) => log::warn!("Failed to close {} connection cleanly: {}", self.backend, e),
            }
        }
    }
}
