//! Bounded pool of oracle sessions
//!
//! Each analysis request leases one session for its whole game, so the two
//! queries per ply always go to the same engine and no engine ever sees two
//! requests at once.

use std::sync::{Arc, Mutex};

use game_review_core::{Oracle, OracleError};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

pub type OracleSession = Box<dyn Oracle + Send>;
pub type SessionFactory = Arc<dyn Fn() -> Result<OracleSession, OracleError> + Send + Sync>;

pub struct EnginePool {
    factory: SessionFactory,
    idle: Mutex<Vec<OracleSession>>,
    permits: Arc<Semaphore>,
}

impl EnginePool {
    pub fn new(size: usize, factory: SessionFactory) -> Arc<Self> {
        Arc::new(Self {
            factory,
            idle: Mutex::new(Vec::with_capacity(size)),
            permits: Arc::new(Semaphore::new(size)),
        })
    }

    /// Waits for a free slot. The session itself is started lazily.
    pub async fn acquire(self: &Arc<Self>) -> Result<Lease, AcquireError> {
        let permit = self.permits.clone().acquire_owned().await?;
        let session = self.idle.lock().ok().and_then(|mut idle| idle.pop());

        Ok(Lease {
            pool: Arc::clone(self),
            session,
            _permit: permit,
        })
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    /// Drops every idle session, closing their processes.
    pub fn close_idle(&self) {
        if let Ok(mut idle) = self.idle.lock() {
            debug!(sessions = idle.len(), "closing idle engines");
            idle.clear();
        }
    }
}

/// Exclusive use of one session until dropped
pub struct Lease {
    pool: Arc<EnginePool>,
    session: Option<OracleSession>,
    _permit: OwnedSemaphorePermit,
}

impl Lease {
    /// Returns the leased session, starting one if none was idle. Blocks.
    pub fn session(&mut self) -> Result<&mut OracleSession, OracleError> {
        if self.session.is_none() {
            debug!("starting engine session");
            self.session = Some((self.pool.factory)()?);
        }
        self.session.as_mut().ok_or(OracleError::Closed)
    }

    /// Drops the session instead of returning it to the pool.
    pub fn discard(&mut self) {
        if self.session.take().is_some() {
            warn!("discarding engine session after failure");
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if let Ok(mut idle) = self.pool.idle.lock() {
                idle.push(session);
            }
        }
    }
}
