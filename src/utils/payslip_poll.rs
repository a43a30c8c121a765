//! Read-after-write poll for generated payslips.
//!
//! Generation runs asynchronously on the backend, so right after asking for a
//! payslip it usually cannot be read yet. The poll reads it a bounded number of
//! times with a fixed pause in between. Each running poll is registered under
//! its [`PollKey`] and can be aborted: by the user leaving the screen, by
//! logout, or by a newer generation of the same payslip.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::session::Session,
    backend::HrApi,
    config::Config,
    error::{PortalError, PortalResult},
    model::payslip::{Payslip, PayslipFetch, PayslipPeriod},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    /// pause between two attempts; none after the last one
    pub delay: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.payslip_poll_attempts.max(1),
            delay: config.payslip_poll_delay(),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

/// Reads the payslip until it is ready or `policy.attempts` reads have been made.
///
/// A read that fails (transport error, 404 while the row does not exist yet,
/// 5xx) counts as an unsuccessful attempt. Losing the session (401/403) ends
/// the loop at once since retrying cannot help.
pub async fn poll_payslip(
    api: &dyn HrApi,
    session: &Session,
    employee_id: u64,
    period: PayslipPeriod,
    policy: PollPolicy,
) -> PortalResult<Payslip> {
    for attempt in 1..=policy.attempts {
        match api.fetch_payslip(session, employee_id, period).await {
            Ok(PayslipFetch {
                ready: true,
                payslip: Some(payslip),
            }) => {
                info!(employee_id, %period, attempt, "payslip ready");
                return Ok(payslip);
            }
            Ok(_) => debug!(employee_id, %period, attempt, "payslip not ready yet"),
            Err(e @ (PortalError::Unauthorized { .. } | PortalError::Forbidden { .. })) => {
                return Err(e);
            }
            Err(e) => warn!(employee_id, %period, attempt, error = %e, "payslip read failed"),
        }

        if attempt < policy.attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    warn!(employee_id, %period, attempts = policy.attempts, "payslip still not available");
    Err(PortalError::NotYetReady {
        message: format!(
            "Payslip for {period} is not available yet, tried {} times",
            policy.attempts
        ),
    })
}

/// Identifies one running poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollKey {
    pub session_id: Uuid,
    pub employee_id: u64,
    pub period: PayslipPeriod,
}

/// Abort handles of the polls currently running.
#[derive(Default)]
pub struct PollRegistry {
    running: Mutex<HashMap<PollKey, (u64, AbortHandle)>>,
    next_ticket: AtomicU64,
}

/// Removes the registration when the poll ends, however it ends.
pub struct PollGuard<'a> {
    registry: &'a PollRegistry,
    key: PollKey,
    ticket: u64,
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        let mut running = self.registry.running.lock();
        // A newer poll for the same key may have replaced this one.
        if running.get(&self.key).map(|(t, _)| *t) == Some(self.ticket) {
            running.remove(&self.key);
        }
    }
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a poll. An older poll under the same key is aborted.
    pub fn register(&self, key: PollKey) -> (AbortRegistration, PollGuard<'_>) {
        let (handle, registration) = AbortHandle::new_pair();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        if let Some((_, previous)) = self.running.lock().insert(key, (ticket, handle)) {
            debug!(employee_id = key.employee_id, period = %key.period, "superseding running poll");
            previous.abort();
        }
        (
            registration,
            PollGuard {
                registry: self,
                key,
                ticket,
            },
        )
    }

    /// Aborts the poll for `key`. Returns whether one was running.
    pub fn cancel(&self, key: &PollKey) -> bool {
        match self.running.lock().remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every poll started from `session_id`. Returns how many there were.
    pub fn cancel_session(&self, session_id: Uuid) -> usize {
        let mut running = self.running.lock();
        let keys: Vec<PollKey> = running
            .keys()
            .filter(|k| k.session_id == session_id)
            .copied()
            .collect();
        for key in &keys {
            if let Some((_, handle)) = running.remove(key) {
                handle.abort();
            }
        }
        keys.len()
    }

    pub fn is_running(&self, key: &PollKey) -> bool {
        self.running.lock().contains_key(key)
    }

    /// Runs `poll` under `key` until it finishes or is cancelled.
    pub async fn run<F, T>(&self, key: PollKey, poll: F) -> PortalResult<T>
    where
        F: Future<Output = PortalResult<T>>,
    {
        let (registration, _guard) = self.register(key);
        match Abortable::new(poll, registration).await {
            Ok(result) => result,
            Err(_aborted) => {
                info!(employee_id = key.employee_id, period = %key.period, "payslip poll cancelled");
                Err(PortalError::Cancelled)
            }
        }
    }
}
