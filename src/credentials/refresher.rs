//! Background credential renewal bound to one download batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::{CredentialStore, SharedCredential, TokenRefresher};
use crate::types::{Event, SessionId};

/// Parameters for spawning a credential refresher
pub struct CredentialRefresherParams {
    /// Session whose credential is renewed
    pub session: SessionId,
    /// Credential read by the batch workers
    pub credential: SharedCredential,
    /// Identity-provider client
    pub refresher: Arc<dyn TokenRefresher>,
    /// Store that receives every renewed credential
    pub store: Arc<dyn CredentialStore>,
    /// Time between renewals; the first renewal happens one interval after start
    pub interval: Duration,
    /// Event broadcast sender
    pub event_tx: broadcast::Sender<Event>,
    /// Cancellation token of the batch
    pub cancel_token: CancellationToken,
}

/// Running refresher; cancelling happens on [`stop`](Self::stop) or on drop
pub struct RefresherHandle {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
    _guard: DropGuard,
}

impl RefresherHandle {
    /// Signal the refresher to stop and wait until it has exited
    pub async fn stop(self) {
        let RefresherHandle {
            cancel_token,
            handle,
            _guard,
        } = self;
        cancel_token.cancel();
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "credential refresher did not exit cleanly");
        }
    }

    /// Whether the refresher task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawn a task that renews the batch credential every `interval` until cancelled.
///
/// Failures are logged and reported as [`Event::CredentialRefreshFailed`]; the
/// previous token stays in place and the loop keeps running. Cancellation is
/// only observed between renewals: a renewal in flight is finished, persist included.
pub fn spawn_credential_refresher(params: CredentialRefresherParams) -> RefresherHandle {
    let CredentialRefresherParams {
        session,
        credential,
        refresher,
        store,
        interval,
        event_tx,
        cancel_token,
    } = params;

    let guard = cancel_token.clone().drop_guard();
    let task_token = cancel_token.clone();

    let handle = tokio::spawn(async move {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    break;
                }
                _ = ticker.tick() => {
                    // Runs to completion so a swapped-in token is always persisted
                    refresh_once(&session, &credential, refresher.as_ref(), store.as_ref(), &event_tx).await;
                }
            }
        }

        tracing::debug!(session = %session, "credential refresher stopped");
    });

    RefresherHandle {
        cancel_token,
        handle,
        _guard: guard,
    }
}

async fn refresh_once(
    session: &SessionId,
    credential: &SharedCredential,
    refresher: &dyn TokenRefresher,
    store: &dyn CredentialStore,
    event_tx: &broadcast::Sender<Event>,
) {
    let current = credential.snapshot().await;
    match refresher.refresh(&current).await {
        Ok(renewed) => {
            let expiry = renewed.expiry;
            credential.replace(renewed.clone()).await;
            if let Err(e) = store.persist_refreshed(session, &renewed).await {
                tracing::error!(session = %session, error = %e, "failed to persist refreshed credential");
            }
            tracing::info!(session = %session, ?expiry, "access token refreshed");
            event_tx.send(Event::CredentialRefreshed { expiry }).ok();
        }
        Err(e) => {
            tracing::warn!(session = %session, error = %e, "access token refresh failed");
            event_tx
                .send(Event::CredentialRefreshFailed {
                    error: e.to_string(),
                })
                .ok();
        }
    }
}
