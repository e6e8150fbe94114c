//! Bounded download scheduler
//!
//! One task per download item, all spawned at once; binary fetches are gated
//! by a counting semaphore sized to the configured concurrency limit. Text and
//! link appends are not gated.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;

use super::item::{ItemContext, ItemOutcome, process_item};
use crate::credentials::SharedCredential;
use crate::error::{Error, Result};
use crate::provider::{ContentProvider, FileIdResolver};
use crate::types::{BatchReport, DownloadItem, Event, ItemFailure};

/// Runs a batch of download items with at most `max_concurrency` binary fetches in flight
pub struct BatchScheduler {
    content: Arc<dyn ContentProvider>,
    resolver: Arc<dyn FileIdResolver>,
    max_concurrency: usize,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl BatchScheduler {
    /// Create a scheduler; a zero concurrency limit is rejected here, before any task exists
    pub fn new(
        content: Arc<dyn ContentProvider>,
        resolver: Arc<dyn FileIdResolver>,
        max_concurrency: usize,
    ) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(Error::config(
                "max_concurrent_downloads",
                "max_concurrent_downloads must be at least 1",
            ));
        }
        Ok(Self {
            content,
            resolver,
            max_concurrency,
            event_tx: None,
        })
    }

    /// Emit per-item events on `event_tx`
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Concurrency limit of binary fetches
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run every item to completion and aggregate the outcome.
    ///
    /// Per-item failures, including panics, are recorded in the report and never
    /// stop sibling items. Returns only after every task has finished.
    pub async fn run(&self, items: Vec<DownloadItem>, credential: SharedCredential) -> BatchReport {
        let mut report = BatchReport {
            items_total: items.len(),
            ..Default::default()
        };
        let fetch_slots = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<(PathBuf, ItemResult)> = JoinSet::new();

        for item in items {
            let ctx = ItemContext {
                content: self.content.clone(),
                resolver: self.resolver.clone(),
                fetch_slots: fetch_slots.clone(),
                credential: credential.clone(),
            };
            let folder = item.folder_path.clone();
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(process_item(ctx, item))
                    .catch_unwind()
                    .await
                    .map_err(|panic| panic_message(panic.as_ref()));
                (folder, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((folder, Ok(outcome))) => self.record(&mut report, folder, outcome),
                Ok((folder, Err(message))) => {
                    tracing::error!(?folder, panic = %message, "download task panicked");
                    self.record_failure(&mut report, folder, format!("task panicked: {}", message));
                }
                Err(e) => {
                    tracing::error!(error = %e, "download task did not complete");
                    self.record_failure(&mut report, PathBuf::new(), format!("task aborted: {}", e));
                }
            }
        }

        tracing::info!(
            items = report.items_total,
            succeeded = report.items_succeeded,
            failed = report.items_failed,
            files = report.files_downloaded,
            links = report.links_saved,
            "download batch finished"
        );
        report
    }

    fn record(&self, report: &mut BatchReport, folder: PathBuf, outcome: ItemOutcome) {
        report.files_downloaded += outcome.files_downloaded;
        report.links_saved += outcome.links_saved;

        match outcome.errors.into_iter().next() {
            None => {
                report.items_succeeded += 1;
                self.emit(Event::ItemCompleted { folder });
            }
            Some(first) => self.record_failure(report, folder, first),
        }
    }

    fn record_failure(&self, report: &mut BatchReport, folder: PathBuf, error: String) {
        report.items_failed += 1;
        report.failures.push(ItemFailure {
            folder: folder.clone(),
            error: error.clone(),
        });
        self.emit(Event::ItemFailed { folder, error });
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }
}

type ItemResult = std::result::Result<ItemOutcome, String>;

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
