//! Effect runner: drives the pure traversal state machine against the
//! browsing surface, the adapter and the output document.
use std::collections::VecDeque;
use std::time::Duration;

use bookgrab_core::{
    batch_labels, page_address, page_number, update, DownloadMode, Effect, Msg, ProgressMessage,
    SessionView, TraversalState,
};
use grab_logging::{grab_debug, grab_error, grab_info, grab_warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::adapter::{any_ready, collapsed_assets, collapsed_label, SiteAdapter};
use crate::{
    AcquireError, AssembleError, AssemblySummary, AssetFetcher, BrowsingSurface, DocumentWriter,
    FetchSettings, HostError, Normalizer, ProgressSink, RawAsset,
};

#[derive(Debug, Clone)]
pub struct AcquireSettings {
    /// Interval between readiness checks.
    pub poll_interval: Duration,
    /// Upper bound for one readiness wait. Extraction proceeds when it elapses.
    pub ready_timeout: Duration,
    pub fetch: FetchSettings,
}

impl Default for AcquireSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            ready_timeout: Duration::from_secs(60),
            fetch: FetchSettings::default(),
        }
    }
}

/// Assets of one navigation step plus the label shown while it was extracted.
#[derive(Debug, Clone, Default)]
pub(crate) struct Batch {
    pub assets: Vec<RawAsset>,
    pub label: Option<String>,
}

pub(crate) struct Collaborators<'a> {
    pub surface: &'a dyn BrowsingSurface,
    pub adapter: &'a dyn SiteAdapter,
    pub fetcher: &'a dyn AssetFetcher,
    pub progress: &'a dyn ProgressSink,
    pub settings: &'a AcquireSettings,
    pub cancel: &'a CancellationToken,
}

pub(crate) struct Runner<'a, W: DocumentWriter> {
    with: Collaborators<'a>,
    writer: Option<W>,
    normalizer: Normalizer,
    preloaded: Option<Batch>,
    held: Batch,
    summary: Option<AssemblySummary>,
}

impl<'a, W: DocumentWriter> Runner<'a, W> {
    pub fn new(with: Collaborators<'a>, writer: W) -> Self {
        Self {
            with,
            writer: Some(writer),
            normalizer: Normalizer::new(),
            preloaded: None,
            held: Batch::default(),
            summary: None,
        }
    }

    /// Serves the first extraction from an already extracted batch.
    pub fn with_preloaded(mut self, batch: Batch) -> Self {
        self.preloaded = Some(batch);
        self
    }

    pub async fn run(
        mut self,
        mode: DownloadMode,
    ) -> Result<(AssemblySummary, SessionView), AcquireError> {
        let mut queue: VecDeque<Effect> = VecDeque::new();
        let mut failure: Option<AcquireError> = None;

        let (mut state, effects) = update(TraversalState::new(mode), Msg::Start);
        queue.extend(effects);

        while let Some(effect) = queue.pop_front() {
            let aborted = state.phase().is_terminal();
            let result = if !aborted && self.with.cancel.is_cancelled() {
                Err(AcquireError::Cancelled)
            } else {
                self.execute(effect).await
            };

            let msg = match result {
                Ok(msg) => msg,
                Err(err) if aborted => {
                    grab_warn!("cleanup after failure did not complete: {}", err);
                    continue;
                }
                Err(err) => {
                    grab_error!("download aborted: {}", err);
                    queue.clear();
                    failure = Some(err);
                    Msg::Failed
                }
            };
            if msg == Msg::NoOp {
                continue;
            }
            let (next, effects) = update(state, msg);
            state = next;
            queue.extend(effects);
        }

        if let Some(err) = failure {
            if matches!(err, AcquireError::Cancelled) {
                self.with.progress.report(&ProgressMessage::Cancelled);
            }
            return Err(err);
        }
        let view = state.view();
        grab_info!(
            "traversal finished: {} pages, stop reason {:?}",
            view.pages_appended,
            view.stop_reason
        );
        let summary = self.summary.ok_or(AcquireError::NoContentFound)?;
        Ok((summary, view))
    }

    async fn execute(&mut self, effect: Effect) -> Result<Msg, AcquireError> {
        match effect {
            Effect::Report(message) => {
                self.with.progress.report(&message);
                Ok(Msg::NoOp)
            }
            Effect::Navigate { index } => {
                self.navigate_to(Some(index)).await?;
                Ok(Msg::NavigationDone)
            }
            Effect::ResetNavigation => {
                if let Err(err) = self.navigate_to(None).await {
                    grab_warn!("could not return to the first page: {}", err);
                }
                Ok(Msg::NoOp)
            }
            Effect::AwaitReady => self.await_ready().await,
            Effect::Extract => self.extract().await,
            Effect::AppendBatch => {
                self.append_held().await?;
                Ok(Msg::BatchAppended)
            }
            Effect::DiscardBatch => {
                grab_debug!("discarding repeated batch of {} pages", self.held.assets.len());
                self.held = Batch::default();
                Ok(Msg::NoOp)
            }
            Effect::Finalize => {
                let Some(writer) = self.writer.take() else {
                    return Ok(Msg::NoOp);
                };
                self.summary = Some(writer.finalize()?);
                Ok(Msg::Finalized)
            }
            Effect::ReloadHost => {
                if let Err(err) = self.with.surface.reload().await {
                    grab_warn!("host reload failed: {}", err);
                }
                Ok(Msg::NoOp)
            }
        }
    }

    async fn navigate_to(&self, index: Option<i64>) -> Result<(), AcquireError> {
        let current = self.with.surface.current_url().await?;
        let address = page_address(&current, index).map_err(HostError::from)?;
        grab_info!("navigating to {}", address);
        tokio::select! {
            _ = self.with.cancel.cancelled() => Err(AcquireError::Cancelled),
            result = self.with.surface.navigate(&address) => result.map_err(AcquireError::from),
        }
    }

    async fn await_ready(&self) -> Result<Msg, AcquireError> {
        let deadline = Instant::now() + self.with.settings.ready_timeout;
        loop {
            let snapshots = self.with.surface.snapshots().await?;
            if any_ready(self.with.adapter, &snapshots) {
                return Ok(Msg::ReadinessSettled { timed_out: false });
            }
            if Instant::now() >= deadline {
                grab_warn!(
                    "page not ready after {:?}, extracting anyway",
                    self.with.settings.ready_timeout
                );
                return Ok(Msg::ReadinessSettled { timed_out: true });
            }
            tokio::select! {
                _ = self.with.cancel.cancelled() => return Err(AcquireError::Cancelled),
                _ = tokio::time::sleep(self.with.settings.poll_interval) => {}
            }
        }
    }

    async fn extract(&mut self) -> Result<Msg, AcquireError> {
        let batch = match self.preloaded.take() {
            Some(batch) => batch,
            None => {
                let snapshots = self.with.surface.snapshots().await?;
                let assets =
                    collapsed_assets(self.with.adapter, &snapshots, self.with.fetcher).await?;
                let label = collapsed_label(self.with.adapter, &snapshots);
                Batch { assets, label }
            }
        };
        let fingerprint = batch.assets.first().map(|asset| asset.source_uri.clone());
        let pages = batch.assets.len();
        grab_debug!("extracted {} pages, fingerprint {:?}", pages, fingerprint);
        self.held = batch;
        Ok(Msg::BatchExtracted { fingerprint, pages })
    }

    async fn append_held(&mut self) -> Result<(), AcquireError> {
        let batch = std::mem::take(&mut self.held);
        let labels = batch_labels(batch.label.as_deref(), batch.assets.len());
        for (asset, label) in batch.assets.into_iter().zip(labels) {
            if let Some(label) = &label {
                self.with
                    .progress
                    .report(&ProgressMessage::DownloadingPage(label.clone()));
            }
            let number = label.as_deref().and_then(page_number);
            let page = self
                .normalizer
                .normalize(asset, number, self.with.fetcher)
                .await?;
            let writer = self.writer.as_mut().ok_or_else(|| AssembleError::Closed {
                source_uri: page.source_uri.clone(),
            })?;
            writer.append_page(&page)?;
        }
        Ok(())
    }
}
