use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use bookgrab_core::{origin_of, DownloadMode, ProgressMessage, SessionSlot, SessionView};
use grab_logging::{grab_info, grab_warn};
use tokio_util::sync::CancellationToken;

use crate::adapter::{collapsed_assets, collapsed_label, collapsed_title, AdapterRegistry};
use crate::filename::default_output_path;
use crate::traverse::{Batch, Collaborators, Runner};
use crate::{
    AcquireError, AcquireSettings, AssemblySummary, AssetFetcher, BrowsingSurface, DocumentWriter,
    OutputPrompt, PdfAssembler, ProgressSink,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Completed {
        summary: AssemblySummary,
        session: SessionView,
    },
    /// The user declined to choose an output path.
    Cancelled,
}

/// Entry point for acquisitions on one host window. At most one session
/// runs at a time; a second request is rejected with [`AcquireError::Busy`].
pub struct BookDownloader<W: DocumentWriter = PdfAssembler> {
    surface: Arc<dyn BrowsingSurface>,
    fetcher: Arc<dyn AssetFetcher>,
    prompt: Arc<dyn OutputPrompt>,
    progress: Arc<dyn ProgressSink>,
    registry: AdapterRegistry,
    settings: AcquireSettings,
    slot: SessionSlot,
    cancel: CancellationToken,
    output_dir: PathBuf,
    writer: PhantomData<fn() -> W>,
}

impl BookDownloader {
    pub fn new(
        surface: Arc<dyn BrowsingSurface>,
        fetcher: Arc<dyn AssetFetcher>,
        prompt: Arc<dyn OutputPrompt>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            surface,
            fetcher,
            prompt,
            progress,
            registry: AdapterRegistry::builtin(),
            settings: AcquireSettings::default(),
            slot: SessionSlot::new(),
            cancel: CancellationToken::new(),
            output_dir: PathBuf::from("."),
            writer: PhantomData,
        }
    }
}

impl<W: DocumentWriter> BookDownloader<W> {
    /// Switches the output document implementation.
    pub fn with_writer<V: DocumentWriter>(self) -> BookDownloader<V> {
        BookDownloader {
            surface: self.surface,
            fetcher: self.fetcher,
            prompt: self.prompt,
            progress: self.progress,
            registry: self.registry,
            settings: self.settings,
            slot: self.slot,
            cancel: self.cancel,
            output_dir: self.output_dir,
            writer: PhantomData,
        }
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_settings(mut self, settings: AcquireSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Shares the busy flag with other users of the same host window.
    pub fn with_slot(mut self, slot: SessionSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Sessions run under child tokens of `token`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Directory the suggested output path points into.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Cancelling this token stops the running session and any later one.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn slot(&self) -> &SessionSlot {
        &self.slot
    }

    /// False while a download runs; hosts refuse user navigation then.
    pub fn can_navigate(&self) -> bool {
        !self.slot.is_busy()
    }

    pub async fn acquire_current_page(&self) -> Result<AcquireOutcome, AcquireError> {
        self.acquire(DownloadMode::CurrentPage).await
    }

    pub async fn acquire_whole_book(&self) -> Result<AcquireOutcome, AcquireError> {
        self.acquire(DownloadMode::WholeBook).await
    }

    async fn acquire(&self, mode: DownloadMode) -> Result<AcquireOutcome, AcquireError> {
        let _guard = self.slot.try_acquire()?;
        let cancel = self.cancel.child_token();

        let current = self.surface.current_url().await?;
        let origin = origin_of(&current).unwrap_or_else(|| current.clone());
        let adapter = self
            .registry
            .select(&origin)
            .ok_or_else(|| AcquireError::UnsupportedProvider {
                origin: origin.clone(),
            })?;

        let snapshots = self.surface.snapshots().await?;
        let assets = collapsed_assets(adapter.as_ref(), &snapshots, self.fetcher.as_ref()).await?;
        if assets.is_empty() {
            return Err(AcquireError::NoContentFound);
        }
        let first_batch = Batch {
            assets,
            label: collapsed_label(adapter.as_ref(), &snapshots),
        };

        self.progress.report(&ProgressMessage::SelectLocation);
        let title = collapsed_title(adapter.as_ref(), &snapshots);
        let suggested = default_output_path(&self.output_dir, title.as_deref());
        let Some(path) = self.prompt.choose_output_path(&suggested) else {
            grab_info!("output path declined");
            self.progress.report(&ProgressMessage::Cancelled);
            if let Err(err) = self.surface.reload().await {
                grab_warn!("host reload failed: {}", err);
            }
            return Ok(AcquireOutcome::Cancelled);
        };

        self.progress.report(&ProgressMessage::CreateFile);
        let writer = W::begin(&path, title.as_deref().unwrap_or("eBook"))?;
        grab_info!("{:?} download of {} into {}", mode, current, path.display());

        let collaborators = Collaborators {
            surface: self.surface.as_ref(),
            adapter: adapter.as_ref(),
            fetcher: self.fetcher.as_ref(),
            progress: self.progress.as_ref(),
            settings: &self.settings,
            cancel: &cancel,
        };
        let mut runner = Runner::new(collaborators, writer);
        if mode == DownloadMode::CurrentPage {
            runner = runner.with_preloaded(first_batch);
        }
        let (summary, session) = runner.run(mode).await?;
        Ok(AcquireOutcome::Completed { summary, session })
    }
}

impl<W: DocumentWriter> std::fmt::Debug for BookDownloader<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookDownloader")
            .field("registry", &self.registry)
            .field("busy", &self.slot.is_busy())
            .finish()
    }
}
