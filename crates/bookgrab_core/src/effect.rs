use crate::ProgressMessage;

/// Work the runner must perform against the host, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Report(ProgressMessage),
    /// Rewrite the `page` parameter of the current address and load it.
    Navigate { index: i64 },
    /// Best-effort courtesy navigation back to the provider's default page.
    ResetNavigation,
    AwaitReady,
    Extract,
    /// Normalize and append the held batch, page by page.
    AppendBatch,
    /// Drop the held batch without appending it.
    DiscardBatch,
    Finalize,
    ReloadHost,
}
