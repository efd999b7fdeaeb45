#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Runner is ready; the traversal leaves `Init`.
    Start,
    /// Host finished loading the requested address.
    NavigationDone,
    /// Readiness polling settled. `timed_out` is informational only.
    ReadinessSettled { timed_out: bool },
    /// Extraction produced a batch. `fingerprint` is the source URI of the
    /// first asset, `None` when the batch is empty.
    BatchExtracted {
        fingerprint: Option<String>,
        pages: usize,
    },
    /// Every page of the held batch reached the output document.
    BatchAppended,
    /// The output document was finalized.
    Finalized,
    /// A fatal error occurred anywhere in the pipeline.
    Failed,
    /// The executed effect has no follow-up message.
    NoOp,
}
