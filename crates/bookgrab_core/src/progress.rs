use std::fmt;

/// One-way, advisory status update for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    SelectLocation,
    CreateFile,
    StartBook,
    LoadNextPage,
    DownloadingCurrentPage,
    /// Page label or number as shown by the provider.
    DownloadingPage(String),
    SaveFile,
    Cancelled,
    Complete,
}

impl fmt::Display for ProgressMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressMessage::SelectLocation => write!(f, "Select storage location to save the PDF ..."),
            ProgressMessage::CreateFile => write!(f, "Create pdf file ..."),
            ProgressMessage::StartBook => write!(f, "Start downloading book ..."),
            ProgressMessage::LoadNextPage => write!(f, "Load next page ..."),
            ProgressMessage::DownloadingCurrentPage => write!(f, "Downloading current page ..."),
            ProgressMessage::DownloadingPage(label) => write!(f, "Downloading page {label} ..."),
            ProgressMessage::SaveFile => write!(f, "Save Pdf file ..."),
            ProgressMessage::Cancelled => write!(f, "Canceled download..."),
            ProgressMessage::Complete => write!(f, "Download Complete!"),
        }
    }
}
