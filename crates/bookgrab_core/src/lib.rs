//! Bookgrab core: pure traversal state machine and the value types around it.
mod address;
mod effect;
mod geometry;
mod label;
mod msg;
mod progress;
mod session;
mod state;
mod update;
mod view_model;

pub use address::{origin_of, page_address, page_param, AddressError, PAGE_PARAM};
pub use effect::Effect;
pub use geometry::{GeometryError, PageSize, SizeCarry};
pub use label::{batch_labels, normalize_page_label, page_number};
pub use msg::Msg;
pub use progress::ProgressMessage;
pub use session::{SessionBusy, SessionGuard, SessionSlot};
pub use state::{
    next_index, DownloadMode, Phase, SessionStatus, StopReason, TraversalState,
    FIRST_CONTENT_INDEX, SENTINEL_INDEX,
};
pub use update::update;
pub use view_model::SessionView;
