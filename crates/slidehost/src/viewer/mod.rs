//! Slide-deck viewer: navigation state, URL handling and sharing, driven
//! through the [`ViewerView`] port so hosts only draw.

mod controller;
pub mod location;
pub mod share;
pub mod state;

pub use controller::{
    EnvError, Key, Modal, OpenError, OverviewEntry, Preview, ViewerController, ViewerOptions,
    ViewerView,
};
pub use share::{CopyTarget, ShareLinks};
pub use state::SlotRole;
