//! Form lifecycle and persistence engine.
//!
//! One [`FormsController`] per page validates fields against their declared
//! constraints, renders localized messages into accessible error containers,
//! keeps a draft of every form in durable storage, and runs the submission
//! and reset pipelines. [`Page`] hosts the controller and replays user
//! interaction against it.

pub mod a11y;
pub mod config;
pub mod confirmation;
pub mod controller;
pub mod draft;
pub mod mask;
pub mod messages;
pub mod notify;
mod page;
pub mod validity;

pub use config::{ConfigError, FormsConfig};
pub use controller::{FormsController, SubmitOutcome};
pub use draft::{DraftError, DraftRecord, DraftStore, DraftValue};
pub use mask::{InputMask, PatternMask};
pub use messages::MessageCatalog;
pub use notify::{Notification, NotificationId, Notifications, TimerTask};
pub use page::Page;
pub use validity::{Constraints, ValidityState, Violation};
