//! # dom
//!
//! Mutable document model used by the landing page form engine.
//!
//! - [`Node`]: declarative trees, convenient for fixtures and for grafting
//!   generated markup (notifications, error messages) into a page
//! - [`Document`]: the live arena with parent links, focus, form-control state
//! - [`Selector`]: the small selector subset the form engine is configured with

mod document;
pub mod dom_utils;
mod selector;
mod types;

pub use document::{Document, DomError, ElementData};
pub use selector::{Selector, SelectorError};
pub use types::{Attribute, InputControlType, Node, NodeId};
