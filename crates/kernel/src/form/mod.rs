//! Form handling for the menu item admin screens.
//!
//! Submitted values arrive as flat url-encoded strings. They are validated
//! here into typed model inputs; failures carry per-field messages that are
//! returned with the form view-model.

mod menu_item;

pub use menu_item::{MenuItemForm, MenuItemFormView, ValidMenuItem, ValidationError, slugify};
