//! Thin command surfaces over the lifecycle core.
//!
//! These callers contain no gating logic of their own; they uniquify names,
//! write audit records and delegate.

mod copy_items;
mod duplicate;
mod paste;

pub use copy_items::copy_item_to;
pub use duplicate::duplicate_item;
pub use paste::{paste_from_clipboard, ClipboardPayload, COPY_PREFIX, CUT_PREFIX};
