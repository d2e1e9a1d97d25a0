//! Building blocks shared by the report renderers.
//!
//! Everything in here is plain string formatting, nothing writes to a target
//! on its own.

pub mod color;
pub mod divider;
