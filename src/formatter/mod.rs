//! Rendering of the end of run failure report.
//!
//! The [`Reporter`] drives the report, the pieces a host may want to swap are
//! behind the [`ErrorPrinter`] and [`SummaryRenderer`] traits.

use crate::formatter::common::color::Styles;

pub mod common;

mod error;
pub use error::*;

mod reporter;
pub use reporter::*;

mod summary;
pub use summary::*;

/// Settings shared by everything rendering a single report.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'r> {
    pub styles: &'r Styles,
    /// Already clamped terminal width.
    pub columns: usize,
    pub verbose: bool,
}
