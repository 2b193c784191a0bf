//! Output formatting for allocation results.
//!
//! - [`terminal`] - field formatting and colors
//! - [`report`] - the placement report

mod report;
mod terminal;

pub use report::{placement_rows, print_placements};
pub use terminal::{format_field, format_optional, state_label};
