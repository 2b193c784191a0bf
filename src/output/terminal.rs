//! Terminal formatting helpers.

use crate::network::ReservationState;
use colored::{ColoredString, Colorize};
use std::fmt::Display;

/// Format a value as a quoted, right-aligned field.
///
/// Values wider than `width` are kept whole.
pub fn format_field<T: Display>(value: T, width: usize) -> String {
    let quoted = format!("\"{value}\"");
    format!("{quoted:>width$}")
}

/// Like [`format_field`], rendering `None` as `-`.
pub fn format_optional<T: Display>(value: Option<T>, width: usize) -> String {
    match value {
        Some(v) => format_field(v, width),
        None => format_field("-", width),
    }
}

/// Reservation state, colored by how far it got.
pub fn state_label(state: ReservationState) -> ColoredString {
    let label = state.to_string();
    match state {
        ReservationState::Reserved => label.green(),
        ReservationState::Resolved => label.yellow(),
        ReservationState::Unresolved => label.cyan(),
        ReservationState::Released => label.red(),
    }
}
