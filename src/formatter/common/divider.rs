//! Full width dividers and banners.

use owo_colors::OwoColorize;

use crate::formatter::common::color::Styles;

/// Character dividers are drawn with.
pub const LONG_DASH: char = '⎯';

/// Width used when the terminal reports nothing useful.
pub const MIN_COLUMNS: usize = 30;

/// Widest report we render, some CI hosts report absurd terminal widths.
pub const MAX_COLUMNS: usize = 80;

/// Width of the current terminal, if there is one.
pub fn terminal_columns() -> Option<usize> {
    crossterm::terminal::size()
        .ok()
        .map(|(columns, _)| usize::from(columns))
}

/// Clamp a reported terminal width into `MIN_COLUMNS..=MAX_COLUMNS`.
pub fn columns(reported: Option<usize>) -> usize {
    reported
        .unwrap_or(MIN_COLUMNS)
        .clamp(MIN_COLUMNS, MAX_COLUMNS)
}

/// Visible width of `text`, ignoring escape sequences.
pub fn visible_width(text: &str) -> usize {
    strip_ansi_escapes::strip_str(text).chars().count()
}

fn dashes(count: usize) -> String {
    std::iter::repeat_n(LONG_DASH, count).collect()
}

/// Dashes left and right of a label `text_width` wide.
///
/// With only `right` given the label is anchored to the right, otherwise it
/// is placed `left` columns in or centered.
fn padding(
    text_width: usize,
    left: Option<usize>,
    right: Option<usize>,
    columns: usize,
) -> (usize, usize) {
    let free = columns as isize - text_width as isize;
    let (left, right) = match (left, right) {
        (None, Some(right)) => (free - right as isize, right as isize),
        (left, _) => {
            let left = left.map(|left| left as isize).unwrap_or(free.div_euclid(2));
            (left, free - left)
        }
    };
    (left.max(0) as usize, right.max(0) as usize)
}

/// A line of [`LONG_DASH`]es `columns` wide, optionally with a label in it.
pub fn divider(
    text: Option<&str>,
    left: Option<usize>,
    right: Option<usize>,
    columns: usize,
) -> String {
    match text {
        Some(text) if !text.is_empty() => {
            let (left, right) = padding(visible_width(text), left, right, columns);
            format!("{}{text}{}", dashes(left), dashes(right))
        }
        _ => dashes(columns),
    }
}

/// A centered, emphasized label in a full width divider.
pub fn error_banner(message: &str, styles: &Styles, columns: usize) -> String {
    let label = format!(" {message} ");
    let (left, right) = padding(visible_width(&label), None, None, columns);
    format!(
        "{}{}{}",
        dashes(left).style(styles.banner),
        label.style(styles.banner_label),
        dashes(right).style(styles.banner)
    )
}
