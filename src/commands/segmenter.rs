//! Command Segmenter
//!
//! Splits one input line into independent command units. `;` is the
//! outer boundary; inside each `;` segment every `&` ends a background
//! unit. No quoting or escaping is recognised.

use crate::models::CommandUnit;

/// Sequential separator
pub const SEQUENCE_SEPARATOR: char = ';';
/// Background marker
pub const BACKGROUND_MARKER: char = '&';

/// Split `line` into command units, in input order.
///
/// Every `&`-delimited piece except the last piece of its `;` segment is
/// marked as background. Whitespace-only pieces are dropped.
pub fn segment(line: &str) -> Vec<CommandUnit> {
    let mut units = Vec::new();

    for segment in line.split(SEQUENCE_SEPARATOR) {
        let pieces: Vec<&str> = segment.split(BACKGROUND_MARKER).collect();
        let last = pieces.len() - 1;

        for (i, piece) in pieces.into_iter().enumerate() {
            let text = piece.trim();
            if text.is_empty() {
                continue;
            }
            units.push(CommandUnit::new(text, i < last));
        }
    }

    trace!("segmented {:?} into {} unit(s)", line, units.len());
    units
}
