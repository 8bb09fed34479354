//! Property-based tests for the command-line segmenter

use mosaicsh::commands::segment;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_segment_doesnt_panic(s in "\\PC*") {
        let _ = segment(&s);
    }

    #[test]
    fn test_units_are_trimmed_and_separator_free(s in "[a-z ;&|<>]{0,60}") {
        for unit in segment(&s) {
            prop_assert!(!unit.text.is_empty());
            prop_assert_eq!(unit.text.trim(), unit.text.as_str());
            prop_assert!(!unit.text.contains(';'));
            prop_assert!(!unit.text.contains('&'));
        }
    }

    #[test]
    fn test_sequence_preserves_commands(
        cmds in prop::collection::vec("[a-z]{1,8}( [a-z0-9]{1,8}){0,3}", 1..6),
    ) {
        let line = cmds.join(" ; ");
        let units = segment(&line);

        prop_assert_eq!(units.len(), cmds.len());
        for (unit, cmd) in units.iter().zip(&cmds) {
            prop_assert_eq!(&unit.text, cmd);
            prop_assert!(!unit.background);
        }
    }

    #[test]
    fn test_all_but_last_ampersand_piece_is_background(
        cmds in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        let line = cmds.join(" & ");
        let units = segment(&line);

        prop_assert_eq!(units.len(), cmds.len());
        let last = units.len() - 1;
        for (i, unit) in units.iter().enumerate() {
            prop_assert_eq!(unit.background, i < last);
        }
    }
}
