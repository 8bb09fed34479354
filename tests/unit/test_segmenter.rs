//! Unit tests for the command-line segmenter
//!
//! These tests check how a raw line is cut into command units.

use mosaicsh::commands::segment;
use mosaicsh::models::CommandUnit;

#[cfg(test)]
mod segmenter_tests {
    use super::*;

    fn texts(units: &[CommandUnit]) -> Vec<&str> {
        units.iter().map(|u| u.text.as_str()).collect()
    }

    #[test]
    fn test_single_command() {
        let units = segment("ls -l");
        assert_eq!(units, vec![CommandUnit::foreground("ls -l")]);
    }

    #[test]
    fn test_sequence_and_background() {
        let units = segment("a & b ; c");
        assert_eq!(
            units,
            vec![
                CommandUnit::new("a", true),
                CommandUnit::new("b", false),
                CommandUnit::new("c", false),
            ]
        );
    }

    #[test]
    fn test_trailing_ampersand() {
        let units = segment("sleep 10 &");
        assert_eq!(units, vec![CommandUnit::new("sleep 10", true)]);
    }

    #[test]
    fn test_several_background_units() {
        let units = segment("a & b & c");
        assert_eq!(texts(&units), vec!["a", "b", "c"]);
        assert!(units[0].background);
        assert!(units[1].background);
        assert!(!units[2].background);
    }

    #[test]
    fn test_pipes_and_redirects_stay_in_unit() {
        let units = segment("ls | wc -l > out; cat < in");
        assert_eq!(texts(&units), vec!["ls | wc -l > out", "cat < in"]);
    }

    #[test]
    fn test_blank_pieces_are_dropped() {
        assert!(segment("").is_empty());
        assert!(segment("   ").is_empty());
        assert!(segment(";;").is_empty());
        assert_eq!(texts(&segment(" ; ls ;; pwd ; ")), vec!["ls", "pwd"]);
    }

    #[test]
    fn test_newline_is_trimmed() {
        assert_eq!(texts(&segment("echo hi\n")), vec!["echo hi"]);
    }
}
