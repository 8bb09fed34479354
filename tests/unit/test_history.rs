//! Unit tests for command history
//!
//! These tests validate the bounded ring, prefix lookup and the
//! optional history file.

use mosaicsh::history::History;
use mosaicsh::Error;
use tempfile::TempDir;

#[cfg(test)]
mod history_tests {
    use super::*;

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut history = History::new(3);
        for cmd in ["one", "two", "three", "four"] {
            history.add(cmd).unwrap();
        }

        let entries: Vec<&str> = history.entries().collect();
        assert_eq!(entries, vec!["two", "three", "four"]);
        assert_eq!(history.capacity(), 3);
    }

    #[test]
    fn test_blank_commands_are_not_recorded() {
        let mut history = History::default();
        history.add("   ").unwrap();
        history.add("").unwrap();
        assert!(history.is_empty());

        history.add("  ls -l  ").unwrap();
        assert_eq!(history.entries().next(), Some("ls -l"));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut history = History::new(10);
        history.add("ls").unwrap();
        history.add("ls").unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_prefix_lookup_prefers_most_recent() {
        let mut history = History::new(10);
        history.add("ls /tmp").unwrap();
        history.add("echo hi").unwrap();
        history.add("ls /var").unwrap();

        assert_eq!(history.find_by_prefix("ls"), Some("ls /var"));
        assert_eq!(history.find_by_prefix("ec"), Some("echo hi"));
        assert_eq!(history.find_by_prefix("cat"), None);
    }

    #[test]
    fn test_recall_without_match() {
        let mut history = History::new(10);
        history.add("ls").unwrap();

        let err = history.recall("zz").unwrap_err();
        assert!(matches!(err, Error::HistoryEventNotFound { ref prefix } if prefix == "zz"));
    }

    #[test]
    fn test_render_numbers_from_one() {
        let mut history = History::new(10);
        history.add("ls").unwrap();
        history.add("pwd").unwrap();
        assert_eq!(history.render(), "Command History:\n1: ls\n2: pwd\n");

        assert_eq!(History::new(10).render(), "Command History:\n");
    }

    #[test]
    fn test_history_file_is_appended_and_reloaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");

        let mut history = History::with_file(2, path.clone()).unwrap();
        history.add("one").unwrap();
        history.add("two").unwrap();
        history.add("three").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\nthree\n");

        let reloaded = History::with_file(2, path.clone()).unwrap();
        let entries: Vec<&str> = reloaded.entries().collect();
        assert_eq!(entries, vec!["two", "three"]);
        assert_eq!(reloaded.file(), Some(path.as_path()));
    }
}
