//! Flat-text representation of a roster list as stored in an anchor
//! embed field: one `"{JOB} - {identity}"` line per entry.

use thiserror::Error;

use crate::roster::entry::RosterEntry;

const SEPARATOR: &str = " - ";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed roster entry: {0:?}")]
    MalformedEntry(String),
}

pub fn serialize(entries: &[RosterEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{}{}{}", entry.job, SEPARATOR, entry.identity))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn deserialize(text: &str) -> Result<Vec<RosterEntry>, CodecError> {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<RosterEntry, CodecError> {
    let (code, identity) = line
        .split_once(SEPARATOR)
        .ok_or_else(|| CodecError::MalformedEntry(line.to_string()))?;
    let job = code
        .parse()
        .map_err(|_| CodecError::MalformedEntry(line.to_string()))?;
    Ok(RosterEntry::new(identity, job))
}

/// Whole-line membership test against serialized roster text. The
/// identity part of each line must match exactly; a display name that
/// happens to be a substring of another participant's never matches.
pub fn contains(text: &str, identity: &str) -> bool {
    text.lines().any(|line| {
        line.split_once(SEPARATOR)
            .is_some_and(|(_, line_identity)| line_identity == identity)
    })
}

/// Removes the entry registered under `identity`, if any.
pub fn remove_entry(entries: &mut Vec<RosterEntry>, identity: &str) {
    if let Some(position) = entries.iter().position(|entry| entry.identity == identity) {
        entries.remove(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::entry::Job;
    use pretty_assertions::assert_eq;

    fn sample_entries() -> Vec<RosterEntry> {
        vec![
            RosterEntry::new("Alice", Job::Pld),
            RosterEntry::new("Bob", Job::Whm),
            RosterEntry::new("Carol Mc'Intyre", Job::Brd),
        ]
    }

    #[test]
    fn serializes_entries_one_per_line() {
        let text = serialize(&sample_entries());
        assert_eq!(text, "PLD - Alice\nWHM - Bob\nBRD - Carol Mc'Intyre");
    }

    #[test]
    fn empty_list_serializes_to_empty_string() {
        assert_eq!(serialize(&[]), "");
    }

    #[test]
    fn single_entry_has_no_leading_newline() {
        let text = serialize(&[RosterEntry::new("Alice", Job::Pld)]);
        assert_eq!(text, "PLD - Alice");
    }

    #[test]
    fn round_trips_well_formed_lists() {
        let entries = sample_entries();
        let parsed = deserialize(&serialize(&entries)).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn empty_string_deserializes_to_empty_list() {
        assert_eq!(deserialize("").unwrap(), vec![]);
    }

    #[test]
    fn line_without_separator_is_malformed() {
        let err = deserialize("PLD Alice").unwrap_err();
        assert!(matches!(err, CodecError::MalformedEntry(line) if line == "PLD Alice"));
    }

    #[test]
    fn line_with_unknown_job_is_malformed() {
        assert!(deserialize("XYZ - Alice").is_err());
    }

    #[test]
    fn identity_may_contain_the_separator() {
        // Only the first " - " splits; the rest belongs to the identity.
        let parsed = deserialize("PLD - A - B").unwrap();
        assert_eq!(parsed, vec![RosterEntry::new("A - B", Job::Pld)]);
    }

    #[test]
    fn contains_matches_exact_identity() {
        let text = serialize(&sample_entries());
        assert!(contains(&text, "Alice"));
        assert!(contains(&text, "Carol Mc'Intyre"));
        assert!(!contains(&text, "Dave"));
    }

    #[test]
    fn contains_rejects_identity_substrings() {
        let text = serialize(&[RosterEntry::new("Alexandra", Job::Whm)]);
        assert!(!contains(&text, "Alex"));
        assert!(!contains(&text, "andra"));
    }

    #[test]
    fn contains_ignores_job_codes() {
        let text = serialize(&[RosterEntry::new("Alice", Job::Pld)]);
        assert!(!contains(&text, "PLD"));
    }

    #[test]
    fn remove_entry_drops_only_the_matching_entry() {
        let mut entries = sample_entries();
        remove_entry(&mut entries, "Bob");
        assert_eq!(
            entries,
            vec![
                RosterEntry::new("Alice", Job::Pld),
                RosterEntry::new("Carol Mc'Intyre", Job::Brd),
            ]
        );
    }

    #[test]
    fn remove_entry_is_a_no_op_when_absent() {
        let mut entries = sample_entries();
        remove_entry(&mut entries, "Dave");
        assert_eq!(entries, sample_entries());
    }
}
