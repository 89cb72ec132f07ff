//! Blacklist filter for published rounds.
//!
//! A blacklist is an immutable set of EPCs assembled once from the built-in
//! baseline plus configured entries. Lookups are case-insensitive by
//! construction: every entry goes through [`Epc::new`], which normalizes to
//! uppercase, and decoded EPCs arrive already normalized. Applying the
//! filter is a pure operation on a round.

use std::collections::BTreeSet;
use tagscan_core::{Epc, InventoryRound, Result};

/// Identifiers excluded from every published round.
///
/// Factory sample tags shipped with the reader modules; they show up in
/// nearly every scan and carry no inventory meaning.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "E28011700000020F5C6B0E5B",
    "E28011700000020F5C6B0F83",
];

/// Immutable set of EPCs to drop from round results.
#[derive(Debug, Clone)]
pub struct Blacklist {
    entries: BTreeSet<Epc>,
}

impl Blacklist {
    /// The built-in baseline blacklist.
    pub fn baseline() -> Self {
        let entries = DEFAULT_BLACKLIST
            .iter()
            .map(|raw| Epc::new(raw).expect("built-in blacklist entries are valid EPCs"))
            .collect();
        Self { entries }
    }

    /// Baseline plus configured entries.
    ///
    /// # Errors
    /// Returns `Error::InvalidEpc` for any entry that is not a valid
    /// identifier; the configured set is rejected as a whole.
    pub fn with_entries<I, S>(extra: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut blacklist = Self::baseline();
        for raw in extra {
            blacklist.entries.insert(Epc::new(raw.as_ref())?);
        }
        Ok(blacklist)
    }

    /// Whether an EPC is blacklisted.
    pub fn contains(&self, epc: &Epc) -> bool {
        self.entries.contains(epc)
    }

    /// Number of entries, baseline included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the blacklist has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce a new round without the blacklisted EPCs.
    ///
    /// Pure: the input round is untouched, and the result keeps its round
    /// number and timestamp.
    pub fn apply(&self, round: &InventoryRound) -> InventoryRound {
        InventoryRound {
            round: round.round,
            epcs: round
                .epcs
                .iter()
                .filter(|epc| !self.contains(epc))
                .cloned()
                .collect(),
            timestamp: round.timestamp,
        }
    }
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagscan_core::RoundId;

    fn round_of(epcs: &[&str]) -> InventoryRound {
        InventoryRound::new(
            RoundId::FIRST,
            epcs.iter().map(|e| Epc::new(e).unwrap()).collect(),
        )
    }

    #[test]
    fn test_baseline_is_always_included() {
        let blacklist = Blacklist::with_entries(["AABBCCDD"]).unwrap();
        assert_eq!(blacklist.len(), DEFAULT_BLACKLIST.len() + 1);
        for entry in DEFAULT_BLACKLIST {
            assert!(blacklist.contains(&Epc::new(entry).unwrap()));
        }
    }

    #[test]
    fn test_lookup_is_case_normalized() {
        let blacklist = Blacklist::with_entries(["aabbccdd"]).unwrap();
        assert!(blacklist.contains(&Epc::new("AABBCCDD").unwrap()));
    }

    #[test]
    fn test_invalid_entry_rejected() {
        assert!(Blacklist::with_entries(["not-hex!"]).is_err());
        assert!(Blacklist::with_entries(["AB"]).is_err());
    }

    #[test]
    fn test_apply_removes_blacklisted() {
        let blacklist = Blacklist::with_entries(["AABBCCDD"]).unwrap();
        let round = round_of(&["AABBCCDD", "E28011AA"]);

        let filtered = blacklist.apply(&round);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.epcs.contains(&Epc::new("E28011AA").unwrap()));
        assert_eq!(filtered.round, round.round);
        assert_eq!(filtered.timestamp, round.timestamp);
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let blacklist = Blacklist::with_entries(["AABBCCDD"]).unwrap();
        let round = round_of(&["AABBCCDD", "E28011AA"]);

        let _ = blacklist.apply(&round);
        assert_eq!(round.len(), 2);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let blacklist = Blacklist::with_entries(["AABBCCDD", "11223344"]).unwrap();
        let round = round_of(&["AABBCCDD", "11223344", "E28011AA", "DEADBEEF"]);

        let once = blacklist.apply(&round);
        let twice = blacklist.apply(&once);
        assert_eq!(once.epcs, twice.epcs);
        assert_eq!(once.round, twice.round);
    }

    #[test]
    fn test_apply_can_empty_a_round() {
        let blacklist = Blacklist::with_entries(["AABBCCDD"]).unwrap();
        let round = round_of(&["AABBCCDD"]);

        let filtered = blacklist.apply(&round);
        assert!(filtered.is_empty());
    }
}
