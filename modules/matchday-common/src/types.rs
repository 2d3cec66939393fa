use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Provenance tag stamped on every scraped record.
pub const SOURCE_HLTV: &str = "hltv";

/// A single match in the team's schedule, upcoming or finished.
///
/// The source page exposes no stable match id, so identity is the
/// (opponent, tournament) pair plus a date tolerance window, since
/// re-published times shift by a few minutes between scraping passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: DateTime<Utc>,
    pub opponent: String,
    pub tournament: String,
    pub stage: Option<String>,
    pub stream_link: Option<String>,
    pub score: Option<String>,
    pub is_completed: bool,
    pub source: String,
}

impl MatchRecord {
    /// Dedup identity rule: same opponent and tournament, dates within
    /// `tolerance` of each other.
    pub fn same_fixture(&self, other: &MatchRecord, tolerance: Duration) -> bool {
        self.opponent == other.opponent
            && self.tournament == other.tournament
            && (self.date - other.date).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_match(opponent: &str, date: DateTime<Utc>) -> MatchRecord {
        MatchRecord {
            date,
            opponent: opponent.to_string(),
            tournament: "Cup Y".to_string(),
            stage: None,
            stream_link: None,
            score: None,
            is_completed: false,
            source: SOURCE_HLTV.to_string(),
        }
    }

    #[test]
    fn dates_within_tolerance_are_the_same_fixture() {
        let now = Utc::now();
        let a = make_match("Team X", now);
        let b = make_match("Team X", now + Duration::minutes(30));
        assert!(a.same_fixture(&b, Duration::hours(1)));
        // Symmetric: a shift in either direction counts.
        assert!(b.same_fixture(&a, Duration::hours(1)));
    }

    #[test]
    fn dates_outside_tolerance_are_distinct() {
        let now = Utc::now();
        let a = make_match("Team X", now);
        let b = make_match("Team X", now + Duration::hours(2));
        assert!(!a.same_fixture(&b, Duration::hours(1)));
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let now = Utc::now();
        let a = make_match("Team X", now);
        let b = make_match("Team X", now + Duration::hours(1));
        assert!(a.same_fixture(&b, Duration::hours(1)));
    }

    #[test]
    fn different_opponent_never_matches() {
        let now = Utc::now();
        let a = make_match("Team X", now);
        let b = make_match("Team Z", now);
        assert!(!a.same_fixture(&b, Duration::hours(1)));
    }
}
