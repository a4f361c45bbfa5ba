use serde::{Deserialize, Serialize};

/// Accuracy classification of a hit or release, loosest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum JudgementKind {
    Miss,
    Bad,
    Good,
    Great,
    Perfect,
}

/// Presses further than this from any note do nothing.
pub const MISS_THRESHOLD: i64 = 1000;

/// Notes this far past their end time are missed.
pub const LATE_MISS_THRESHOLD: i64 = 400;

impl JudgementKind {
    pub const ALL: [Self; 5] = [Self::Miss, Self::Bad, Self::Good, Self::Great, Self::Perfect];

    /// Timing window in ms; a delta strictly inside it qualifies.
    pub fn threshold(self) -> i64 {
        match self {
            Self::Miss => MISS_THRESHOLD,
            Self::Bad => LATE_MISS_THRESHOLD,
            Self::Good => 200,
            Self::Great => 100,
            Self::Perfect => 50,
        }
    }

    pub fn score(self) -> i64 {
        match self {
            Self::Miss => 0,
            Self::Bad => 10,
            Self::Good => 25,
            Self::Great => 50,
            Self::Perfect => 100,
        }
    }

    pub fn breaks_combo(self) -> bool {
        matches!(self, Self::Miss | Self::Bad | Self::Good)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Miss => "Miss",
            Self::Bad => "Bad",
            Self::Good => "Good",
            Self::Great => "Great",
            Self::Perfect => "Perfect",
        }
    }

    /// Strictest judgement whose window contains `delta`.
    ///
    /// Walks the table from Miss to Perfect keeping the last match, so a
    /// delta on a window edge falls into the next looser judgement.
    pub fn classify(delta: i64) -> Self {
        let delta = delta.abs();
        Self::ALL
            .into_iter()
            .filter(|kind| delta < kind.threshold())
            .last()
            .unwrap_or(Self::Miss)
    }
}

impl std::fmt::Display for JudgementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
