use std::collections::BTreeMap;

use serde::Serialize;

use crate::judgement::JudgementKind;

/// Each combo step adds 1/200 (0.5%) of the base score as a bonus.
pub const COMBO_BONUS_DIVISOR: i64 = 200;

/// Score and combo for one run; replaced wholesale on restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub score: i64,
    pub combo: u32,
    pub best_combo: u32,
    pub combo_breaks: u32,
    pub judgement_counts: BTreeMap<JudgementKind, u32>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one judgement. The combo bonus uses the combo before this judgement.
    pub fn record(&mut self, kind: JudgementKind) {
        *self.judgement_counts.entry(kind).or_insert(0) += 1;

        let base = kind.score();
        self.score += base + base * i64::from(self.combo) / COMBO_BONUS_DIVISOR;

        if kind.breaks_combo() {
            self.combo = 0;
            self.combo_breaks += 1;
        } else {
            self.combo += 1;
        }
        self.best_combo = self.best_combo.max(self.combo);
    }

    pub fn count(&self, kind: JudgementKind) -> u32 {
        self.judgement_counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_judged(&self) -> u32 {
        self.judgement_counts.values().sum()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
