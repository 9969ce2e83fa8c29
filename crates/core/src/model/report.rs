use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::score::percent;
use crate::model::study_log::StudyLog;
use crate::model::unit::UnitName;

//
// ─── GRADE ─────────────────────────────────────────────────────────────────────
//

/// Letter mark shown next to a unit's accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    /// ◎, accuracy 80 and above.
    Excellent,
    /// ○, accuracy 65 to 79.
    Good,
    /// △, accuracy 50 to 64.
    Fair,
    /// ×, below 50.
    Poor,
}

impl Grade {
    #[must_use]
    pub fn from_accuracy(accuracy: u32) -> Self {
        match accuracy {
            80.. => Grade::Excellent,
            65..=79 => Grade::Good,
            50..=64 => Grade::Fair,
            _ => Grade::Poor,
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Grade::Excellent => "◎",
            Grade::Good => "○",
            Grade::Fair => "△",
            Grade::Poor => "×",
        }
    }
}

//
// ─── ACCUMULATOR ───────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tally {
    total: u32,
    correct: u32,
    answer_time_ms: u64,
    last: Option<DateTime<Utc>>,
}

impl Tally {
    fn add(&mut self, log: &StudyLog) {
        self.total = self.total.saturating_add(1);
        if log.correct {
            self.correct = self.correct.saturating_add(1);
        }
        self.answer_time_ms = self.answer_time_ms.saturating_add(log.answer_time_ms);
        self.last = Some(match self.last {
            Some(prev) if prev >= log.answered_at => prev,
            _ => log.answered_at,
        });
    }

    fn accuracy(&self) -> u32 {
        percent(u64::from(self.correct), u64::from(self.total))
    }
}

//
// ─── UNIT SUMMARY ──────────────────────────────────────────────────────────────
//

/// Reporting row per unit for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub unit: UnitName,
    pub total_count: u32,
    pub correct_count: u32,
    /// Rounded percentage of correct answers.
    pub accuracy: u32,
    pub last_study_at: Option<DateTime<Utc>>,
    /// Whole seconds spent answering.
    pub total_answer_time: u64,
}

impl UnitSummary {
    /// Group logs by unit. Rows come back sorted by unit name.
    #[must_use]
    pub fn aggregate<'a>(logs: impl IntoIterator<Item = &'a StudyLog>) -> Vec<Self> {
        let mut by_unit: BTreeMap<&UnitName, Tally> = BTreeMap::new();
        for log in logs {
            by_unit.entry(&log.unit).or_default().add(log);
        }
        by_unit
            .into_iter()
            .map(|(unit, tally)| Self {
                unit: unit.clone(),
                total_count: tally.total,
                correct_count: tally.correct,
                accuracy: tally.accuracy(),
                last_study_at: tally.last,
                total_answer_time: tally.answer_time_ms / 1000,
            })
            .collect()
    }

    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_accuracy(self.accuracy)
    }

    /// Time spent in minutes, rounded half up.
    #[must_use]
    pub fn minutes_spent(&self) -> u64 {
        (self.total_answer_time + 30) / 60
    }
}

//
// ─── DAILY ACTIVITY ────────────────────────────────────────────────────────────
//

/// Answers per UTC calendar day for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub total_count: u32,
    pub correct_count: u32,
    pub accuracy: u32,
    pub total_answer_time: u64,
}

impl DailyActivity {
    /// Group logs by the UTC date they were answered on, oldest first.
    #[must_use]
    pub fn aggregate<'a>(logs: impl IntoIterator<Item = &'a StudyLog>) -> Vec<Self> {
        let mut by_day: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
        for log in logs {
            by_day
                .entry(log.answered_at.date_naive())
                .or_default()
                .add(log);
        }
        by_day
            .into_iter()
            .map(|(date, tally)| Self {
                date,
                total_count: tally.total,
                correct_count: tally.correct,
                accuracy: tally.accuracy(),
                total_answer_time: tally.answer_time_ms / 1000,
            })
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
