use rand::seq::SliceRandom;
use rand::{Rng, rng};

use quiz_core::model::{Question, QuestionCount, UnitName};

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    /// Questions that matched the selected units before truncation.
    pub matched: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Picks the questions of a quiz: unit filter, shuffle, then truncation to the requested count.
pub struct SessionPlanBuilder<'a> {
    units: &'a [UnitName],
    count: QuestionCount,
    shuffle: bool,
}

impl<'a> SessionPlanBuilder<'a> {
    #[must_use]
    pub fn new(units: &'a [UnitName], count: QuestionCount) -> Self {
        Self {
            units,
            count,
            shuffle: true,
        }
    }

    /// Disable shuffling to keep catalog order (useful for deterministic flows).
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build a plan using the thread-local RNG.
    pub fn build(self, catalog: impl IntoIterator<Item = Question>) -> SessionPlan {
        let mut rng = rng();
        self.build_with_rng(catalog, &mut rng)
    }

    /// Build a plan with a caller-provided RNG.
    ///
    /// The filtered set is shuffled with Fisher–Yates, so every permutation is equally likely.
    pub fn build_with_rng<R: Rng + ?Sized>(
        self,
        catalog: impl IntoIterator<Item = Question>,
        rng: &mut R,
    ) -> SessionPlan {
        let mut questions: Vec<Question> = catalog
            .into_iter()
            .filter(|q| self.units.contains(q.unit()))
            .collect();
        let matched = questions.len();

        if self.shuffle {
            questions.as_mut_slice().shuffle(rng);
        }
        if let Some(limit) = self.count.limit() {
            questions.truncate(limit);
        }

        SessionPlan { questions, matched }
    }
}
