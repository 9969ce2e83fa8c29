/// Highest hint tier a question can reach.
pub const MAX_HINT_LEVEL: u8 = 3;

/// Share of the answer's words revealed at tiers 1, 2 and 3.
const REVEAL_PERCENT: [usize; 3] = [20, 50, 100];

/// Score cost in percentage points of tiers 1, 2 and 3. Costs accumulate.
pub const HINT_PENALTY_POINTS: [u32; 3] = [2, 5, 10];

/// A revealed hint for the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub level: u8,
    pub text: String,
    pub revealed_words: usize,
    pub total_words: usize,
}

/// Number of words revealed at `level` for an answer of `total` words, rounded up.
#[must_use]
pub fn revealed_word_count(total: usize, level: u8) -> usize {
    if level == 0 || total == 0 {
        return 0;
    }
    let tier = usize::from(level.min(MAX_HINT_LEVEL)) - 1;
    (total * REVEAL_PERCENT[tier]).div_ceil(100)
}

/// Build the hint text for `answer` at `level` (1..=3). Returns `None` for blank answers
/// or a level outside the tier range.
#[must_use]
pub fn build_hint(answer: &str, level: u8) -> Option<Hint> {
    if level == 0 || level > MAX_HINT_LEVEL {
        return None;
    }
    let words: Vec<&str> = answer.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let revealed = revealed_word_count(words.len(), level);
    Some(Hint {
        level,
        text: words[..revealed].join(" "),
        revealed_words: revealed,
        total_words: words.len(),
    })
}

/// Cumulative penalty for a question that reached `level`.
#[must_use]
pub fn hint_penalty(level: u8) -> u32 {
    let tiers = usize::from(level.min(MAX_HINT_LEVEL));
    HINT_PENALTY_POINTS[..tiers].iter().sum()
}
