/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SessionProgress {
    pub total: usize,
    /// Questions already passed with a correct answer.
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}
