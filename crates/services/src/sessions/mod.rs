mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionPlan, SessionPlanBuilder};
pub use progress::SessionProgress;
pub use service::{AdvanceOutcome, SessionService};
pub use view::{QuizResultListItem, QuizResultService};
pub use workflow::{QuizLoopService, QuizStep};
