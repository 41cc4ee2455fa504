mod evaluator;
mod transition;

pub use evaluator::{TimeWindow, TransitionDecision, TransitionEvaluator};
pub use transition::{RecordId, RecordStatus, Transition};
