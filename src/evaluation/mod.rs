//! Path schedule evaluation and feasibility checking.

mod evaluator;

pub use evaluator::{PathEvaluator, Schedule, StopTiming, Violation, ViolationType};
