pub mod answer;
pub mod datum;
pub mod grading;
pub mod plan;

pub use answer::{Answer, AnswerShape};
pub use datum::{AcquiredDatum, DataKind, Sheet, Table, TableSummary};
pub use grading::{GradingResult, Submission};
pub use plan::Plan;
