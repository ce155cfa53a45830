pub mod quiz_ctx;
pub mod quiz_flow;

pub use quiz_ctx::{Credentials, QuizSession};
pub use quiz_flow::{QuizFlow, StepError, StopReason};
