pub mod llm_client;
pub mod submit_client;

pub use llm_client::{LanguageModel, OpenAiClient};
pub use submit_client::{AnswerSubmitter, SubmitClient};
