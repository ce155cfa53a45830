pub mod json_extract;
pub mod logging;

pub use json_extract::{extract_structured, parse_embedded, ExtractError};
pub use logging::{char_prefix, truncate_text};
