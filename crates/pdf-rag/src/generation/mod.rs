//! Answer generation with the language model

pub mod composer;
pub mod prompt;

pub use composer::ResponseComposer;
pub use prompt::{PromptBuilder, NOT_FOUND_ANSWER};
