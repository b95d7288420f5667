//! Deterministic text construction: context sentences, prompt composition,
//! and the response sanitizer

pub mod prompt;
pub mod sanitize;
pub mod sentence;

pub use prompt::{
    certification_instruction, concept_instruction, PROJECT_IDEA_JSON_FORMAT, SYSTEM_MESSAGE,
};
pub use sanitize::{resource_links, sanitize_project_idea, strip_code_fences};
pub use sentence::{
    certification_context_sentence, certification_query_sentence, concept_query_sentence,
    service_context_sentence,
};
