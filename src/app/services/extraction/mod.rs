//! LLM-backed extraction of structured metadata from bulletin text
//!
//! Each bulletin body is sent to a chat-completions model with a fixed instruction
//! asking for the object records and bulletin-level fields as JSON. The reply is
//! cleaned of markdown fences, decoded into an
//! [`ExtractionDocument`](crate::app::models::ExtractionDocument) and written to
//! `<id-with-hyphens>.json`, the layout the classifier reads back.
//!
//! - [`prompt`] - Instruction text and response decoding
//! - [`client`] - The [`Extractor`] seam and its HTTP implementation
//! - [`pipeline`] - Corpus runs and document files

pub mod client;
pub mod pipeline;
pub mod prompt;

pub use client::{Extractor, FixedResponseExtractor, OpenAiExtractor};
pub use pipeline::{ExtractionStats, extract_all, extract_to_file, extraction_output_path};
pub use prompt::{build_prompt, clean_response, parse_response};
