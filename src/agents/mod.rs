// LLM-backed agents

pub mod summarizer;

pub use summarizer::{DocumentSummary, SummarizerAgent, SUMMARY_PLACEHOLDER};
