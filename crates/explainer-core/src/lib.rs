//! Explainer Core - per-slide LLM explanations for slide decks
//!
//! This crate contains the job that turns a deck into explanations:
//! - Slide text extraction (PPTX via zip/quick-xml, PDF via lopdf)
//! - Explanation client abstraction and OpenAI-compatible adapter
//! - Retry/backoff per failure class and submission pacing
//! - Sequential job runner
//! - Result store keyed by the deck's path

pub mod client;
pub mod config;
pub mod jobs;
pub mod slides;
pub mod storage;

pub use client::{ClientConfig, ExplanationClient, ExplanationError, OpenAiClient};
pub use config::{Config, Settings};
pub use jobs::{
    explain_deck, ExplanationResult, FailureReason, JobError, JobOutcome, JobPolicy, JobRunner,
    TextUnit,
};
pub use storage::{JobStatus, ResultStore, StoreError};
