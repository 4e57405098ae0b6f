//! Protocol module for the unified chat request/response structures
//!
//! This module defines the canonical data models callers exchange with the
//! gateway, plus the validation step that turns untrusted input into a
//! [`ChatRequest`].

pub mod types;
pub mod validate;

pub use types::{
    ChatRequest, ChatResponse, ProviderId, RawChatRequest, UnknownProvider, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE, MAX_PROMPT_CHARS,
};
pub use validate::{validate, validate_json};
