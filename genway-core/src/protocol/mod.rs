//! Protocol module for generation request/response structures
//!
//! This module defines the provider-agnostic data models that flow through
//! the gateway. These structures are designed to be:
//! - Immutable once built
//! - Independent of any provider wire format
//! - Serializable for logging and diagnostics

pub mod types;

pub use types::{
    chat_messages, GeneratedOutput, GenerationKind, GenerationRequest, ImageInput,
    InstructionStyle, Message, MessageRole, OutputShape, Prompt, RawOutput,
};
