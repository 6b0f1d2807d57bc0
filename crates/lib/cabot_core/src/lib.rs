//! # cabot_core
//!
//! Core domain logic for CA Bot: conversation state, prompt construction and
//! the clients for the hosted embedding, vector search and chat completion
//! services.

pub mod completion;
pub mod config;
pub mod conversation;
pub mod embedding;
pub mod prompt;
pub mod retrieval;

