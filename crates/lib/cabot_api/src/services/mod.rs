//! Business logic behind the handlers.

pub mod chat;
pub mod session;
