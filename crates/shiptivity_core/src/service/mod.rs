//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI/transport layers decoupled from storage details.

pub mod client_service;
pub mod rank_manager;
