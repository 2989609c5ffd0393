//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply boundary cleanup (trimming, blank checks) before persistence.
//! - Keep transport layers decoupled from storage and tagging details.

pub mod annotation_service;
pub mod attribute_service;
pub mod graph_service;
pub mod inheritance;
