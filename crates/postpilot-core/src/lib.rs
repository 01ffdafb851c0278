//! # PostPilot Core
//!
//! The domain layer of PostPilot: the post lifecycle and credit engine.
//! This crate contains pure business logic with zero infrastructure dependencies.
//! Storage and the external collaborators (generation agent, LinkedIn) are
//! reached only through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
