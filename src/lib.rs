#![deny(missing_docs)]

//! Core library for the Planwright plan-drafting backend.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Text-extraction service relay.
pub mod extraction;
/// Firebase identity verification and Firestore persistence.
pub mod firebase;
/// Generative-model client abstraction and adapters.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Request counters.
pub mod metrics;
/// Request orchestration across providers.
pub mod planning;
/// Plan prompt assembly.
pub mod prompt;
/// Pinecone vector index integration.
pub mod vector;
