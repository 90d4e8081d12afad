//! REST API client module for the job-board identity backend.
//!
//! This module provides the `ApiClient`, which implements the
//! `Authenticator` collaborator for both identity kinds.
//!
//! The backend issues opaque bearer tokens from per-kind login endpoints
//! and resolves them back to profiles through a "who am I" endpoint.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
