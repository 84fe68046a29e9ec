//! Certifact Client Core
//!
//! This library provides the headless client core for the Certifact deepfake
//! analysis service: submitting media files for asynchronous analysis,
//! tracking jobs through a polling state machine to a terminal outcome,
//! keeping a durable local history of results, and queueing transient
//! user-facing notifications for a presentation layer.

pub mod app_state;
pub mod config;
pub mod models;
pub mod services;
