//! Batched AI Image Generation Service
//!
//! This library provides the core functionality for imageburst: accept a
//! prompt (plus optional reference image), fan out N generation jobs
//! against the Gemini image API under a per-batch concurrency cap, and
//! expose per-job status for client polling until every job is terminal.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
