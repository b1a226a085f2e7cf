//! Resume analysis client.
//!
//! Validates a resume file and job description, submits them to the remote
//! analysis endpoint with simulated progress, and renders the returned skills,
//! suggestions and match score alongside a transient notification banner.

pub mod client;
pub mod config;
pub mod errors;
pub mod form;
pub mod models;
pub mod notification;
pub mod render;
pub mod scheduler;
pub mod validation;
