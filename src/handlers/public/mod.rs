// handlers/public/mod.rs - Public handlers (no session required)
//
// Service probes, the public job board reads and token acquisition.
pub mod auth;
pub mod jobs;
pub mod service;
