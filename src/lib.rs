//! # rgscan
//!
//! Controller side of a ReplayGain scan: launches a scanner collaborator on
//! a detached worker, turns its progress ticks into elapsed/estimated/speed
//! lines, and tears every job down on a single cooperative UI context.
//!
//! - [`controller`] - scan sessions, job lifecycle and the UI event queue
//! - [`progress`] - speed, duration formatting and progress estimation
//! - [`registry`] - identifiers of live jobs
//! - [`host`] - track store, clock, configuration and worker spawning
//! - [`scanner`] - scanner plugin contract and the reference PCM scanner
//! - [`actions`] - the four context-menu commands
//! - [`report`] - result reporters used once a scan finishes

pub mod actions;
pub mod cli;
pub mod config;
pub mod controller;
pub mod host;
pub mod logging;
pub mod progress;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod titleformat;

pub use controller::{ControllerError, JobState, ScanSession};
pub use registry::{JobId, JobRegistry};
