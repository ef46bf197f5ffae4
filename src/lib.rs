// Copyright (c) 2025 - Cowboy AI, Inc.
//! Hub-and-spoke Transit Gateway topology planner
//!
//! Computes, from a declarative deployment configuration, the intended
//! control plane of an AWS Transit Gateway hub: which VPCs attach, how their
//! subnets are laid out, which purpose route tables exist, and which
//! attachments associate, propagate and receive static routes.
//!
//! ```text
//! config ─> domain::Topology ─> planner::plan ─> emitter ─> apply ─> RealizedState
//! ```
//!
//! The planning core (`domain`, `planner`, `emitter`) is pure and
//! deterministic. Side effects live behind [`apply::ApplyExecutor`] and
//! [`apply::StateStore`].

pub mod apply;
pub mod config;
pub mod domain;
pub mod emitter;
pub mod errors;
pub mod planner;
pub mod service;

// Re-export commonly used types
pub use config::DeploymentConfig;
pub use domain::Topology;
pub use emitter::{render_changes, render_outputs, ChangeSet, PlanOutputs};
pub use errors::{
    ConfigError, ExecutionError, PlannerError, PlannerResult, PlanningInvariantError,
};
pub use planner::{plan, Plan};
