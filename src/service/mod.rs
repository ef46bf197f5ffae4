// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer
//!
//! Orchestrates the pure planning core and the side-effecting collaborators.
//!
//! ```text
//! Client Request
//!     ↓
//! Service Layer (this module)
//!     ↓
//! Topology → Planner → Emitter      (pure)
//!     ↓
//! ApplyExecutor                     (I/O)
//!     ↓
//! StateStore                        (local state)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use tgw_topology::service::{DeploymentService, PlanningService};
//!
//! let store = StateStore::new(".tgw-planner");
//! let mut service = PlanningService::new(SimulatedExecutor::new(), store);
//! let state = service.apply(&config).await?;
//! let tables = state.route_tables();
//! ```

pub mod deployment;

pub use deployment::{plan_deployment, DeploymentService, PlannedDeployment, PlanningService};
