// Copyright (c) 2025 - Cowboy AI, Inc.
//! Apply Collaborator
//!
//! Interprets a [`ChangeSet`] produced by the emitter and returns a
//! [`RealizedState`] handle carrying the named outputs.
//!
//! ```text
//! Plan Emitter                 Executor
//! ────────────                 ────────
//!
//! ChangeSet ── stages() ──>  apply() ── stage by stage ──> RealizedState
//!                                       (changes of one stage concurrently)
//!
//! RealizedState ──────────>  destroy() ── stages in reverse
//! ```
//!
//! Failures are reported as [`ExecutionError`] and passed through untouched;
//! retry policy belongs to the executor, not the planner.

pub mod state_store;

pub use state_store::StateStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::emitter::{
    ChangeSet, PlanOutputs, ResourceChange, ResourceKind, RouteTableOutputs,
    TRANSIT_GATEWAY_ROUTE_TABLES,
};
use crate::errors::ExecutionError;

/// Trait for realizing and tearing down change sets
#[async_trait]
pub trait ApplyExecutor: Send + Sync {
    /// Realize every change, in dependency order
    ///
    /// If any change fails the whole apply fails.
    async fn apply(
        &mut self,
        changes: &ChangeSet,
        outputs: &PlanOutputs,
    ) -> Result<RealizedState, ExecutionError>;

    /// Remove everything a previous apply realized, dependents first
    async fn destroy(&mut self, state: &RealizedState) -> Result<(), ExecutionError>;
}

/// A resource that has been realized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedResource {
    pub address: String,
    pub kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    /// Stage the resource was realized in
    pub stage: usize,
}

/// Handle on a realized deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealizedState {
    pub identifier: String,
    /// Keyed by address
    pub resources: BTreeMap<String, RealizedResource>,
    /// Named outputs
    pub outputs: BTreeMap<String, Value>,
    pub applied_at: DateTime<Utc>,
}

impl RealizedState {
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    /// Typed `transit_gateway_route_tables` output
    pub fn route_tables(&self) -> Option<RouteTableOutputs> {
        self.output(TRANSIT_GATEWAY_ROUTE_TABLES)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Resources grouped by stage, last stage first
    pub fn teardown_order(&self) -> Vec<Vec<&RealizedResource>> {
        let mut stages: BTreeMap<usize, Vec<&RealizedResource>> = BTreeMap::new();
        for resource in self.resources.values() {
            stages.entry(resource.stage).or_default().push(resource);
        }
        stages.into_values().rev().collect()
    }
}

/// In-memory executor
///
/// Realizes changes without touching any cloud API. Addresses registered with
/// [`SimulatedExecutor::failing_at`] fail, which lets callers exercise error
/// paths.
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutor {
    failing: BTreeSet<String>,
    /// Addresses realized, in order
    pub journal: Vec<String>,
    /// Addresses destroyed, in order
    pub destroyed: Vec<String>,
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the change at `address` fail
    pub fn failing_at(mut self, address: impl Into<String>) -> Self {
        self.failing.insert(address.into());
        self
    }

    async fn realize(
        &self,
        stage: usize,
        change: &ResourceChange,
    ) -> Result<RealizedResource, ExecutionError> {
        tokio::task::yield_now().await;

        if self.failing.contains(&change.address) {
            return Err(ExecutionError::at(&change.address, "simulated failure"));
        }

        debug!(
            address = %change.address,
            kind = %change.kind,
            stage,
            "Change realized"
        );

        Ok(RealizedResource {
            address: change.address.clone(),
            kind: change.kind,
            id: change.id.clone(),
            stage,
        })
    }

    async fn release(&self, resource: &RealizedResource) -> Result<String, ExecutionError> {
        tokio::task::yield_now().await;

        if self.failing.contains(&resource.address) {
            return Err(ExecutionError::at(&resource.address, "simulated failure"));
        }

        debug!(address = %resource.address, "Resource destroyed");
        Ok(resource.address.clone())
    }
}

#[async_trait]
impl ApplyExecutor for SimulatedExecutor {
    async fn apply(
        &mut self,
        changes: &ChangeSet,
        outputs: &PlanOutputs,
    ) -> Result<RealizedState, ExecutionError> {
        // emitted change sets are already layered; anything else is rejected as input
        let stages = changes
            .stages()
            .map_err(|e| ExecutionError::new(format!("change set rejected: {}", e)))?;

        let mut resources = BTreeMap::new();
        for (index, stage) in stages.iter().enumerate() {
            let realized = try_join_all(stage.iter().map(|c| self.realize(index, c))).await?;
            for resource in realized {
                self.journal.push(resource.address.clone());
                resources.insert(resource.address.clone(), resource);
            }
            debug!(stage = index, changes = stage.len(), "Stage applied");
        }

        let outputs = outputs
            .to_named()
            .map_err(|e| ExecutionError::new(format!("rendering outputs: {}", e)))?;

        info!(
            identifier = %changes.identifier,
            resources = resources.len(),
            stages = stages.len(),
            "Change set applied"
        );

        Ok(RealizedState {
            identifier: changes.identifier.clone(),
            resources,
            outputs,
            applied_at: Utc::now(),
        })
    }

    async fn destroy(&mut self, state: &RealizedState) -> Result<(), ExecutionError> {
        for stage in state.teardown_order() {
            let released = try_join_all(stage.iter().map(|r| self.release(r))).await?;
            self.destroyed.extend(released);
        }

        info!(
            identifier = %state.identifier,
            resources = state.resources.len(),
            "Deployment destroyed"
        );
        Ok(())
    }
}
