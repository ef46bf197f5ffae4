// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Service
//!
//! Runs a deployment end to end:
//!
//! ```text
//! DeploymentConfig ─> Topology ─> Plan ─> Emission ─> ApplyExecutor ─> StateStore
//! ```
//!
//! Configuration errors are reported before the executor is called. Plan
//! invariant violations and executor failures are propagated untouched.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::apply::{ApplyExecutor, RealizedState, StateStore};
use crate::config::DeploymentConfig;
use crate::domain::Topology;
use crate::emitter::{emit, Emission};
use crate::errors::PlannerResult;
use crate::planner::{plan, Plan};

/// A planned deployment, ready to apply
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDeployment {
    pub topology: Topology,
    pub plan: Plan,
    pub emission: Emission,
}

/// Plan a configuration without applying it
pub fn plan_deployment(config: &DeploymentConfig) -> PlannerResult<PlannedDeployment> {
    let topology = Topology::from_config(config)?;
    let plan = plan(&topology)?;
    let emission = emit(&plan)?;

    Ok(PlannedDeployment {
        topology,
        plan,
        emission,
    })
}

/// Deployment service trait
#[async_trait]
pub trait DeploymentService: Send + Sync {
    /// Plan without side effects
    async fn plan(&self, config: &DeploymentConfig) -> PlannerResult<PlannedDeployment>;

    /// Plan, apply and persist the realized state
    async fn apply(&mut self, config: &DeploymentConfig) -> PlannerResult<RealizedState>;

    /// Destroy the persisted deployment and clean local state
    ///
    /// Returns `false` when there was nothing to destroy.
    async fn destroy(&mut self) -> PlannerResult<bool>;

    /// Last realized state, if any
    async fn state(&self) -> PlannerResult<Option<RealizedState>>;
}

/// [`DeploymentService`] over an executor and a local state store
pub struct PlanningService<E: ApplyExecutor> {
    executor: E,
    store: StateStore,
}

impl<E: ApplyExecutor> PlanningService<E> {
    pub fn new(executor: E, store: StateStore) -> Self {
        Self { executor, store }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }
}

#[async_trait]
impl<E: ApplyExecutor> DeploymentService for PlanningService<E> {
    async fn plan(&self, config: &DeploymentConfig) -> PlannerResult<PlannedDeployment> {
        plan_deployment(config)
    }

    async fn apply(&mut self, config: &DeploymentConfig) -> PlannerResult<RealizedState> {
        let planned = plan_deployment(config)?;
        let state = self
            .executor
            .apply(&planned.emission.changes, &planned.emission.outputs)
            .await?;
        self.store.save(&state).await?;

        info!(
            identifier = %state.identifier,
            resources = state.resources.len(),
            "Deployment applied"
        );
        Ok(state)
    }

    async fn destroy(&mut self) -> PlannerResult<bool> {
        let Some(state) = self.store.load().await? else {
            warn!(dir = %self.store.dir().display(), "No realized state to destroy");
            self.store.clean().await?;
            return Ok(false);
        };

        self.executor.destroy(&state).await?;
        self.store.clean().await?;
        Ok(true)
    }

    async fn state(&self) -> PlannerResult<Option<RealizedState>> {
        self.store.load().await
    }
}
