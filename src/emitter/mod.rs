// Copyright (c) 2025 - Cowboy AI, Inc.
//! Plan Emitter
//!
//! Pure projections of a [`Plan`](crate::planner::Plan). No decisions are
//! made here:
//!
//! - [`render_outputs`] - the named outputs downstream stages read
//! - [`render_changes`] - the ordered declarative change set handed to an
//!   [`ApplyExecutor`](crate::apply::ApplyExecutor)

pub mod changes;
pub mod outputs;

pub use changes::{
    render_changes, ChangeSet, ResourceChange, ResourceKind, PREFIX_LIST_ADDRESS,
    TRANSIT_GATEWAY_ADDRESS,
};
pub use outputs::{
    render_outputs, PlanOutputs, RouteSummary, RouteTableOutputs, RouteTableSummary,
    VpcAttributes, CENTRAL_VPCS_ATTRIBUTES, NETWORK_FIREWALL_POLICY_ARN, NETWORK_PREFIX_LIST_ID,
    SPOKE_VPCS_ATTRIBUTES, TRANSIT_GATEWAY_ID, TRANSIT_GATEWAY_ROUTE_TABLES,
};

use serde::{Deserialize, Serialize};

use crate::errors::PlanningInvariantError;
use crate::planner::Plan;

/// Everything emitted for one plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub outputs: PlanOutputs,
    pub changes: ChangeSet,
}

/// Render outputs and changes together
pub fn emit(plan: &Plan) -> Result<Emission, PlanningInvariantError> {
    Ok(Emission {
        outputs: render_outputs(plan),
        changes: render_changes(plan)?,
    })
}
