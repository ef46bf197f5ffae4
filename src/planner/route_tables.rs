// Copyright (c) 2025 - Cowboy AI, Inc.
//! Route Table Planner
//!
//! Turns resolved attachments into purpose route tables.
//!
//! # Rules
//!
//! 1. **Tables.** A central role gets a table iff its attachment is
//!    associated. A spoke routing domain gets a table iff at least one of its
//!    spokes associates or propagates. No other tables exist, so a purpose
//!    whose attachments are all detached is absent rather than empty.
//! 2. **Association.** An attachment associates only with its own purpose
//!    table, and only when `associate` is set.
//! 3. **Propagation.** A propagating central attachment publishes into every
//!    spoke table. A propagating spoke publishes into every central table and
//!    into its own domain table, unless east-west inspection is in place
//!    (spoke-to-spoke traffic must then traverse the inspection VPC).
//! 4. **Static routes.** Built from the network definition `ND`:
//!
//! ```text
//! spokes      0.0.0.0/0 -> inspection       (north-south inspection)
//!             ND        -> inspection       (east-west inspection)
//!             0.0.0.0/0 -> egress           (egress, no north-south inspection)
//! egress      ND        -> inspection       (north-south inspection)
//!             ND        -> blackhole        (otherwise)
//! ingress     ND        -> inspection       (north-south inspection)
//! inspection  0.0.0.0/0 -> egress           (egress present)
//! ```
//!
//! A prefix-list `ND` is referenced as-is, never expanded.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::domain::{
    AttachmentId, CentralRole, InspectionFlow, Ipv4Network, NetworkDefinition, Purpose,
    RouteTableId,
};
use crate::errors::PlanningInvariantError;

use super::plan::{
    resource_address, Attachment, RouteDestination, RouteEntry, RouteTarget, TgwRouteTable,
};

/// Logical address of a purpose table, used to derive planned ids
pub fn route_table_address(purpose: &Purpose) -> String {
    resource_address("route_table", purpose, purpose.key())
}

/// Builds purpose route tables for one deployment
#[derive(Debug, Clone)]
pub struct RouteTablePlanner {
    identifier: String,
}

impl RouteTablePlanner {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    /// Build the purpose tables, sorted by purpose
    ///
    /// The result is checked with [`verify`] before it is returned.
    pub fn build(
        &self,
        attachments: &[Attachment],
        network_definition: &NetworkDefinition,
    ) -> Result<Vec<TgwRouteTable>, PlanningInvariantError> {
        let mut central: BTreeMap<CentralRole, &Attachment> = BTreeMap::new();
        let mut domains: BTreeMap<&str, Vec<&Attachment>> = BTreeMap::new();

        for attachment in attachments {
            match &attachment.purpose {
                Purpose::Central(role) => {
                    if central.insert(*role, attachment).is_some() {
                        return Err(PlanningInvariantError::new(
                            attachment.purpose.to_string(),
                            "more than one attachment for a central role",
                        ));
                    }
                }
                Purpose::Spokes(domain) => {
                    domains.entry(domain.as_str()).or_default().push(attachment)
                }
            }
        }

        let inspection = central.get(&CentralRole::Inspection).copied();
        let egress = central.get(&CentralRole::Egress).copied();
        let flow = inspection.and_then(|a| a.inspection_flow);

        let mut tables: BTreeMap<Purpose, TgwRouteTable> = BTreeMap::new();

        for (role, attachment) in &central {
            if attachment.associate {
                let table = self.table(&mut tables, Purpose::Central(*role));
                table.associations.insert(attachment.id.clone());
            }
        }

        for (domain, members) in &domains {
            if members.iter().all(|a| !a.associate && !a.propagate) {
                continue;
            }
            let table = self.table(&mut tables, Purpose::Spokes(domain.to_string()));
            for spoke in members.iter().filter(|a| a.associate) {
                table.associations.insert(spoke.id.clone());
            }
        }

        let central_purposes: Vec<Purpose> = tables
            .keys()
            .filter(|p| matches!(p, Purpose::Central(_)))
            .cloned()
            .collect();

        for attachment in central.values().filter(|a| a.propagate) {
            for table in tables.values_mut() {
                if matches!(table.purpose, Purpose::Spokes(_)) {
                    table.propagations.insert(attachment.id.clone());
                }
            }
        }

        let east_west = flow == Some(InspectionFlow::EastWest);
        for spoke in domains.values().flatten().filter(|a| a.propagate) {
            for purpose in &central_purposes {
                if let Some(table) = tables.get_mut(purpose) {
                    table.propagations.insert(spoke.id.clone());
                }
            }
            if !east_west {
                if let Some(table) = tables.get_mut(&spoke.purpose) {
                    table.propagations.insert(spoke.id.clone());
                }
            }
        }

        let network = RouteDestination::from(network_definition);
        let default_route = RouteDestination::Cidr(Ipv4Network::DEFAULT_ROUTE);
        let to = |a: &Attachment| RouteTarget::Attachment(a.id.clone());

        for table in tables.values_mut() {
            let purpose = table.purpose.clone();
            let routes = &mut table.routes;
            let mut add = |destination: &RouteDestination, target: RouteTarget| {
                routes.insert(RouteEntry {
                    destination: destination.clone(),
                    target,
                });
            };

            match purpose {
                Purpose::Spokes(_) => match (inspection, flow) {
                    (Some(i), Some(InspectionFlow::NorthSouth)) => add(&default_route, to(i)),
                    (Some(i), Some(InspectionFlow::EastWest)) => {
                        add(&network, to(i));
                        if let Some(e) = egress {
                            add(&default_route, to(e));
                        }
                    }
                    _ => {
                        if let Some(e) = egress {
                            add(&default_route, to(e));
                        }
                    }
                },
                Purpose::Central(CentralRole::Egress) => match (inspection, flow) {
                    (Some(i), Some(InspectionFlow::NorthSouth)) => add(&network, to(i)),
                    _ => add(&network, RouteTarget::Blackhole),
                },
                Purpose::Central(CentralRole::Ingress) => {
                    if let (Some(i), Some(InspectionFlow::NorthSouth)) = (inspection, flow) {
                        add(&network, to(i));
                    }
                }
                Purpose::Central(CentralRole::Inspection) => {
                    if let Some(e) = egress {
                        add(&default_route, to(e));
                    }
                }
                Purpose::Central(CentralRole::SharedServices) => {}
            }
        }

        let tables: Vec<TgwRouteTable> = tables.into_values().collect();
        verify(attachments, &tables)?;

        debug!(
            identifier = %self.identifier,
            tables = tables.len(),
            "Route tables planned"
        );

        Ok(tables)
    }

    fn table<'a>(
        &self,
        tables: &'a mut BTreeMap<Purpose, TgwRouteTable>,
        purpose: Purpose,
    ) -> &'a mut TgwRouteTable {
        let id = RouteTableId::planned(&self.identifier, &route_table_address(&purpose));
        tables
            .entry(purpose.clone())
            .or_insert_with(|| TgwRouteTable::new(id, purpose))
    }
}

/// Check a set of purpose tables against the attachments they were built from
///
/// # Invariants
/// - Every table is non-empty
/// - A central table exists only for an associated attachment of that role
/// - Associations are self-purpose and come from associating attachments
/// - Propagations come from propagating attachments
/// - Route targets are known attachments
/// - A destination has at most one route per table
/// - No purpose appears twice
pub fn verify(
    attachments: &[Attachment],
    tables: &[TgwRouteTable],
) -> Result<(), PlanningInvariantError> {
    let by_id: BTreeMap<&AttachmentId, &Attachment> =
        attachments.iter().map(|a| (&a.id, a)).collect();
    let mut seen = BTreeSet::new();

    for table in tables {
        let purpose = table.purpose.to_string();

        if !seen.insert(&table.purpose) {
            return Err(PlanningInvariantError::new(purpose, "duplicate purpose table"));
        }

        if table.is_empty() {
            return Err(PlanningInvariantError::new(
                purpose,
                "table has no associations, propagations or routes",
            ));
        }

        if let Purpose::Central(_) = table.purpose {
            let owner_associated = attachments
                .iter()
                .any(|a| a.purpose == table.purpose && a.associate);
            if !owner_associated {
                return Err(PlanningInvariantError::new(
                    purpose,
                    "table exists but its role's attachment is not associated",
                ));
            }
        }

        for id in &table.associations {
            match by_id.get(id) {
                Some(a) if a.associate && a.purpose == table.purpose => {}
                Some(_) => {
                    return Err(PlanningInvariantError::new(
                        purpose,
                        format!("unexpected association of {}", id),
                    ))
                }
                None => {
                    return Err(PlanningInvariantError::new(
                        purpose,
                        format!("association of unknown attachment {}", id),
                    ))
                }
            }
        }

        for id in &table.propagations {
            match by_id.get(id) {
                Some(a) if a.propagate => {}
                Some(_) => {
                    return Err(PlanningInvariantError::new(
                        purpose,
                        format!("propagation from non-propagating attachment {}", id),
                    ))
                }
                None => {
                    return Err(PlanningInvariantError::new(
                        purpose,
                        format!("propagation from unknown attachment {}", id),
                    ))
                }
            }
        }

        let mut destinations = BTreeSet::new();
        for route in &table.routes {
            if !destinations.insert(&route.destination) {
                return Err(PlanningInvariantError::new(
                    purpose,
                    format!("more than one route for {}", route.destination),
                ));
            }
            if let RouteTarget::Attachment(id) = &route.target {
                if !by_id.contains_key(id) {
                    return Err(PlanningInvariantError::new(
                        purpose,
                        format!("route {} targets unknown attachment {}", route.destination, id),
                    ));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PrefixListId, Provisioning};
    use pretty_assertions::assert_eq;

    fn attachment(vpc: &str, purpose: Purpose, associate: bool, propagate: bool) -> Attachment {
        Attachment {
            id: AttachmentId::planned("unit", vpc),
            vpc: vpc.to_string(),
            inspection_flow: None,
            purpose,
            provisioning: Provisioning::Planned,
            associate,
            propagate,
        }
    }

    fn central(role: CentralRole, flag: bool) -> Attachment {
        attachment(role.as_str(), Purpose::Central(role), flag, flag)
    }

    fn inspection(flow: InspectionFlow, propagate: bool) -> Attachment {
        let mut a = central(CentralRole::Inspection, true);
        a.propagate = propagate;
        a.inspection_flow = Some(flow);
        a
    }

    fn spoke(name: &str, associate: bool, propagate: bool) -> Attachment {
        attachment(name, Purpose::Spokes("spokes".to_string()), associate, propagate)
    }

    fn cidr() -> NetworkDefinition {
        NetworkDefinition::Cidr("10.0.0.0/8".parse().unwrap())
    }

    fn route(destination: RouteDestination, target: &Attachment) -> RouteEntry {
        RouteEntry {
            destination,
            target: RouteTarget::Attachment(target.id.clone()),
        }
    }

    fn default_route() -> RouteDestination {
        RouteDestination::Cidr(Ipv4Network::DEFAULT_ROUTE)
    }

    fn planner() -> RouteTablePlanner {
        RouteTablePlanner::new("unit")
    }

    #[test]
    fn test_detached_central_vpcs_produce_no_tables() {
        let prefix_list = NetworkDefinition::PrefixList(PrefixListId::new("pl-0abc").unwrap());
        let attachments = vec![
            central(CentralRole::Egress, false),
            central(CentralRole::Ingress, false),
        ];
        let tables = planner().build(&attachments, &prefix_list).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_inspection_table_despite_flag() {
        let attachments = vec![inspection(InspectionFlow::NorthSouth, false)];
        let tables = planner().build(&attachments, &cidr()).unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].purpose, Purpose::Central(CentralRole::Inspection));
        assert!(tables[0].associations.contains(&attachments[0].id));
        assert!(tables[0].propagations.is_empty());
        assert!(tables[0].routes.is_empty());
    }

    #[test]
    fn test_shared_services_detached_with_spokes() {
        let shared = central(CentralRole::SharedServices, false);
        let a = spoke("vpc1", true, true);
        let b = spoke("vpc2", true, true);
        let attachments = vec![shared.clone(), a.clone(), b.clone()];

        let tables = planner().build(&attachments, &cidr()).unwrap();
        assert_eq!(tables.len(), 1);

        let spokes = &tables[0];
        assert_eq!(spokes.purpose, Purpose::Spokes("spokes".to_string()));
        assert_eq!(
            spokes.associations,
            BTreeSet::from([a.id.clone(), b.id.clone()])
        );
        // spoke-to-spoke reachability, nothing from the detached shared services VPC
        assert_eq!(spokes.propagations, BTreeSet::from([a.id, b.id]));
        assert!(!spokes.propagations.contains(&shared.id));
    }

    #[test]
    fn test_egress_with_spokes() {
        let egress = central(CentralRole::Egress, true);
        let a = spoke("vpc1", true, true);
        let attachments = vec![egress.clone(), a.clone()];
        let tables = planner().build(&attachments, &cidr()).unwrap();

        let egress_table = &tables[0];
        assert_eq!(egress_table.purpose, Purpose::Central(CentralRole::Egress));
        assert_eq!(egress_table.associations, BTreeSet::from([egress.id.clone()]));
        assert_eq!(egress_table.propagations, BTreeSet::from([a.id.clone()]));
        assert_eq!(
            egress_table.routes,
            BTreeSet::from([RouteEntry {
                destination: RouteDestination::from(&cidr()),
                target: RouteTarget::Blackhole,
            }])
        );

        let spokes_table = &tables[1];
        assert_eq!(
            spokes_table.propagations,
            BTreeSet::from([egress.id.clone(), a.id.clone()])
        );
        assert_eq!(
            spokes_table.routes,
            BTreeSet::from([route(default_route(), &egress)])
        );
    }

    #[test]
    fn test_north_south_inspection_with_egress() {
        let egress = central(CentralRole::Egress, true);
        let ingress = central(CentralRole::Ingress, true);
        let insp = inspection(InspectionFlow::NorthSouth, true);
        let a = spoke("vpc1", true, true);
        let attachments = vec![egress.clone(), ingress.clone(), insp.clone(), a.clone()];
        let tables = planner().build(&attachments, &cidr()).unwrap();
        let get = |p: Purpose| tables.iter().find(|t| t.purpose == p).unwrap();

        let network = RouteDestination::from(&cidr());
        assert_eq!(
            get(Purpose::Central(CentralRole::Egress)).routes,
            BTreeSet::from([route(network.clone(), &insp)])
        );
        assert_eq!(
            get(Purpose::Central(CentralRole::Ingress)).routes,
            BTreeSet::from([route(network, &insp)])
        );
        assert_eq!(
            get(Purpose::Central(CentralRole::Inspection)).routes,
            BTreeSet::from([route(default_route(), &egress)])
        );

        let spokes = get(Purpose::Spokes("spokes".to_string()));
        assert_eq!(spokes.routes, BTreeSet::from([route(default_route(), &insp)]));
        assert!(spokes.propagations.contains(&a.id));
    }

    #[test]
    fn test_east_west_inspection_skips_direct_spoke_propagation() {
        let egress = central(CentralRole::Egress, true);
        let insp = inspection(InspectionFlow::EastWest, false);
        let a = spoke("vpc1", true, true);
        let b = spoke("vpc2", true, true);
        let attachments = vec![egress.clone(), insp.clone(), a.clone(), b.clone()];
        let tables = planner().build(&attachments, &cidr()).unwrap();
        let spokes = tables
            .iter()
            .find(|t| matches!(t.purpose, Purpose::Spokes(_)))
            .unwrap();

        assert!(!spokes.propagations.contains(&a.id));
        assert!(!spokes.propagations.contains(&b.id));
        assert!(spokes.propagations.contains(&egress.id));
        assert_eq!(
            spokes.routes,
            BTreeSet::from([
                route(RouteDestination::from(&cidr()), &insp),
                route(default_route(), &egress)
            ])
        );

        let inspection_table = tables
            .iter()
            .find(|t| t.purpose == Purpose::Central(CentralRole::Inspection))
            .unwrap();
        assert!(inspection_table.propagations.contains(&a.id));
        assert!(inspection_table.propagations.contains(&b.id));
    }

    #[test]
    fn test_prefix_list_referenced_not_expanded() {
        let prefix_list = NetworkDefinition::PrefixList(PrefixListId::new("pl-0abc").unwrap());
        let attachments = vec![central(CentralRole::Egress, true)];
        let tables = planner().build(&attachments, &prefix_list).unwrap();

        let route = tables[0].routes.iter().next().unwrap();
        assert_eq!(
            route.destination,
            RouteDestination::PrefixList(PrefixListId::new("pl-0abc").unwrap())
        );
    }

    #[test]
    fn test_spoke_propagate_only_and_associate_only() {
        let propagate_only = spoke("vpc1", false, true);
        let associate_only = spoke("vpc2", true, false);
        let attachments = vec![propagate_only.clone(), associate_only.clone()];
        let tables = planner().build(&attachments, &cidr()).unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].associations,
            BTreeSet::from([associate_only.id])
        );
        assert_eq!(
            tables[0].propagations,
            BTreeSet::from([propagate_only.id])
        );
    }

    #[test]
    fn test_detached_spokes_produce_no_table() {
        let attachments = vec![spoke("vpc1", false, false), spoke("vpc2", false, false)];
        assert!(planner().build(&attachments, &cidr()).unwrap().is_empty());
    }

    #[test]
    fn test_verify_rejects_suppressed_purpose_with_association() {
        let egress = central(CentralRole::Egress, false);
        let mut table = TgwRouteTable::new(
            RouteTableId::planned("unit", "rt"),
            Purpose::Central(CentralRole::Egress),
        );
        table.associations.insert(egress.id.clone());

        let err = verify(&[egress], &[table]).unwrap_err();
        assert_eq!(err.purpose, "central_vpcs.egress");
    }

    #[test]
    fn test_verify_rejects_empty_table() {
        let a = spoke("vpc1", true, true);
        let table = TgwRouteTable::new(
            RouteTableId::planned("unit", "rt"),
            Purpose::Spokes("spokes".to_string()),
        );
        assert!(verify(&[a], &[table]).is_err());
    }

    #[test]
    fn test_verify_rejects_second_route_for_destination() {
        let egress = central(CentralRole::Egress, true);
        let insp = inspection(InspectionFlow::EastWest, true);
        let mut table = TgwRouteTable::new(
            RouteTableId::planned("unit", "rt"),
            Purpose::Spokes("spokes".to_string()),
        );
        table.routes.insert(route(default_route(), &insp));
        table.routes.insert(route(default_route(), &egress));

        let err = verify(&[egress, insp], &[table]).unwrap_err();
        assert_eq!(err.purpose, "spoke_vpcs.spokes");
        assert!(err.detail.contains("0.0.0.0/0"));
    }

    #[test]
    fn test_verify_rejects_cross_association() {
        let egress = central(CentralRole::Egress, true);
        let ingress = central(CentralRole::Ingress, true);
        let mut table = TgwRouteTable::new(
            RouteTableId::planned("unit", "rt"),
            Purpose::Central(CentralRole::Egress),
        );
        table.associations.insert(egress.id.clone());
        table.associations.insert(ingress.id.clone());

        assert!(verify(&[egress, ingress], &[table]).is_err());
    }
}
