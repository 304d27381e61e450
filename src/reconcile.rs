//! Pure reconciliation of the switch-target list.
//!
//! [`reconcile`] derives the list a tenant switcher should present from an
//! [`AssociationSet`] and an optional search term. It is a pure function:
//! no side effects, no mutation of the input set, deterministic output for
//! identical inputs. Callers re-invoke it whenever the underlying set or
//! the search term changes.

use crate::model::{AssociationSet, SwitchTarget, TenantRecord};

/// Compute the switch-target list for a set and a search term.
///
/// The current tenant is removed by domain, first match only; when the
/// current tenant is a synthesized placeholder absent from the list the
/// removal is a no-op. A non-empty `search_term` keeps only records whose
/// domain contains it as a case-insensitive substring, preserving order.
/// An empty term returns the full minus-current list.
pub fn reconcile(set: &AssociationSet, search_term: &str) -> Vec<TenantRecord> {
    let mut result: Vec<TenantRecord> = Vec::with_capacity(set.associated_tenants.len());
    let mut current_removed = false;

    for record in &set.associated_tenants {
        if !current_removed && record.domain == set.current_tenant.domain {
            current_removed = true;
            continue;
        }
        result.push(record.clone());
    }

    if search_term.is_empty() {
        return result;
    }

    let needle = search_term.to_lowercase();
    result.retain(|record| record.domain.to_lowercase().contains(&needle));
    result
}

/// Display label for a tenant entry.
///
/// Region-aware deployments disambiguate identically named tenants by
/// appending the deployment unit name.
pub fn display_label(record: &TenantRecord, region_aware: bool) -> String {
    match (&record.deployment_unit_name, region_aware) {
        (Some(unit), true) => format!("{} ({})", record.domain, unit),
        _ => record.domain.clone(),
    }
}

/// Resolve where a switch to `record` should land.
///
/// The record's console hostname is honored only in region-aware
/// deployments; otherwise the switch stays on the current console host.
pub fn switch_target(record: &TenantRecord, region_aware: bool) -> SwitchTarget {
    SwitchTarget {
        domain: record.domain.clone(),
        console_hostname: if region_aware {
            record.console_hostname.clone()
        } else {
            None
        },
    }
}
