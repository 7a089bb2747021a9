//! Mapping internal crate errors onto the boundary taxonomy.

use argus_audit::AuditError;
use argus_core::ArgusError;
use argus_sim::SimError;
use argus_store::StoreError;

pub(crate) fn store_err(e: StoreError) -> ArgusError {
    ArgusError::Store(e.to_string())
}

pub(crate) fn audit_err(e: AuditError) -> ArgusError {
    ArgusError::Store(e.to_string())
}

pub(crate) fn sim_err(e: SimError) -> ArgusError {
    ArgusError::Simulator(e.to_string())
}
