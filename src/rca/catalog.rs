use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{ProbeKind, RcaError, Result};

/// One entry of the fixed probe catalog presented to the model during RCA.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeCatalogEntry {
    pub kind: ProbeKind,
    pub description: &'static str,
}

/// The closed, process-wide probe catalog. Never grows at runtime: adding a
/// probe means adding a `ProbeKind` variant and a case in `probes::run_probe`.
pub struct ProbeCatalog;

impl ProbeCatalog {
    pub fn entries() -> Vec<ProbeCatalogEntry> {
        ProbeKind::ALL
            .iter()
            .map(|k| ProbeCatalogEntry {
                kind: *k,
                description: k.description(),
            })
            .collect()
    }
}

/// One tenant's mapping from the short code used in requests to the
/// warehouse view backing its data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantEntry {
    pub short_code: String,
    pub warehouse_view_id: String,
}

/// Process-wide immutable (after startup) tenant registry.
#[derive(Debug, Clone, Default)]
pub struct TenantRegistry {
    entries: HashMap<String, TenantEntry>,
}

impl TenantRegistry {
    pub fn from_entries(entries: Vec<TenantEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (e.short_code.clone(), e))
            .collect();
        Self { entries }
    }

    pub fn resolve(&self, short_code: &str) -> Result<&TenantEntry> {
        self.entries
            .get(short_code)
            .ok_or_else(|| RcaError::UnknownTenant(short_code.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

lazy_static! {
    static ref GLOBAL_TENANT_REGISTRY: RwLock<TenantRegistry> = RwLock::new(TenantRegistry::default());
}

/// Loads the tenant registry once at startup. Later calls replace it, which
/// should only happen in tests; production code calls this exactly once.
pub fn init_tenant_registry(registry: TenantRegistry) {
    *GLOBAL_TENANT_REGISTRY.write().unwrap() = registry;
}

pub fn global_tenant_registry() -> TenantRegistry {
    GLOBAL_TENANT_REGISTRY.read().unwrap().clone()
}
