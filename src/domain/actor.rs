use serde::{Deserialize, Serialize};

/// Role attached to a verified request.
///
/// The identity collaborator authenticates callers and hands the core an
/// already-verified `(id, role)` pair; the core trusts this input. `System`
/// is reserved for the scheduler that closes out finished stays.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Tenant,
    System,
}

/// Per-request actor context, passed explicitly into every service call.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Actor {
    pub id: u64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: u64, role: Role) -> Self {
        Self { id, role }
    }
}
