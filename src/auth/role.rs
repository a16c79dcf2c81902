use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capability level of a principal. Closed set; `SuperAdmin` bypasses every
/// role allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,
    QualityTech,
    Engineer,
    Shipping,
    LabTech,
    Admin,
    Owner,
    SuperAdmin,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Worker,
        Role::QualityTech,
        Role::Engineer,
        Role::Shipping,
        Role::LabTech,
        Role::Admin,
        Role::Owner,
        Role::SuperAdmin,
    ];

    /// Every role that belongs to a tenant.
    pub const TENANT_ROLES: [Role; 7] = [
        Role::Worker,
        Role::QualityTech,
        Role::Engineer,
        Role::Shipping,
        Role::LabTech,
        Role::Admin,
        Role::Owner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::QualityTech => "quality_tech",
            Role::Engineer => "engineer",
            Role::Shipping => "shipping",
            Role::LabTech => "lab_tech",
            Role::Admin => "admin",
            Role::Owner => "owner",
            Role::SuperAdmin => "super_admin",
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Tenant managers see and moderate everything inside their tenant.
    pub fn is_tenant_manager(&self) -> bool {
        matches!(self, Role::Admin | Role::Owner | Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s.trim())
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
