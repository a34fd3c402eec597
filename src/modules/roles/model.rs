//! The fixed role catalog and per-user grants.
//!
//! Roles are not user-editable: the catalog is [`RoleId::ALL`], mirrored into
//! the `roles` table at startup so grants can reference it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fren_core::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleId {
    SettingView,
    SettingEdit,
    ReportView,
    ContractEdit,
    PlanEdit,
    UserView,
    UserEdit,
    DatasetLock,
    DatasetImport,
}

impl RoleId {
    pub const ALL: [RoleId; 9] = [
        RoleId::SettingView,
        RoleId::SettingEdit,
        RoleId::ReportView,
        RoleId::ContractEdit,
        RoleId::PlanEdit,
        RoleId::UserView,
        RoleId::UserEdit,
        RoleId::DatasetLock,
        RoleId::DatasetImport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RoleId::SettingView => "SettingView",
            RoleId::SettingEdit => "SettingEdit",
            RoleId::ReportView => "ReportView",
            RoleId::ContractEdit => "ContractEdit",
            RoleId::PlanEdit => "PlanEdit",
            RoleId::UserView => "UserView",
            RoleId::UserEdit => "UserEdit",
            RoleId::DatasetLock => "DatasetLock",
            RoleId::DatasetImport => "DatasetImport",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RoleId::SettingView => "Can view settings",
            RoleId::SettingEdit => "Can edit settings",
            RoleId::ReportView => "Can view reports",
            RoleId::ContractEdit => "Can edit contracts",
            RoleId::PlanEdit => "Can edit plans",
            RoleId::UserView => "Can view users",
            RoleId::UserEdit => "Can edit users",
            RoleId::DatasetLock => "Can lock datasets",
            RoleId::DatasetImport => "Can import dataset totals",
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleId::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AppError::invalid_parameter("roleId"))
    }
}

/// Whether a user holds a catalog role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleGrant {
    pub id: RoleId,
    pub description: &'static str,
    pub value: bool,
}

impl RoleGrant {
    pub fn new(id: RoleId, value: bool) -> Self {
        Self {
            id,
            description: id.description(),
            value,
        }
    }
}

/// One or more roles named by a route's accept/reject option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet(Vec<RoleId>);

impl RoleSet {
    pub fn iter(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<RoleId> for RoleSet {
    fn from(role: RoleId) -> Self {
        RoleSet(vec![role])
    }
}

impl<const N: usize> From<[RoleId; N]> for RoleSet {
    fn from(roles: [RoleId; N]) -> Self {
        RoleSet(roles.to_vec())
    }
}

impl From<Vec<RoleId>> for RoleSet {
    fn from(roles: Vec<RoleId>) -> Self {
        RoleSet(roles)
    }
}
