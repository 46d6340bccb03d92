use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator role attached to a login.
///
/// Controls which operations the access gate lets through; see
/// `homecare_users::permissions` for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    #[default]
    Staff,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Doctor => write!(f, "doctor"),
            Role::Staff => write!(f, "staff"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "staff" => Ok(Role::Staff),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// The three record types held by the store.
///
/// Declaration order is the canonical export order (patients, staff, schedules).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Patients,
    Staff,
    Schedules,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Patients, EntityKind::Staff, EntityKind::Schedules];

    /// SQLite table and spreadsheet sheet name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Patients => "patients",
            EntityKind::Staff => "staff",
            EntityKind::Schedules => "schedules",
        }
    }

    /// Human title used for report section headings.
    pub fn title(&self) -> &'static str {
        match self {
            EntityKind::Patients => "Patients",
            EntityKind::Staff => "Staff",
            EntityKind::Schedules => "Schedule",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patients" | "patient" => Ok(EntityKind::Patients),
            "staff" => Ok(EntityKind::Staff),
            "schedules" | "schedule" | "visits" => Ok(EntityKind::Schedules),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// Operation tags checked by the access gate.
///
/// Adding a tag here forces every match over it (the permission table
/// included) to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    ViewPatients,
    EditPatients,
    ViewStaff,
    EditStaff,
    ViewSchedules,
    EditSchedules,
    Export,
    Backup,
    ManageUsers,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::ViewPatients,
        Operation::EditPatients,
        Operation::ViewStaff,
        Operation::EditStaff,
        Operation::ViewSchedules,
        Operation::EditSchedules,
        Operation::Export,
        Operation::Backup,
        Operation::ManageUsers,
    ];

    /// The edit tag for an entity kind.
    pub fn edit(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Patients => Operation::EditPatients,
            EntityKind::Staff => Operation::EditStaff,
            EntityKind::Schedules => Operation::EditSchedules,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::ViewPatients => "view-patients",
            Operation::EditPatients => "edit-patients",
            Operation::ViewStaff => "view-staff",
            Operation::EditStaff => "edit-staff",
            Operation::ViewSchedules => "view-schedules",
            Operation::EditSchedules => "edit-schedules",
            Operation::Export => "export",
            Operation::Backup => "backup",
            Operation::ManageUsers => "manage-users",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Doctor, Role::Staff] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn entity_kind_accepts_singular_aliases() {
        assert_eq!("schedule".parse::<EntityKind>().unwrap(), EntityKind::Schedules);
        assert_eq!(" Patients ".parse::<EntityKind>().unwrap(), EntityKind::Patients);
    }

    #[test]
    fn operation_tags_are_kebab_case() {
        assert_eq!(Operation::EditSchedules.to_string(), "edit-schedules");
        let json = serde_json::to_string(&Operation::ManageUsers).unwrap();
        assert_eq!(json, "\"manage-users\"");
    }
}
