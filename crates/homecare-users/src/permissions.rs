use std::collections::BTreeSet;

use homecare_core::{Operation, Role};
use tracing::warn;

use crate::error::{Result, UserError};

/// Static role → operation table.
///
/// | Role   | Operations |
/// |--------|------------|
/// | admin  | everything |
/// | doctor | view/edit patients, view staff, view/edit schedules, export |
/// | staff  | view patients, view staff, view schedules |
pub struct AccessGate;

impl AccessGate {
    /// Whether `role` may perform `op`. Matching on both keeps the table
    /// exhaustive when a tag is added.
    pub fn allows(role: Role, op: Operation) -> bool {
        use Operation::*;
        match role {
            Role::Admin => true,
            Role::Doctor => match op {
                ViewPatients | EditPatients | ViewStaff | ViewSchedules | EditSchedules
                | Export => true,
                EditStaff | Backup | ManageUsers => false,
            },
            Role::Staff => match op {
                ViewPatients | ViewStaff | ViewSchedules => true,
                EditPatients | EditStaff | EditSchedules | Export | Backup | ManageUsers => false,
            },
        }
    }

    pub fn permitted_operations(role: Role) -> BTreeSet<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| Self::allows(role, *op))
            .collect()
    }

    /// Fail with [`UserError::PermissionDenied`] unless `role` may perform `op`.
    pub fn require(role: Role, op: Operation) -> Result<()> {
        if Self::allows(role, op) {
            Ok(())
        } else {
            warn!(%role, operation = %op, "operation denied");
            Err(UserError::PermissionDenied { role, operation: op })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gets_everything() {
        assert_eq!(
            AccessGate::permitted_operations(Role::Admin),
            Operation::ALL.into_iter().collect()
        );
    }

    #[test]
    fn doctor_table() {
        use Operation::*;
        assert_eq!(
            AccessGate::permitted_operations(Role::Doctor),
            BTreeSet::from([
                ViewPatients,
                EditPatients,
                ViewStaff,
                ViewSchedules,
                EditSchedules,
                Export
            ])
        );
    }

    #[test]
    fn staff_table() {
        use Operation::*;
        assert_eq!(
            AccessGate::permitted_operations(Role::Staff),
            BTreeSet::from([ViewPatients, ViewStaff, ViewSchedules])
        );
    }

    #[test]
    fn require_reports_role_and_operation() {
        let err = AccessGate::require(Role::Staff, Operation::EditPatients).unwrap_err();
        assert!(matches!(
            err,
            UserError::PermissionDenied {
                role: Role::Staff,
                operation: Operation::EditPatients
            }
        ));
        assert!(AccessGate::require(Role::Doctor, Operation::Export).is_ok());
        assert!(AccessGate::require(Role::Doctor, Operation::Backup).is_err());
    }
}
