use serde::Serialize;

use super::expense::ExpenseStatus;
use crate::error::AppError;

/// One role per user. Everyone starts as `Employee`; the rest are assigned
/// through the team settings endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Supervisor,
    Admin,
    Finance,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Supervisor => "supervisor",
            Role::Admin => "admin",
            Role::Finance => "finance",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "employee" => Some(Role::Employee),
            "supervisor" => Some(Role::Supervisor),
            "admin" => Some(Role::Admin),
            "finance" => Some(Role::Finance),
            _ => None,
        }
    }

    pub fn can_approve(self) -> bool {
        matches!(self, Role::Supervisor | Role::Admin | Role::Finance)
    }

    pub fn can_manage_team(self) -> bool {
        matches!(self, Role::Supervisor | Role::Admin)
    }

    /// Approver roles see the whole queue; employees only their own rows.
    pub fn can_view_all(self) -> bool {
        self.can_approve()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EditDraft,
    Submit,
    Approve,
    Reject,
    ManageTeam,
}

/// Table-driven capability check: role x action x ownership. Approvers may
/// never decide their own expenses.
pub fn authorize(role: Role, action: Action, is_owner: bool) -> Result<(), AppError> {
    let allowed = match action {
        Action::EditDraft | Action::Submit => is_owner,
        Action::Approve | Action::Reject => role.can_approve() && !is_owner,
        Action::ManageTeam => role.can_manage_team(),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Visibility check. Drafts are private to their owner; everything else is
/// visible to the owner and to approver roles.
pub fn can_view(role: Role, is_owner: bool, status: ExpenseStatus) -> bool {
    if is_owner {
        return true;
    }
    role.can_view_all() && status != ExpenseStatus::Draft
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_cannot_approve_anything() {
        assert!(authorize(Role::Employee, Action::Approve, false).is_err());
        assert!(authorize(Role::Employee, Action::Approve, true).is_err());
        assert!(authorize(Role::Employee, Action::Reject, false).is_err());
    }

    #[test]
    fn approver_roles_decide_others_expenses() {
        for role in [Role::Supervisor, Role::Admin, Role::Finance] {
            assert!(authorize(role, Action::Approve, false).is_ok());
            assert!(authorize(role, Action::Reject, false).is_ok());
        }
    }

    #[test]
    fn self_approval_is_denied_for_every_role() {
        for role in [Role::Supervisor, Role::Admin, Role::Finance] {
            assert!(authorize(role, Action::Approve, true).is_err());
            assert!(authorize(role, Action::Reject, true).is_err());
        }
    }

    #[test]
    fn only_the_owner_edits_or_submits() {
        assert!(authorize(Role::Employee, Action::EditDraft, true).is_ok());
        assert!(authorize(Role::Employee, Action::Submit, true).is_ok());
        assert!(authorize(Role::Admin, Action::EditDraft, false).is_err());
        assert!(authorize(Role::Admin, Action::Submit, false).is_err());
    }

    #[test]
    fn team_management_is_supervisor_and_admin_only() {
        assert!(authorize(Role::Supervisor, Action::ManageTeam, false).is_ok());
        assert!(authorize(Role::Admin, Action::ManageTeam, false).is_ok());
        assert!(authorize(Role::Finance, Action::ManageTeam, false).is_err());
        assert!(authorize(Role::Employee, Action::ManageTeam, false).is_err());
    }

    #[test]
    fn owners_always_see_their_rows() {
        for status in [
            ExpenseStatus::Draft,
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
        ] {
            assert!(can_view(Role::Employee, true, status));
        }
    }

    #[test]
    fn drafts_are_invisible_to_approvers() {
        assert!(!can_view(Role::Supervisor, false, ExpenseStatus::Draft));
        assert!(can_view(Role::Supervisor, false, ExpenseStatus::Pending));
        assert!(can_view(Role::Finance, false, ExpenseStatus::Approved));
    }

    #[test]
    fn employees_never_see_other_peoples_expenses() {
        assert!(!can_view(Role::Employee, false, ExpenseStatus::Pending));
        assert!(!can_view(Role::Employee, false, ExpenseStatus::Approved));
    }

    #[test]
    fn role_parse_roundtrip() {
        for role in [Role::Employee, Role::Supervisor, Role::Admin, Role::Finance] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("carga"), None);
    }
}
