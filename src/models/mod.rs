pub mod authz;
pub mod expense;
pub mod policy;
pub mod summary;
pub mod user;

// Re-export only the types we actually use
pub use authz::{authorize, can_view, Action, Role};
pub use expense::{Attachment, Expense, ExpenseStatus};
pub use policy::{approval_levels_for_amount, level_label, over_limit, Category, Currency};
pub use summary::ExpenseSummary;
pub use user::{TeamMember, User};
