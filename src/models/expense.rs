use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle states of an expense. `Approved` and `Rejected` are terminal:
/// once reached, no further status-changing transition is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseStatus::Draft => "draft",
            ExpenseStatus::Pending => "pending",
            ExpenseStatus::Approved => "approved",
            ExpenseStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ExpenseStatus> {
        match s {
            "draft" => Some(ExpenseStatus::Draft),
            "pending" => Some(ExpenseStatus::Pending),
            "approved" => Some(ExpenseStatus::Approved),
            "rejected" => Some(ExpenseStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ExpenseStatus::Approved | ExpenseStatus::Rejected)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Option<Decimal>,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub category: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub project: Option<String>,
    pub expense_date: Option<NaiveDate>,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub required_levels: Option<i32>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// The `status` column carries a CHECK constraint, so an unknown value
    /// only appears on a hand-edited row; treat it as still in draft.
    pub fn lifecycle_status(&self) -> ExpenseStatus {
        ExpenseStatus::parse(&self.status).unwrap_or(ExpenseStatus::Draft)
    }

    /// Amount converted into the base currency with the snapshotted rate.
    pub fn normalized_amount(&self) -> Option<Decimal> {
        self.amount.map(|a| a * self.exchange_rate)
    }

    /// Which required submit inputs are still missing. An empty return means
    /// the draft is ready to enter `pending`. Runs before any upload or row
    /// write, so an incomplete submit never reaches the store.
    pub fn missing_for_submit(&self, attachment_count: usize) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self
            .description
            .as_deref()
            .map_or(true, |d| d.trim().is_empty())
        {
            missing.push("description");
        }
        if self.category.is_none() {
            missing.push("category");
        }
        if self.expense_date.is_none() {
            missing.push("expense_date");
        }
        if attachment_count == 0 {
            missing.push("attachments");
        }
        missing
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct Attachment {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub media_type: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn draft(amount: Option<&str>, description: Option<&str>) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: amount.map(|a| Decimal::from_str(a).unwrap()),
            currency: "EUR".to_string(),
            exchange_rate: Decimal::ONE,
            category: Some("travel".to_string()),
            description: description.map(str::to_string),
            notes: None,
            project: None,
            expense_date: Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            status: "draft".to_string(),
            submitted_at: None,
            required_levels: None,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn complete_draft_has_nothing_missing() {
        let expense = draft(Some("750"), Some("Vuelo Madrid-Barcelona"));
        assert!(expense.missing_for_submit(1).is_empty());
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let mut expense = draft(None, None);
        expense.category = None;
        expense.expense_date = None;
        assert_eq!(
            expense.missing_for_submit(0),
            vec![
                "amount",
                "description",
                "category",
                "expense_date",
                "attachments"
            ]
        );
    }

    #[test]
    fn blank_description_counts_as_missing() {
        let expense = draft(Some("100"), Some("   "));
        assert_eq!(expense.missing_for_submit(1), vec!["description"]);
    }

    #[test]
    fn zero_attachments_blocks_submit() {
        let expense = draft(Some("100"), Some("Taxi aeropuerto"));
        assert_eq!(expense.missing_for_submit(0), vec!["attachments"]);
    }

    #[test]
    fn terminal_states() {
        assert!(ExpenseStatus::Approved.is_terminal());
        assert!(ExpenseStatus::Rejected.is_terminal());
        assert!(!ExpenseStatus::Draft.is_terminal());
        assert!(!ExpenseStatus::Pending.is_terminal());
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            ExpenseStatus::Draft,
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
        ] {
            assert_eq!(ExpenseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExpenseStatus::parse("denied"), None);
    }

    #[test]
    fn normalized_amount_uses_snapshotted_rate() {
        let mut expense = draft(Some("100"), Some("Licencia anual"));
        expense.currency = "USD".to_string();
        expense.exchange_rate = Decimal::from_str("0.92").unwrap();
        assert_eq!(
            expense.normalized_amount(),
            Some(Decimal::from_str("92.00").unwrap())
        );
    }
}
