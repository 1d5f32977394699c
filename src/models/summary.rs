use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::expense::Expense;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub count: i64,
    pub total: Decimal,
}

/// Read-only fold over a fetched expense set. Sums are in the base currency;
/// recomputed from scratch on every load, which is fine at the row counts the
/// dashboards see.
#[derive(Debug, Serialize)]
pub struct ExpenseSummary {
    pub by_status: BTreeMap<String, Bucket>,
    pub by_category: BTreeMap<String, Bucket>,
    pub expense_count: i64,
    pub grand_total: Decimal,
}

impl ExpenseSummary {
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        let mut by_status: BTreeMap<String, Bucket> = BTreeMap::new();
        let mut by_category: BTreeMap<String, Bucket> = BTreeMap::new();
        let mut grand_total = Decimal::ZERO;

        for expense in expenses {
            let amount = expense.normalized_amount().unwrap_or_default();
            grand_total += amount;

            let status = by_status.entry(expense.status.clone()).or_default();
            status.count += 1;
            status.total += amount;

            let category_key = expense
                .category
                .clone()
                .unwrap_or_else(|| "uncategorized".to_string());
            let category = by_category.entry(category_key).or_default();
            category.count += 1;
            category.total += amount;
        }

        ExpenseSummary {
            by_status,
            by_category,
            expense_count: expenses.len() as i64,
            grand_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;
    use uuid::Uuid;

    fn expense(status: &str, category: Option<&str>, amount: &str, rate: &str) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: Some(Decimal::from_str(amount).unwrap()),
            currency: "EUR".to_string(),
            exchange_rate: Decimal::from_str(rate).unwrap(),
            category: category.map(str::to_string),
            description: Some("test".to_string()),
            notes: None,
            project: None,
            expense_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            status: status.to_string(),
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
    fn empty_set_folds_to_zero() {
        let summary = ExpenseSummary::from_expenses(&[]);
        assert_eq!(summary.expense_count, 0);
        assert_eq!(summary.grand_total, Decimal::ZERO);
        assert!(summary.by_status.is_empty());
        assert!(summary.by_category.is_empty());
    }

    #[test]
    fn buckets_by_status_and_category() {
        let expenses = vec![
            expense("pending", Some("travel"), "280.00", "1"),
            expense("pending", Some("meals"), "125.50", "1"),
            expense("approved", Some("transport"), "45.20", "1"),
            expense("rejected", Some("meals"), "89.30", "1"),
        ];
        let summary = ExpenseSummary::from_expenses(&expenses);

        assert_eq!(summary.expense_count, 4);
        assert_eq!(summary.by_status["pending"].count, 2);
        assert_eq!(
            summary.by_status["pending"].total,
            Decimal::from_str("405.50").unwrap()
        );
        assert_eq!(summary.by_status["approved"].count, 1);
        assert_eq!(summary.by_category["meals"].count, 2);
        assert_eq!(
            summary.by_category["meals"].total,
            Decimal::from_str("214.80").unwrap()
        );
        assert_eq!(
            summary.grand_total,
            Decimal::from_str("540.00").unwrap()
        );
    }

    #[test]
    fn sums_use_the_normalized_amount() {
        let expenses = vec![expense("pending", Some("software"), "100", "0.92")];
        let summary = ExpenseSummary::from_expenses(&expenses);
        assert_eq!(
            summary.grand_total,
            Decimal::from_str("92.00").unwrap()
        );
    }

    #[test]
    fn missing_category_lands_in_uncategorized() {
        let expenses = vec![expense("draft", None, "10", "1")];
        let summary = ExpenseSummary::from_expenses(&expenses);
        assert_eq!(summary.by_category["uncategorized"].count, 1);
    }
}
