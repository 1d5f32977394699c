use axum::Json;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::models::{level_label, Category, Currency};

/// The static policy table: category ceilings, currency rates and the
/// approval routing steps. Loaded once into the binary, read-only.
pub async fn policies() -> Json<Value> {
    let categories: Vec<Value> = Category::ALL
        .iter()
        .map(|cat| {
            json!({
                "value": cat.as_str(),
                "label": cat.label(),
                "limit": cat.limit(),
            })
        })
        .collect();

    let currencies: Vec<Value> = Currency::ALL
        .iter()
        .map(|cur| json!({ "code": cur.code(), "rate": cur.rate() }))
        .collect();

    let approval_steps: Vec<Value> = [
        (1, None),
        (2, Some(Decimal::new(500, 0))),
        (3, Some(Decimal::new(1000, 0))),
    ]
    .iter()
    .map(|(level, threshold)| {
        json!({
            "level": level,
            "label": level_label(*level),
            "min_amount_exclusive": threshold,
        })
    })
    .collect();

    Json(json!({
        "categories": categories,
        "currencies": currencies,
        "approval_steps": approval_steps,
    }))
}
