use rust_decimal::Decimal;
use serde::Serialize;

/// Expense categories with their advisory spending limits, in base-currency
/// units. Exceeding a limit warns the submitter but never blocks submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Meals,
    Travel,
    Transport,
    Supplies,
    Software,
    Training,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Meals,
        Category::Travel,
        Category::Transport,
        Category::Supplies,
        Category::Software,
        Category::Training,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Meals => "meals",
            Category::Travel => "travel",
            Category::Transport => "transport",
            Category::Supplies => "supplies",
            Category::Software => "software",
            Category::Training => "training",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "meals" => Some(Category::Meals),
            "travel" => Some(Category::Travel),
            "transport" => Some(Category::Transport),
            "supplies" => Some(Category::Supplies),
            "software" => Some(Category::Software),
            "training" => Some(Category::Training),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Meals => "Comidas y Entretenimiento",
            Category::Travel => "Viajes y Alojamiento",
            Category::Transport => "Transporte",
            Category::Supplies => "Suministros de Oficina",
            Category::Software => "Software y Licencias",
            Category::Training => "Formación",
        }
    }

    pub fn limit(self) -> Decimal {
        let units = match self {
            Category::Meals => 500,
            Category::Travel => 2000,
            Category::Transport => 300,
            Category::Supplies => 200,
            Category::Software => 1000,
            Category::Training => 800,
        };
        Decimal::new(units, 0)
    }
}

/// Supported currencies with fixed conversion rates into the base currency.
/// The rate is snapshotted onto the expense row at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Currency {
    Eur,
    Usd,
    Gbp,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Eur, Currency::Usd, Currency::Gbp];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
        }
    }

    pub fn parse(s: &str) -> Option<Currency> {
        match s {
            "EUR" => Some(Currency::Eur),
            "USD" => Some(Currency::Usd),
            "GBP" => Some(Currency::Gbp),
            _ => None,
        }
    }

    pub fn rate(self) -> Decimal {
        match self {
            Currency::Eur => Decimal::ONE,
            Currency::Usd => Decimal::new(92, 2),
            Currency::Gbp => Decimal::new(117, 2),
        }
    }
}

/// How many sign-offs an amount nominally requires. Thresholds are strict:
/// exactly 500 stays at one level, exactly 1000 at two.
pub fn approval_levels_for_amount(amount: Decimal) -> i32 {
    if amount > Decimal::new(1000, 0) {
        3
    } else if amount > Decimal::new(500, 0) {
        2
    } else {
        1
    }
}

/// Display label for an approval level. Level 1 is resolved to the
/// submitter's supervisor; levels 2 and 3 are role-routed, never a person.
pub fn level_label(level: i32) -> &'static str {
    match level {
        1 => "Supervisor Directo",
        2 => "Director Financiero",
        _ => "Director General",
    }
}

/// Advisory check against the category ceiling, on the base-currency amount.
pub fn over_limit(category: Category, normalized_amount: Decimal) -> bool {
    normalized_amount > category.limit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn approval_levels_are_strict_at_thresholds() {
        assert_eq!(approval_levels_for_amount(dec("500")), 1);
        assert_eq!(approval_levels_for_amount(dec("500.01")), 2);
        assert_eq!(approval_levels_for_amount(dec("1000")), 2);
        assert_eq!(approval_levels_for_amount(dec("1000.01")), 3);
    }

    #[test]
    fn approval_levels_band_interior() {
        assert_eq!(approval_levels_for_amount(dec("0")), 1);
        assert_eq!(approval_levels_for_amount(dec("125.50")), 1);
        assert_eq!(approval_levels_for_amount(dec("750")), 2);
        assert_eq!(approval_levels_for_amount(dec("2500")), 3);
    }

    #[test]
    fn category_limits_match_policy_table() {
        assert_eq!(Category::Meals.limit(), dec("500"));
        assert_eq!(Category::Travel.limit(), dec("2000"));
        assert_eq!(Category::Transport.limit(), dec("300"));
        assert_eq!(Category::Supplies.limit(), dec("200"));
        assert_eq!(Category::Software.limit(), dec("1000"));
        assert_eq!(Category::Training.limit(), dec("800"));
    }

    #[test]
    fn over_limit_is_strict() {
        assert!(!over_limit(Category::Travel, dec("750")));
        assert!(!over_limit(Category::Travel, dec("2000")));
        assert!(over_limit(Category::Travel, dec("2500")));
    }

    #[test]
    fn category_parse_roundtrip() {
        for cat in Category::ALL {
            assert_eq!(Category::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(Category::parse("entertainment"), None);
    }

    #[test]
    fn currency_parse_and_rates() {
        for cur in Currency::ALL {
            assert_eq!(Currency::parse(cur.code()), Some(cur));
        }
        assert_eq!(Currency::Eur.rate(), Decimal::ONE);
        assert_eq!(Currency::parse("JPY"), None);
    }

    #[test]
    fn level_labels() {
        assert_eq!(level_label(1), "Supervisor Directo");
        assert_eq!(level_label(2), "Director Financiero");
        assert_eq!(level_label(3), "Director General");
    }
}
