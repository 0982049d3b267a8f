//! Recipe SKUs: `IC-YYYYMMDD-NNN`.
//!
//! NNN restarts at 001 every UTC calendar day.

use chrono::NaiveDate;

use crate::database::models::Recipe;

pub const SKU_PREFIX: &str = "IC";

pub fn format_sku(day: NaiveDate, sequence: u32) -> String {
    format!("{}-{}-{:03}", SKU_PREFIX, day.format("%Y%m%d"), sequence)
}

/// Sequence suffix of a well-formed SKU.
pub fn parse_sequence(sku: &str) -> Option<u32> {
    let mut parts = sku.splitn(3, '-');
    let (prefix, date, sequence) = (parts.next()?, parts.next()?, parts.next()?);
    if prefix != SKU_PREFIX || date.len() != 8 || NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
        return None;
    }
    if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    sequence.parse().ok()
}

/// Sequence number for the next recipe created on `today`, given the most
/// recently created recipe.
///
/// A same-day predecessor whose SKU cannot be parsed counts as sequence 1.
pub fn next_sequence(today: NaiveDate, most_recent: Option<&Recipe>) -> u32 {
    match most_recent {
        Some(recipe) if recipe.created_at.date_naive() == today => {
            parse_sequence(&recipe.sku).unwrap_or(1).saturating_add(1)
        }
        _ => 1,
    }
}

pub fn generate_sku(today: NaiveDate, most_recent: Option<&Recipe>) -> String {
    format_sku(today, next_sequence(today, most_recent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Ingredients;
    use rust_decimal::Decimal;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn recipe_created(sku: &str, on: NaiveDate) -> Recipe {
        let created_at = on.and_hms_opt(9, 30, 0).unwrap().and_utc();
        Recipe {
            id: 1,
            sku: sku.to_string(),
            number_of_cups: 1,
            ingredients: Ingredients::new(),
            cogs: Decimal::ZERO,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn first_recipe_of_the_day_is_001() {
        let today = day(2024, 9, 14);
        assert_eq!(generate_sku(today, None), "IC-20240914-001");

        let yesterday = recipe_created("IC-20240913-007", day(2024, 9, 13));
        assert_eq!(generate_sku(today, Some(&yesterday)), "IC-20240914-001");
    }

    #[test]
    fn same_day_increments() {
        let today = day(2024, 9, 14);
        let first = recipe_created("IC-20240914-001", today);
        assert_eq!(generate_sku(today, Some(&first)), "IC-20240914-002");

        let ninth = recipe_created("IC-20240914-009", today);
        assert_eq!(generate_sku(today, Some(&ninth)), "IC-20240914-010");
    }

    #[test]
    fn unparseable_same_day_sku_counts_as_first() {
        let today = day(2024, 9, 14);
        let odd = recipe_created("legacy-sku", today);
        assert_eq!(generate_sku(today, Some(&odd)), "IC-20240914-002");
    }

    #[test]
    fn sequence_widens_past_999() {
        assert_eq!(format_sku(day(2024, 1, 2), 1000), "IC-20240102-1000");
    }

    #[test]
    fn parses_sequence_suffix() {
        assert_eq!(parse_sequence("IC-20240914-042"), Some(42));
        assert_eq!(parse_sequence("IC-20240914-"), None);
        assert_eq!(parse_sequence("XX-20240914-001"), None);
        assert_eq!(parse_sequence("IC-2024091-001"), None);
        assert_eq!(parse_sequence("IC-20240914-0a1"), None);
    }
}
