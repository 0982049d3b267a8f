//! COGS calculation.
//!
//! Each ingredient is priced against its catalog entry and multiplied by the
//! number of produced units:
//!
//! | unit    | item cost                                   |
//! |---------|---------------------------------------------|
//! | `g`     | amount × price_per_qty / (quantity × 1000)  |
//! | `kg`    | amount × price_per_qty                      |
//! | `ml`    | amount × price_per_qty / (quantity × 1000)  |
//! | `liter` | amount × price_per_qty                      |
//! | `pcs`   | amount × price_per_qty / quantity, 0 if quantity ≤ 0 |

use rust_decimal::Decimal;

use crate::costing::{units::Unit, CostingError};
use crate::database::models::{Ingredients, InventoryItem, Measurement};
use crate::database::store::Catalog;

const SMALL_UNITS_PER_BIG: Decimal = Decimal::ONE_THOUSAND;

/// Cost of a single measurement of `item`, before multiplying by produced units.
pub fn item_cost(item: &InventoryItem, measurement: &Measurement, unit: Unit) -> Result<Decimal, CostingError> {
    let overflow = || CostingError::Overflow(item.item_name.clone());
    let amount = measurement.amount;

    match unit {
        Unit::G | Unit::Ml => {
            if item.quantity.is_zero() {
                return Err(CostingError::ZeroQuantity(item.item_name.clone()));
            }
            let denominator = item.quantity.checked_mul(SMALL_UNITS_PER_BIG).ok_or_else(overflow)?;
            let per_small_unit = item.price_per_qty.checked_div(denominator).ok_or_else(overflow)?;
            amount.checked_mul(per_small_unit).ok_or_else(overflow)
        }
        Unit::Kg | Unit::Liter => amount.checked_mul(item.price_per_qty).ok_or_else(overflow),
        Unit::Pcs => {
            if item.quantity > Decimal::ZERO {
                let per_piece = item.price_per_qty.checked_div(item.quantity).ok_or_else(overflow)?;
                amount.checked_mul(per_piece).ok_or_else(overflow)
            } else {
                Ok(Decimal::ZERO)
            }
        }
    }
}

/// Total cost of producing `units_produced` units of a recipe.
///
/// Ingredients are resolved in name order; the first failure aborts the whole
/// calculation and no partial total is returned.
pub async fn compute_cogs<C>(
    ingredients: &Ingredients,
    units_produced: i32,
    catalog: &C,
) -> Result<Decimal, CostingError>
where
    C: Catalog + ?Sized,
{
    if units_produced < 1 {
        return Err(CostingError::InvalidUnitsProduced(units_produced));
    }
    let multiplier = Decimal::from(units_produced);

    let mut total = Decimal::ZERO;
    for (name, measurement) in ingredients {
        let item = catalog
            .find_by_name(name)
            .await?
            .ok_or_else(|| CostingError::ItemNotFound(name.clone()))?;

        let unit: Unit = measurement
            .unit
            .parse()
            .map_err(|_| CostingError::InvalidUnit(measurement.unit.clone()))?;

        let cost = item_cost(&item, measurement, unit)?;
        tracing::debug!("Priced {} {} {} of {} at {}", measurement.amount, unit, name, item.item_name, cost);

        total = cost
            .checked_mul(multiplier)
            .and_then(|scaled| total.checked_add(scaled))
            .ok_or_else(|| CostingError::Overflow(name.clone()))?;
    }

    Ok(total.normalize())
}
