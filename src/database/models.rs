// Database Models
//
// Tokio-postgres compatible models for the inventory catalog, recipes and users.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::{types::Json, Row};

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> where Self: Sized;
}

// ============================================================================
// INVENTORY
// ============================================================================

/// Catalog entry. `quantity` and `price_per_qty` are denominated in `uom`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: i64,
    pub item_name: String,
    pub quantity: Decimal,
    pub uom: String,
    pub price_per_qty: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for InventoryItem {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            item_name: row.try_get("item_name")?,
            quantity: row.try_get::<_, Decimal>("quantity")?,
            uom: row.try_get("uom")?,
            price_per_qty: row.try_get::<_, Decimal>("price_per_qty")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Create/update payload for an inventory item
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryInput {
    pub item_name: String,
    pub quantity: Decimal,
    pub uom: String,
    pub price_per_qty: Decimal,
}

// ============================================================================
// RECIPES
// ============================================================================

/// Amount of one ingredient, e.g. `{ "amount": 15, "unit": "g" }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub amount: Decimal,
    pub unit: String,
}

/// Ingredient name -> measurement, ordered by name
pub type Ingredients = BTreeMap<String, Measurement>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub sku: String,
    pub number_of_cups: i32,
    pub ingredients: Ingredients,
    pub cogs: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Recipe {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        let Json(ingredients) = row.try_get::<_, Json<Ingredients>>("ingredients")?;
        Ok(Self {
            id: row.try_get("id")?,
            sku: row.try_get("sku")?,
            number_of_cups: row.try_get("number_of_cups")?,
            ingredients,
            cogs: row.try_get::<_, Decimal>("cogs")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Client payload for creating or updating a recipe. COGS is never accepted from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub number_of_cups: i32,
    pub ingredients: Ingredients,
}

/// Fully priced recipe ready to be written
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub sku: String,
    pub number_of_cups: i32,
    pub ingredients: Ingredients,
    pub cogs: Decimal,
}

/// Fields replaced on update; the SKU is never touched
#[derive(Debug, Clone)]
pub struct RecipeUpdate {
    pub number_of_cups: i32,
    pub ingredients: Ingredients,
    pub cogs: Decimal,
}

/// Response body for recipe create/update
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub sku: String,
    pub cogs: Decimal,
    pub number_of_cups: i32,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            sku: recipe.sku.clone(),
            cogs: recipe.cogs,
            number_of_cups: recipe.number_of_cups,
        }
    }
}

// ============================================================================
// USERS
// ============================================================================

/// Account created on first magic-link redemption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Last redeemed magic-link token; overwritten on every redemption
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            access_token: row.try_get("access_token")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
