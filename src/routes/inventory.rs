//! Inventory catalog routes.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    Extension,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    routing::{get, put},
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::costing::Unit;
use crate::database::ListFilter;
use crate::database::models::{InventoryInput, InventoryItem};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::{ListQuery, PageMeta};
use crate::server::AppState;

/// Protected; the caller layers the auth middleware on top.
pub fn create_inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory).post(create_inventory))
        .route("/inventory/{id}", put(update_inventory).delete(delete_inventory))
}

#[derive(Debug, Serialize)]
pub struct InventoryPage {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub inventory: Vec<InventoryItem>,
}

/// Trim the name, canonicalize the unit and reject negative amounts.
fn validate(input: InventoryInput) -> Result<InventoryInput, AppError> {
    let mut fields = BTreeMap::new();

    let item_name = input.item_name.trim().to_string();
    if item_name.is_empty() {
        fields.insert("item_name".to_string(), "item_name is required".to_string());
    }

    let uom = match input.uom.parse::<Unit>() {
        Ok(unit) => unit.as_str().to_string(),
        Err(_) => {
            fields.insert("uom".to_string(), "invalid unit".to_string());
            input.uom
        }
    };

    if input.quantity < Decimal::ZERO {
        fields.insert("quantity".to_string(), "quantity must not be negative".to_string());
    }
    if input.price_per_qty < Decimal::ZERO {
        fields.insert("price_per_qty".to_string(), "price_per_qty must not be negative".to_string());
    }

    if !fields.is_empty() {
        return Err(AppError::Validation { message: "Invalid input".to_string(), fields });
    }

    Ok(InventoryInput {
        item_name,
        quantity: input.quantity,
        uom,
        price_per_qty: input.price_per_qty,
    })
}

/// `GET /inventory?page=&limit=&search=`
pub async fn list_inventory(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ApiResponse<InventoryPage>, AppError> {
    let Query(query) = query?;
    let filter = ListFilter::from(query);

    let page = state.store.list_inventory(&filter).await?;
    let payload = InventoryPage {
        meta: PageMeta::new(&filter, page.total),
        inventory: page.items,
    };
    Ok(ApiResponse::ok("Inventory retrieved successfully").with_data(payload))
}

/// `POST /inventory`
pub async fn create_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<InventoryInput>, JsonRejection>,
) -> Result<ApiResponse<InventoryItem>, AppError> {
    let Json(input) = payload?;
    let input = validate(input)?;

    let item = state.store.create_inventory(&input).await?;
    tracing::info!("📦 Inventory item {} added (id={}) by {}", item.item_name, item.id, user.email);
    Ok(ApiResponse::ok("Inventory item added successfully").keyed("inventory", item))
}

/// `PUT /inventory/{id}`
pub async fn update_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<InventoryInput>, JsonRejection>,
) -> Result<ApiResponse<InventoryItem>, AppError> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let input = validate(input)?;

    let item = state.store.update_inventory(id, &input).await?;
    tracing::info!("📦 Inventory item {} updated (id={}) by {}", item.item_name, item.id, user.email);
    Ok(ApiResponse::ok("Inventory item updated successfully").keyed("inventory", item))
}

/// `DELETE /inventory/{id}`
pub async fn delete_inventory(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let Path(id) = id?;
    state.store.delete_inventory(id).await?;
    tracing::info!("🗑️ Inventory item {} deleted by {}", id, user.email);
    Ok(ApiResponse::ok("Inventory item deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::cogs::tests::d;

    fn input(name: &str, quantity: &str, uom: &str, price: &str) -> InventoryInput {
        InventoryInput {
            item_name: name.to_string(),
            quantity: d(quantity),
            uom: uom.to_string(),
            price_per_qty: d(price),
        }
    }

    #[test]
    fn canonicalizes_valid_input() {
        let valid = validate(input("  Milk ", "1", " Liter", "40000")).unwrap();
        assert_eq!(valid.item_name, "Milk");
        assert_eq!(valid.uom, "liter");
    }

    #[test]
    fn collects_every_invalid_field() {
        let err = validate(input(" ", "-1", "cup", "-5")).unwrap_err();
        match err {
            AppError::Validation { fields, .. } => {
                let keys: Vec<_> = fields.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["item_name", "price_per_qty", "quantity", "uom"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_amounts_are_allowed() {
        assert!(validate(input("Napkin", "0", "pcs", "0")).is_ok());
    }
}
