//! Recipe routes. COGS is always recomputed here from current inventory
//! prices before anything is written.

use axum::{
    Json, Router,
    Extension,
    extract::{Path, Query, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    routing::{get, put},
};
use chrono::Utc;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::costing::{compute_cogs, sku::format_sku};
use crate::database::ListFilter;
use crate::database::models::{NewRecipe, Recipe, RecipeInput, RecipeSummary, RecipeUpdate};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::routes::{ListQuery, PageMeta};
use crate::server::AppState;

/// Protected; the caller layers the auth middleware on top.
pub fn create_recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe", get(list_recipes).post(create_recipe))
        .route("/recipe/{id}", put(update_recipe))
}

#[derive(Debug, Serialize)]
pub struct RecipePage {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub recipes: Vec<Recipe>,
}

/// `POST /recipe`
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<ApiResponse<RecipeSummary>, AppError> {
    let Json(input) = payload?;

    let cogs = compute_cogs(&input.ingredients, input.number_of_cups, state.store.as_ref()).await?;

    let today = Utc::now().date_naive();
    let sequence = state.store.next_sku_sequence(today).await?;
    let recipe = state
        .store
        .create_recipe(&NewRecipe {
            sku: format_sku(today, sequence),
            number_of_cups: input.number_of_cups,
            ingredients: input.ingredients,
            cogs,
        })
        .await?;

    tracing::info!("🧾 Recipe {} added by {}, cogs={}", recipe.sku, user.email, recipe.cogs);
    Ok(ApiResponse::ok("Recipe added successfully").with_data(RecipeSummary::from(&recipe)))
}

/// `GET /recipe?page=&limit=&search=`, newest first
pub async fn list_recipes(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<ApiResponse<RecipePage>, AppError> {
    let Query(query) = query?;
    let filter = ListFilter::from(query);

    let page = state.store.list_recipes(&filter).await?;
    let payload = RecipePage {
        meta: PageMeta::new(&filter, page.total),
        recipes: page.items,
    };
    Ok(ApiResponse::ok("Recipes retrieved successfully").with_data(payload))
}

/// `PUT /recipe/{id}`: replace cups and ingredients, keep the SKU.
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<ApiResponse<RecipeSummary>, AppError> {
    let Path(id) = id?;
    let existing = state.store.get_recipe(id).await?;
    let Json(input) = payload?;

    let cogs = compute_cogs(&input.ingredients, input.number_of_cups, state.store.as_ref()).await?;
    let recipe = state
        .store
        .update_recipe(
            existing.id,
            &RecipeUpdate {
                number_of_cups: input.number_of_cups,
                ingredients: input.ingredients,
                cogs,
            },
        )
        .await?;

    tracing::info!("🧾 Recipe {} updated by {}, cogs={}", recipe.sku, user.email, recipe.cogs);
    Ok(ApiResponse::ok("Recipe updated successfully").with_data(RecipeSummary::from(&recipe)))
}
