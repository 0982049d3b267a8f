//! PostgreSQL `Store` backed by the deadpool connection pool.

use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::{error::SqlState, types::Json, Row};

use crate::costing::sku;
use crate::database::models::{
    FromRow, InventoryInput, InventoryItem, NewRecipe, Recipe, RecipeUpdate, User,
};
use crate::database::store::{Catalog, ListFilter, Paged, Store, StoreError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn client(&self) -> Result<deadpool_postgres::Object, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to get DB connection: {}", e)))
    }
}

/// Backend error, or `Conflict(column)` when a unique constraint rejected the write.
fn map_db_error(column: &'static str) -> impl Fn(tokio_postgres::Error) -> StoreError {
    move |e| {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            StoreError::Conflict(column)
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}

fn backend(e: tokio_postgres::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn rows_to<T: FromRow>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.iter().map(|row| T::from_row(row).map_err(backend)).collect()
}

/// `%needle%` for ILIKE with the wildcard characters of `needle` escaped.
fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(|needle| {
        let escaped = needle
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

#[async_trait]
impl Catalog for PgStore {
    async fn find_by_name(&self, item_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM inventory_items WHERE item_name = $1", &[&item_name])
            .await
            .map_err(backend)?;
        row.map(|r| InventoryItem::from_row(&r).map_err(backend)).transpose()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_inventory(&self, filter: &ListFilter) -> Result<Paged<InventoryItem>, StoreError> {
        let client = self.client().await?;
        let pattern = like_pattern(filter.search.as_deref());
        let limit = i64::from(filter.limit);
        let offset = filter.offset() as i64;

        let total: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM inventory_items WHERE ($1::TEXT IS NULL OR item_name ILIKE $1)",
                &[&pattern],
            )
            .await
            .map_err(backend)?
            .get(0);

        let rows = client
            .query(
                "SELECT * FROM inventory_items
                 WHERE ($1::TEXT IS NULL OR item_name ILIKE $1)
                 ORDER BY id
                 LIMIT $2 OFFSET $3",
                &[&pattern, &limit, &offset],
            )
            .await
            .map_err(backend)?;

        Ok(Paged { items: rows_to(rows)?, total })
    }

    async fn create_inventory(&self, input: &InventoryInput) -> Result<InventoryItem, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "INSERT INTO inventory_items (item_name, quantity, uom, price_per_qty)
                 VALUES ($1, $2, $3, $4)
                 RETURNING *",
                &[&input.item_name, &input.quantity, &input.uom, &input.price_per_qty],
            )
            .await
            .map_err(map_db_error("item_name"))?;
        InventoryItem::from_row(&row).map_err(backend)
    }

    async fn update_inventory(&self, id: i64, input: &InventoryInput) -> Result<InventoryItem, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "UPDATE inventory_items
                 SET item_name = $1, quantity = $2, uom = $3, price_per_qty = $4, updated_at = NOW()
                 WHERE id = $5
                 RETURNING *",
                &[&input.item_name, &input.quantity, &input.uom, &input.price_per_qty, &id],
            )
            .await
            .map_err(map_db_error("item_name"))?
            .ok_or(StoreError::NotFound("inventory item"))?;
        InventoryItem::from_row(&row).map_err(backend)
    }

    async fn delete_inventory(&self, id: i64) -> Result<(), StoreError> {
        let client = self.client().await?;
        let deleted = client
            .execute("DELETE FROM inventory_items WHERE id = $1", &[&id])
            .await
            .map_err(backend)?;
        if deleted == 0 {
            return Err(StoreError::NotFound("inventory item"));
        }
        Ok(())
    }

    async fn list_recipes(&self, filter: &ListFilter) -> Result<Paged<Recipe>, StoreError> {
        let client = self.client().await?;
        let pattern = like_pattern(filter.search.as_deref());
        let limit = i64::from(filter.limit);
        let offset = filter.offset() as i64;

        let total: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM recipes WHERE ($1::TEXT IS NULL OR sku ILIKE $1)",
                &[&pattern],
            )
            .await
            .map_err(backend)?
            .get(0);

        let rows = client
            .query(
                "SELECT * FROM recipes
                 WHERE ($1::TEXT IS NULL OR sku ILIKE $1)
                 ORDER BY id DESC
                 LIMIT $2 OFFSET $3",
                &[&pattern, &limit, &offset],
            )
            .await
            .map_err(backend)?;

        Ok(Paged { items: rows_to(rows)?, total })
    }

    async fn get_recipe(&self, id: i64) -> Result<Recipe, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM recipes WHERE id = $1", &[&id])
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound("recipe"))?;
        Recipe::from_row(&row).map_err(backend)
    }

    async fn latest_recipe(&self) -> Result<Option<Recipe>, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT * FROM recipes ORDER BY created_at DESC, id DESC LIMIT 1", &[])
            .await
            .map_err(backend)?;
        row.map(|r| Recipe::from_row(&r).map_err(backend)).transpose()
    }

    async fn next_sku_sequence(&self, day: NaiveDate) -> Result<u32, StoreError> {
        let mut client = self.client().await?;
        let tx = client.transaction().await.map_err(backend)?;

        let bumped = tx
            .query_opt(
                "UPDATE sku_sequences SET last_value = last_value + 1 WHERE day = $1 RETURNING last_value",
                &[&day],
            )
            .await
            .map_err(backend)?;

        let value: i32 = match bumped {
            Some(row) => row.get(0),
            None => {
                // First recipe of the day on this counter: continue from any
                // recipe already created today.
                let latest = tx
                    .query_opt("SELECT * FROM recipes ORDER BY created_at DESC, id DESC LIMIT 1", &[])
                    .await
                    .map_err(backend)?
                    .map(|r| Recipe::from_row(&r))
                    .transpose()
                    .map_err(backend)?;
                let seed = i32::try_from(sku::next_sequence(day, latest.as_ref()))
                    .map_err(|_| StoreError::Backend("SKU sequence out of range".to_string()))?;

                tx.query_one(
                    "INSERT INTO sku_sequences (day, last_value) VALUES ($1, $2)
                     ON CONFLICT (day) DO UPDATE SET last_value = sku_sequences.last_value + 1
                     RETURNING last_value",
                    &[&day, &seed],
                )
                .await
                .map_err(backend)?
                .get(0)
            }
        };

        tx.commit().await.map_err(backend)?;
        u32::try_from(value).map_err(|_| StoreError::Backend(format!("invalid SKU sequence {}", value)))
    }

    async fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "INSERT INTO recipes (sku, number_of_cups, ingredients, cogs)
                 VALUES ($1, $2, $3, $4)
                 RETURNING *",
                &[&recipe.sku, &recipe.number_of_cups, &Json(&recipe.ingredients), &recipe.cogs],
            )
            .await
            .map_err(map_db_error("sku"))?;
        Recipe::from_row(&row).map_err(backend)
    }

    async fn update_recipe(&self, id: i64, update: &RecipeUpdate) -> Result<Recipe, StoreError> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                "UPDATE recipes
                 SET number_of_cups = $1, ingredients = $2, cogs = $3, updated_at = NOW()
                 WHERE id = $4
                 RETURNING *",
                &[&update.number_of_cups, &Json(&update.ingredients), &update.cogs, &id],
            )
            .await
            .map_err(backend)?
            .ok_or(StoreError::NotFound("recipe"))?;
        Recipe::from_row(&row).map_err(backend)
    }

    async fn is_magic_link_consumed(&self, token: &str) -> Result<bool, StoreError> {
        let client = self.client().await?;
        client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM consumed_magic_links WHERE token = $1)",
                &[&token],
            )
            .await
            .map(|row| row.get(0))
            .map_err(backend)
    }

    async fn store_access_token(&self, email: &str, token: &str) -> Result<User, StoreError> {
        let mut client = self.client().await?;
        let tx = client.transaction().await.map_err(backend)?;

        // The primary key rejects every later redemption of the same token,
        // concurrent or not.
        tx.execute("INSERT INTO consumed_magic_links (token) VALUES ($1)", &[&token])
            .await
            .map_err(map_db_error("access_token"))?;

        let row = tx
            .query_one(
                "INSERT INTO users (email, access_token) VALUES ($1, $2)
                 ON CONFLICT (email) DO UPDATE
                 SET access_token = EXCLUDED.access_token, updated_at = NOW()
                 RETURNING *",
                &[&email, &token],
            )
            .await
            .map_err(map_db_error("access_token"))?;
        let user = User::from_row(&row).map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{migrations::run_migrations, DatabaseConfig, DatabaseConnection};
    use chrono::Utc;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("bean")).as_deref(), Some("%bean%"));
        assert_eq!(like_pattern(Some("50%_off")).as_deref(), Some("%50\\%\\_off%"));
    }

    // The tests below need a disposable database:
    // DATABASE_URL=postgres://... cargo test -- --ignored

    async fn connect() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for --ignored tests");
        let db = DatabaseConnection::new(DatabaseConfig::from_url(&url, 4).unwrap())
            .await
            .unwrap();
        run_migrations(db.pool()).await.unwrap();
        PgStore::new(db.pool().clone())
    }

    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
    }

    #[tokio::test]
    #[ignore]
    async fn sku_sequence_is_atomic_per_day() {
        let store = connect().await;
        let day = NaiveDate::from_ymd_opt(2999, 12, 31).unwrap();
        store
            .client()
            .await
            .unwrap()
            .execute("DELETE FROM sku_sequences WHERE day = $1", &[&day])
            .await
            .unwrap();

        let (a, b) = tokio::join!(store.next_sku_sequence(day), store.next_sku_sequence(day));
        let mut pair = [a.unwrap(), b.unwrap()];
        pair.sort();
        assert_eq!(pair, [1, 2]);
        assert_eq!(store.next_sku_sequence(day).await.unwrap(), 3);
    }

    #[tokio::test]
    #[ignore]
    async fn access_token_is_consumed_once() {
        let store = connect().await;
        let email = format!("{}@example.com", unique("pg"));
        let first = unique("link-a");
        let second = unique("link-b");

        let user = store.store_access_token(&email, &first).await.unwrap();
        assert_eq!(user.access_token.as_deref(), Some(first.as_str()));
        assert!(store.is_magic_link_consumed(&first).await.unwrap());
        assert!(matches!(
            store.store_access_token(&email, &first).await,
            Err(StoreError::Conflict("access_token"))
        ));

        let updated = store.store_access_token(&email, &second).await.unwrap();
        assert_eq!(updated.id, user.id);
        assert!(matches!(
            store.store_access_token(&email, &first).await,
            Err(StoreError::Conflict("access_token"))
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn concurrent_redemptions_of_one_token_conflict() {
        let store = connect().await;
        let email = format!("{}@example.com", unique("pg-race"));
        let token = unique("link-race");

        let (a, b) = tokio::join!(
            store.store_access_token(&email, &token),
            store.store_access_token(&email, &token)
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(r, Err(StoreError::Conflict("access_token")))));
    }
}
