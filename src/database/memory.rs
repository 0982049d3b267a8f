//! In-process `Store` for tests and database-less local runs.
//!
//! All tables live behind one mutex, so every operation is atomic.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;

use crate::costing::sku;
use crate::database::models::{
    InventoryInput, InventoryItem, NewRecipe, Recipe, RecipeUpdate, User,
};
use crate::database::store::{Catalog, ListFilter, Paged, Store, StoreError};

#[derive(Debug, Default)]
struct Tables {
    inventory: BTreeMap<i64, InventoryItem>,
    recipes: BTreeMap<i64, Recipe>,
    users: BTreeMap<i64, User>,
    sku_sequences: HashMap<NaiveDate, u32>,
    consumed_magic_links: HashSet<String>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn latest_recipe(&self) -> Option<&Recipe> {
        self.recipes.values().max_by_key(|r| (r.created_at, r.id))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(matching: Vec<&T>, filter: &ListFilter) -> Paged<T> {
    let total = matching.len() as i64;
    let items = matching
        .into_iter()
        .skip(filter.offset() as usize)
        .take(filter.limit as usize)
        .cloned()
        .collect();
    Paged { items, total }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn find_by_name(&self, item_name: &str) -> Result<Option<InventoryItem>, StoreError> {
        let tables = self.tables.lock();
        Ok(tables.inventory.values().find(|i| i.item_name == item_name).cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_inventory(&self, filter: &ListFilter) -> Result<Paged<InventoryItem>, StoreError> {
        let tables = self.tables.lock();
        let matching = tables.inventory.values().filter(|i| filter.matches(&i.item_name)).collect();
        Ok(page(matching, filter))
    }

    async fn create_inventory(&self, input: &InventoryInput) -> Result<InventoryItem, StoreError> {
        let mut tables = self.tables.lock();
        if tables.inventory.values().any(|i| i.item_name == input.item_name) {
            return Err(StoreError::Conflict("item_name"));
        }
        let now = Utc::now();
        let item = InventoryItem {
            id: tables.allocate_id(),
            item_name: input.item_name.clone(),
            quantity: input.quantity,
            uom: input.uom.clone(),
            price_per_qty: input.price_per_qty,
            created_at: now,
            updated_at: now,
        };
        tables.inventory.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_inventory(&self, id: i64, input: &InventoryInput) -> Result<InventoryItem, StoreError> {
        let mut tables = self.tables.lock();
        if tables.inventory.values().any(|i| i.id != id && i.item_name == input.item_name) {
            return Err(StoreError::Conflict("item_name"));
        }
        let item = tables.inventory.get_mut(&id).ok_or(StoreError::NotFound("inventory item"))?;
        item.item_name = input.item_name.clone();
        item.quantity = input.quantity;
        item.uom = input.uom.clone();
        item.price_per_qty = input.price_per_qty;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_inventory(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.lock();
        tables
            .inventory
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound("inventory item"))
    }

    async fn list_recipes(&self, filter: &ListFilter) -> Result<Paged<Recipe>, StoreError> {
        let tables = self.tables.lock();
        let matching = tables.recipes.values().rev().filter(|r| filter.matches(&r.sku)).collect();
        Ok(page(matching, filter))
    }

    async fn get_recipe(&self, id: i64) -> Result<Recipe, StoreError> {
        let tables = self.tables.lock();
        tables.recipes.get(&id).cloned().ok_or(StoreError::NotFound("recipe"))
    }

    async fn latest_recipe(&self) -> Result<Option<Recipe>, StoreError> {
        Ok(self.tables.lock().latest_recipe().cloned())
    }

    async fn next_sku_sequence(&self, day: NaiveDate) -> Result<u32, StoreError> {
        let mut tables = self.tables.lock();
        let next = match tables.sku_sequences.get(&day) {
            Some(last) => last + 1,
            None => sku::next_sequence(day, tables.latest_recipe()),
        };
        tables.sku_sequences.insert(day, next);
        Ok(next)
    }

    async fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        let mut tables = self.tables.lock();
        if tables.recipes.values().any(|r| r.sku == recipe.sku) {
            return Err(StoreError::Conflict("sku"));
        }
        let now = Utc::now();
        let created = Recipe {
            id: tables.allocate_id(),
            sku: recipe.sku.clone(),
            number_of_cups: recipe.number_of_cups,
            ingredients: recipe.ingredients.clone(),
            cogs: recipe.cogs,
            created_at: now,
            updated_at: now,
        };
        tables.recipes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_recipe(&self, id: i64, update: &RecipeUpdate) -> Result<Recipe, StoreError> {
        let mut tables = self.tables.lock();
        let recipe = tables.recipes.get_mut(&id).ok_or(StoreError::NotFound("recipe"))?;
        recipe.number_of_cups = update.number_of_cups;
        recipe.ingredients = update.ingredients.clone();
        recipe.cogs = update.cogs;
        recipe.updated_at = Utc::now();
        Ok(recipe.clone())
    }

    async fn is_magic_link_consumed(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.tables.lock().consumed_magic_links.contains(token))
    }

    async fn store_access_token(&self, email: &str, token: &str) -> Result<User, StoreError> {
        let mut tables = self.tables.lock();
        if !tables.consumed_magic_links.insert(token.to_string()) {
            return Err(StoreError::Conflict("access_token"));
        }

        let now = Utc::now();
        if let Some(user) = tables.users.values_mut().find(|u| u.email == email) {
            user.access_token = Some(token.to_string());
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: tables.allocate_id(),
            email: email.to_string(),
            access_token: Some(token.to_string()),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Ingredients;
    use rust_decimal::Decimal;

    fn input(name: &str) -> InventoryInput {
        InventoryInput {
            item_name: name.to_string(),
            quantity: Decimal::ONE,
            uom: "kg".to_string(),
            price_per_qty: Decimal::ONE_HUNDRED,
        }
    }

    fn new_recipe(sku: &str) -> NewRecipe {
        NewRecipe {
            sku: sku.to_string(),
            number_of_cups: 1,
            ingredients: Ingredients::new(),
            cogs: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn inventory_names_are_unique() {
        let store = MemoryStore::new();
        let sugar = store.create_inventory(&input("Aren Sugar")).await.unwrap();
        store.create_inventory(&input("Milk")).await.unwrap();

        assert!(matches!(
            store.create_inventory(&input("Aren Sugar")).await,
            Err(StoreError::Conflict("item_name"))
        ));
        assert!(matches!(
            store.update_inventory(sugar.id, &input("Milk")).await,
            Err(StoreError::Conflict("item_name"))
        ));
        // Renaming to its own name is fine.
        assert!(store.update_inventory(sugar.id, &input("Aren Sugar")).await.is_ok());
    }

    #[tokio::test]
    async fn inventory_list_pages_and_searches() {
        let store = MemoryStore::new();
        for name in ["Coffee Bean", "Milk", "Decaf Bean", "Ice Cube"] {
            store.create_inventory(&input(name)).await.unwrap();
        }

        let beans = store
            .list_inventory(&ListFilter { search: Some("BEAN".into()), page: 1, limit: 10 })
            .await
            .unwrap();
        assert_eq!(beans.total, 2);
        assert_eq!(beans.items[0].item_name, "Coffee Bean");

        let second_page = store
            .list_inventory(&ListFilter { search: None, page: 2, limit: 3 })
            .await
            .unwrap();
        assert_eq!(second_page.total, 4);
        assert_eq!(second_page.items.len(), 1);
        assert_eq!(second_page.items[0].item_name, "Ice Cube");
    }

    #[tokio::test]
    async fn delete_unknown_inventory_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.delete_inventory(42).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn recipes_list_newest_first() {
        let store = MemoryStore::new();
        store.create_recipe(&new_recipe("IC-20240914-001")).await.unwrap();
        store.create_recipe(&new_recipe("IC-20240914-002")).await.unwrap();

        let listed = store.list_recipes(&ListFilter::default()).await.unwrap();
        assert_eq!(listed.items[0].sku, "IC-20240914-002");

        let filtered = store
            .list_recipes(&ListFilter { search: Some("-001".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(filtered.total, 1);
    }

    #[tokio::test]
    async fn sku_sequence_counts_per_day() {
        let store = MemoryStore::new();
        let today = Utc::now().date_naive();
        let tomorrow = today.succ_opt().unwrap();

        assert_eq!(store.next_sku_sequence(today).await.unwrap(), 1);
        assert_eq!(store.next_sku_sequence(today).await.unwrap(), 2);
        assert_eq!(store.next_sku_sequence(tomorrow).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sku_sequence_continues_from_existing_recipe() {
        let store = MemoryStore::new();
        let today = Utc::now().date_naive();
        store
            .create_recipe(&new_recipe(&sku::format_sku(today, 4)))
            .await
            .unwrap();

        assert_eq!(store.next_sku_sequence(today).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn access_token_is_single_use() {
        let store = MemoryStore::new();
        let first = store.store_access_token("a@example.com", "token-1").await.unwrap();
        assert_eq!(first.access_token.as_deref(), Some("token-1"));

        assert!(matches!(
            store.store_access_token("a@example.com", "token-1").await,
            Err(StoreError::Conflict("access_token"))
        ));

        let updated = store.store_access_token("a@example.com", "token-2").await.unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.access_token.as_deref(), Some("token-2"));
        assert!(store.is_magic_link_consumed("token-1").await.unwrap());
        assert!(store.is_magic_link_consumed("token-2").await.unwrap());
        assert!(!store.is_magic_link_consumed("token-3").await.unwrap());
    }

    #[tokio::test]
    async fn overwritten_token_stays_consumed() {
        let store = MemoryStore::new();
        store.store_access_token("a@example.com", "token-1").await.unwrap();
        store.store_access_token("a@example.com", "token-2").await.unwrap();

        assert!(matches!(
            store.store_access_token("a@example.com", "token-1").await,
            Err(StoreError::Conflict("access_token"))
        ));
    }
}
