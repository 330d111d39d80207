use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::catalog::CATALOG;
use crate::models::{
    DATE_FORMAT, DEFAULT_CATEGORY, DEFAULT_UNIT, Ingredient, NewIngredient, Recipe, RecipeDetail,
    RecipeIngredient, UpdateIngredient,
};

/// Timestamp in the same shape SQLite's `CURRENT_TIMESTAMP` produces.
fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            // recipe_ingredients.recipe_id is a plain reference: no cascade.
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    category TEXT,
                    quantity INTEGER NOT NULL,
                    unit TEXT,
                    expiry_date TEXT NOT NULL,
                    added_date TEXT DEFAULT CURRENT_TIMESTAMP,
                    updated_date TEXT DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT,
                    instructions TEXT NOT NULL,
                    created_date TEXT DEFAULT CURRENT_TIMESTAMP
                );

                CREATE TABLE IF NOT EXISTS recipe_ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id),
                    ingredient_name TEXT NOT NULL,
                    quantity TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_ingredients_expiry ON ingredients(expiry_date);
                CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn ingredient_from_row(row: &rusqlite::Row) -> rusqlite::Result<Ingredient> {
        Ok(Ingredient {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            quantity: row.get(3)?,
            unit: row.get(4)?,
            expiry_date: row.get(5)?,
            added_date: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            updated_date: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        })
    }

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            instructions: row.get(3)?,
            created_date: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        })
    }

    fn recipe_ingredient_from_row(row: &rusqlite::Row) -> rusqlite::Result<RecipeIngredient> {
        Ok(RecipeIngredient {
            id: row.get(0)?,
            recipe_id: row.get(1)?,
            ingredient_name: row.get(2)?,
            quantity: row.get(3)?,
        })
    }

    // --- Ingredients ---

    pub fn insert_ingredient(&self, ingredient: &NewIngredient) -> Result<Ingredient> {
        let now = now_timestamp();
        let category = ingredient.category.as_deref().unwrap_or(DEFAULT_CATEGORY);
        let unit = ingredient.unit.as_deref().unwrap_or(DEFAULT_UNIT);
        self.conn.execute(
            "INSERT INTO ingredients (name, category, quantity, unit, expiry_date, added_date, updated_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                ingredient.name,
                category,
                ingredient.quantity,
                unit,
                ingredient.expiry_date.format(DATE_FORMAT).to_string(),
                now,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, name = %ingredient.name, "inserted ingredient");
        self.get_ingredient(id)?
            .context("Ingredient vanished after insert")
    }

    pub fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, quantity, unit, expiry_date, added_date, updated_date
             FROM ingredients WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::ingredient_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All ingredients, earliest expiry first. Equal dates keep insertion order.
    pub fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, quantity, unit, expiry_date, added_date, updated_date
             FROM ingredients
             ORDER BY expiry_date ASC, id ASC",
        )?;
        let ingredients = stmt
            .query_map([], Self::ingredient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    /// Overwrite every mutable column. Returns false when no row has `id`.
    pub fn update_ingredient(&self, id: i64, update: &UpdateIngredient) -> Result<bool> {
        let now = now_timestamp();
        let expiry_date = update
            .expiry_date
            .map(|d| d.format(DATE_FORMAT).to_string());
        let rows = self.conn.execute(
            "UPDATE ingredients
             SET name = ?1, category = ?2, quantity = ?3, unit = ?4, expiry_date = ?5, updated_date = ?6
             WHERE id = ?7",
            params![
                update.name,
                update.category,
                update.quantity,
                update.unit,
                expiry_date,
                now,
                id,
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_ingredient(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM ingredients WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Recipes ---

    pub fn count_recipes(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn insert_recipe(
        &self,
        name: &str,
        description: Option<&str>,
        instructions: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO recipes (name, description, instructions, created_date) VALUES (?1, ?2, ?3, ?4)",
            params![name, description, instructions, now_timestamp()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_recipe_ingredient(
        &self,
        recipe_id: i64,
        ingredient_name: &str,
        quantity: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_name, quantity) VALUES (?1, ?2, ?3)",
            params![recipe_id, ingredient_name, quantity],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert the built-in catalog when the recipe table is empty.
    ///
    /// Any existing recipe, whichever it is, suppresses seeding. Statements run
    /// one by one; a failure part way leaves what was already written.
    pub fn seed_recipes(&self) -> Result<bool> {
        if self.count_recipes()? > 0 {
            return Ok(false);
        }

        for recipe in CATALOG {
            let recipe_id = self
                .insert_recipe(recipe.name, Some(recipe.description), recipe.instructions)
                .with_context(|| format!("Failed to seed recipe '{}'", recipe.name))?;
            for (name, quantity) in recipe.ingredients {
                self.add_recipe_ingredient(recipe_id, name, Some(quantity))
                    .with_context(|| format!("Failed to seed ingredient '{name}'"))?;
            }
        }
        info!(count = CATALOG.len(), "seeded initial recipes");
        Ok(true)
    }

    pub fn get_recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, ingredient_name, quantity
             FROM recipe_ingredients
             WHERE recipe_id = ?1
             ORDER BY id",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], Self::recipe_ingredient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    /// Every recipe ingredient in one query, grouped by owning recipe.
    fn recipe_ingredients_by_recipe(&self) -> Result<HashMap<i64, Vec<RecipeIngredient>>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipe_id, ingredient_name, quantity
             FROM recipe_ingredients
             ORDER BY recipe_id, id",
        )?;
        let mut grouped: HashMap<i64, Vec<RecipeIngredient>> = HashMap::new();
        for ingredient in stmt.query_map([], Self::recipe_ingredient_from_row)? {
            let ingredient = ingredient?;
            grouped
                .entry(ingredient.recipe_id)
                .or_default()
                .push(ingredient);
        }
        Ok(grouped)
    }

    pub fn list_recipes(&self) -> Result<Vec<RecipeDetail>> {
        let recipes = {
            let mut stmt = self.conn.prepare(
                "SELECT id, name, description, instructions, created_date FROM recipes ORDER BY id",
            )?;
            stmt.query_map([], Self::recipe_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };
        let mut grouped = self.recipe_ingredients_by_recipe()?;

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let ingredients = grouped.remove(&recipe.id).unwrap_or_default();
                RecipeDetail {
                    recipe,
                    ingredients,
                }
            })
            .collect())
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<RecipeDetail>> {
        let recipe = {
            let mut stmt = self.conn.prepare(
                "SELECT id, name, description, instructions, created_date FROM recipes WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Self::recipe_from_row(row)?,
                None => return Ok(None),
            }
        };
        let ingredients = self.get_recipe_ingredients(id)?;
        Ok(Some(RecipeDetail {
            recipe,
            ingredients,
        }))
    }
}
