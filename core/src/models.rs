use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "other";
pub const DEFAULT_UNIT: &str = "units";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit: Option<String>,
    pub expiry_date: String,
    pub added_date: String,
    pub updated_date: String,
}

#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub unit: Option<String>,
    pub expiry_date: NaiveDate,
}

/// Full overwrite of an ingredient row. `None` is written as NULL.
#[derive(Debug, Clone, Default)]
pub struct UpdateIngredient {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub instructions: String,
    pub created_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_name: String,
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
}

impl RecipeDetail {
    /// Instruction lines with blank lines dropped.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.recipe
            .instructions
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringIngredient {
    pub name: String,
    pub days_until_expiry: i64,
    pub expiry_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSuggestion {
    #[serde(flatten)]
    pub recipe: RecipeDetail,
    pub match_percentage: f64,
    pub match_count: usize,
    pub total_ingredients: usize,
    pub expiring_ingredients_used: Vec<ExpiringIngredient>,
    pub priority_score: f64,
    pub avg_expiry_score: f64,
}

pub fn parse_expiry_date(s: &str) -> Result<NaiveDate> {
    match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
        Ok(date) => Ok(date),
        Err(_) => bail!("Invalid expiry_date '{s}'. Use YYYY-MM-DD"),
    }
}

/// Presence check for a new ingredient. A zero quantity counts as missing.
pub fn validate_new_ingredient(
    name: Option<&str>,
    quantity: Option<i64>,
    expiry_date: Option<&str>,
) -> Result<(String, i64, NaiveDate)> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let quantity = quantity.filter(|q| *q != 0);
    let expiry_date = expiry_date.map(str::trim).filter(|d| !d.is_empty());

    let (Some(name), Some(quantity), Some(expiry_date)) = (name, quantity, expiry_date) else {
        bail!("Name, quantity, and expiry_date are required");
    };
    let expiry_date = parse_expiry_date(expiry_date)?;
    Ok((name.to_string(), quantity, expiry_date))
}

/// Treat empty optional text as absent so defaults apply.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
