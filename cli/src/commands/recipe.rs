use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fridge_core::db::Database;
use fridge_core::models::{Ingredient, Recipe, RecipeDetail};

use super::helpers::{json_error, truncate};

#[derive(Serialize)]
struct IngredientStatus<'a> {
    ingredient_name: &'a str,
    quantity: Option<&'a str>,
    have: bool,
}

#[derive(Serialize)]
struct RecipeView<'a> {
    #[serde(flatten)]
    recipe: &'a Recipe,
    ingredients: Vec<IngredientStatus<'a>>,
    steps: Vec<&'a str>,
}

/// Mark each recipe ingredient as on hand or missing, by case-insensitive name.
fn pantry_status<'a>(
    detail: &'a RecipeDetail,
    inventory: &[Ingredient],
) -> Vec<IngredientStatus<'a>> {
    let on_hand: HashSet<String> = inventory.iter().map(|i| i.name.to_lowercase()).collect();
    detail
        .ingredients
        .iter()
        .map(|ing| IngredientStatus {
            ingredient_name: &ing.ingredient_name,
            quantity: ing.quantity.as_deref(),
            have: on_hand.contains(&ing.ingredient_name.to_lowercase()),
        })
        .collect()
}

/// Look a recipe up by numeric id, falling back to a case-insensitive name match.
fn find_recipe(db: &Database, query: &str) -> Result<Option<RecipeDetail>> {
    if let Ok(id) = query.trim().parse::<i64>() {
        return db.get_recipe(id);
    }
    let wanted = query.trim().to_lowercase();
    Ok(db
        .list_recipes()?
        .into_iter()
        .find(|r| r.recipe.name.to_lowercase() == wanted))
}

pub(crate) fn cmd_recipe_show(db: &Database, query: &str, json: bool) -> Result<()> {
    let Some(detail) = find_recipe(db, query)? else {
        if json {
            println!("{}", json_error("Recipe not found"));
        } else {
            eprintln!("Recipe not found: {query}");
        }
        process::exit(2);
    };
    let inventory = db.list_ingredients().context("Failed to load inventory")?;
    let view = RecipeView {
        recipe: &detail.recipe,
        ingredients: pantry_status(&detail, &inventory),
        steps: detail.steps().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let name = &detail.recipe.name;
    println!("=== {name} ===");
    if let Some(description) = detail.recipe.description.as_deref() {
        println!("  {description}");
    }

    println!("\n  INGREDIENTS:");
    for ing in &view.ingredients {
        let mark = if ing.have { "✓ have" } else { "✗ need" };
        let qty = ing.quantity.unwrap_or("");
        println!("    [{mark}] {} — {qty}", ing.ingredient_name);
    }

    println!("\n  INSTRUCTIONS:");
    for (i, step) in view.steps.iter().enumerate() {
        println!("    {}. {step}", i + 1);
    }

    Ok(())
}

pub(crate) fn cmd_recipe_list(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Description")]
        description: String,
    }

    let recipes = db.list_recipes()?;
    if recipes.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No recipes found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recipes)?);
        return Ok(());
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.recipe.id,
            name: truncate(&r.recipe.name, 30),
            ingredients: r.ingredients.len(),
            description: r
                .recipe
                .description
                .as_deref()
                .map(|d| truncate(d, 50))
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
