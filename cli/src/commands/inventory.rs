use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::process;

use fridge_core::db::Database;
use fridge_core::models::{
    NewIngredient, UpdateIngredient, non_empty, parse_expiry_date, validate_new_ingredient,
};

use super::helpers::{
    expiry_status, format_date, json_error, parse_expiry_arg, print_ingredient_table, today,
};

const RANDOM_NAMES: &[&str] = &[
    "tomato",
    "carrot",
    "onion",
    "garlic",
    "potato",
    "broccoli",
    "lettuce",
    "cucumber",
    "bell pepper",
    "mushroom",
    "spinach",
    "apple",
    "banana",
    "orange",
    "grapes",
    "strawberry",
    "chicken breast",
    "ground beef",
    "salmon",
    "eggs",
    "milk",
    "cheese",
    "butter",
    "yogurt",
    "bread",
    "rice",
    "pasta",
];
const RANDOM_CATEGORIES: &[&str] = &["vegetable", "fruit", "protein", "dairy", "grain"];
const RANDOM_UNITS: &[&str] = &["units", "kg", "g", "lbs", "pieces"];

pub(crate) fn cmd_inventory_list(db: &Database, json: bool) -> Result<()> {
    let ingredients = db.list_ingredients()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ingredients)?);
        return Ok(());
    }
    if ingredients.is_empty() {
        println!("Your fridge is empty. Add something with: fridge inventory add <name> <quantity> <expiry>");
        return Ok(());
    }
    print_ingredient_table(&ingredients);
    Ok(())
}

pub(crate) fn cmd_inventory_add(
    db: &Database,
    name: &str,
    quantity: i64,
    expiry: &str,
    category: Option<String>,
    unit: Option<String>,
    json: bool,
) -> Result<()> {
    let expiry_date = format_date(parse_expiry_arg(expiry, today())?);
    let (name, quantity, expiry_date) =
        validate_new_ingredient(Some(name), Some(quantity), Some(&expiry_date))?;

    let ingredient = db.insert_ingredient(&NewIngredient {
        name,
        category: non_empty(category),
        quantity,
        unit: non_empty(unit),
        expiry_date,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ingredient)?);
    } else {
        let status = expiry_status(&ingredient.expiry_date);
        println!(
            "Added {} {} {} (id: {}, expires {}, {status})",
            ingredient.quantity,
            ingredient.unit.as_deref().unwrap_or_default(),
            ingredient.name,
            ingredient.id,
            ingredient.expiry_date,
        );
    }
    Ok(())
}

/// Fields left out keep their stored value; the row is then written in full.
#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_inventory_update(
    db: &Database,
    id: i64,
    name: Option<String>,
    category: Option<String>,
    quantity: Option<i64>,
    unit: Option<String>,
    expiry: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(current) = db.get_ingredient(id)? else {
        not_found(id, json);
    };

    let expiry_date = match expiry {
        Some(e) => parse_expiry_arg(e, today())?,
        None => parse_expiry_date(&current.expiry_date)
            .with_context(|| format!("Stored expiry date of ingredient {id} is unreadable"))?,
    };
    let update = UpdateIngredient {
        name: Some(name.unwrap_or(current.name)),
        category: category.or(current.category),
        quantity: Some(quantity.unwrap_or(current.quantity)),
        unit: unit.or(current.unit),
        expiry_date: Some(expiry_date),
    };

    if !db.update_ingredient(id, &update)? {
        not_found(id, json);
    }

    let updated = db
        .get_ingredient(id)?
        .context("Ingredient vanished after update")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated ingredient {id}");
        print_ingredient_table(std::slice::from_ref(&updated));
    }
    Ok(())
}

pub(crate) fn cmd_inventory_delete(db: &Database, id: i64, json: bool) -> Result<()> {
    if db.delete_ingredient(id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            println!("Deleted ingredient {id}");
        }
        Ok(())
    } else {
        not_found(id, json)
    }
}

pub(crate) fn cmd_inventory_add_random(db: &Database, json: bool) -> Result<()> {
    let new = random_ingredient(&mut rand::rng(), today());
    let ingredient = db.insert_ingredient(&new)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ingredient)?);
    } else {
        println!(
            "Added random ingredient: {} {} {} (id: {}, expires {})",
            ingredient.quantity,
            ingredient.unit.as_deref().unwrap_or_default(),
            ingredient.name,
            ingredient.id,
            ingredient.expiry_date,
        );
    }
    Ok(())
}

pub(crate) fn cmd_inventory_remove_random(db: &Database, json: bool) -> Result<()> {
    let ingredients = db.list_ingredients()?;
    let Some(victim) = ingredients.choose(&mut rand::rng()) else {
        if json {
            println!("{}", json_error("No ingredients to delete"));
        } else {
            eprintln!("No ingredients to delete!");
        }
        process::exit(2);
    };

    db.delete_ingredient(victim.id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(victim)?);
    } else {
        println!("Removed {} (id: {})", victim.name, victim.id);
    }
    Ok(())
}

/// A plausible grocery item expiring 1 to 14 days after `today`.
fn random_ingredient<R: Rng>(rng: &mut R, today: NaiveDate) -> NewIngredient {
    let name = pick(rng, RANDOM_NAMES);
    let category = pick(rng, RANDOM_CATEGORIES);
    let unit = pick(rng, RANDOM_UNITS);
    NewIngredient {
        name,
        category: Some(category),
        quantity: rng.random_range(1..=10),
        unit: Some(unit),
        expiry_date: today + Duration::days(rng.random_range(1..=14)),
    }
}

fn pick<R: Rng>(rng: &mut R, options: &[&str]) -> String {
    options
        .choose(rng)
        .map_or_else(String::new, |s| (*s).to_string())
}

fn not_found(id: i64, json: bool) -> ! {
    if json {
        println!("{}", json_error(&format!("Ingredient {id} not found")));
    } else {
        eprintln!("Ingredient {id} not found");
    }
    process::exit(2);
}
