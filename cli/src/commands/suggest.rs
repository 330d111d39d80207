use anyhow::Result;
use chrono::Utc;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fridge_core::db::Database;
use fridge_core::expiry::expiry_label;
use fridge_core::suggestions::suggest_recipes;

use super::helpers::truncate;

pub(crate) fn cmd_suggest(db: &Database, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct SuggestionRow {
        #[tabled(rename = "#")]
        rank: usize,
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Recipe")]
        name: String,
        #[tabled(rename = "Have")]
        matched: String,
        #[tabled(rename = "Priority")]
        priority: String,
        #[tabled(rename = "Use soon")]
        expiring: String,
    }

    let ingredients = db.list_ingredients()?;
    let recipes = db.list_recipes()?;
    let suggestions = suggest_recipes(&ingredients, recipes, Utc::now());

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("No recipe has at least half of its ingredients in the fridge.");
        return Ok(());
    }

    let rows: Vec<SuggestionRow> = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| SuggestionRow {
            rank: i + 1,
            id: s.recipe.recipe.id,
            name: truncate(&s.recipe.recipe.name, 30),
            matched: format!(
                "{}/{} ({:.0}%)",
                s.match_count, s.total_ingredients, s.match_percentage
            ),
            priority: format!("{:.1}", s.priority_score),
            expiring: s
                .expiring_ingredients_used
                .iter()
                .map(|e| format!("{} ({})", e.name, expiry_label(e.days_until_expiry)))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
