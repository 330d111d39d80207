//! Recipe suggestions ranked by how much of each recipe is on hand and how
//! soon the matching ingredients expire.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::expiry::{days_until_expiry, expiry_score, is_expiring};
use crate::models::{
    ExpiringIngredient, Ingredient, RecipeDetail, RecipeSuggestion, parse_expiry_date,
};

/// Recipes below this share of available ingredients are not suggested.
pub const MIN_MATCH_PERCENTAGE: f64 = 50.0;
const MATCH_WEIGHT: f64 = 0.6;
const EXPIRY_WEIGHT: f64 = 0.4;
/// Priority scores closer than this are ranked by expiring-ingredient count.
const NEAR_TIE: f64 = 5.0;

#[derive(Debug, Clone)]
struct StockEntry {
    name: String,
    expiry_date: String,
    days_until_expiry: i64,
}

/// Lower-cased name to the soonest-expiring stock entry with that name.
fn build_stock(ingredients: &[Ingredient], now: DateTime<Utc>) -> HashMap<String, StockEntry> {
    let mut stock: HashMap<String, StockEntry> = HashMap::new();
    for ingredient in ingredients {
        let Ok(expiry) = parse_expiry_date(&ingredient.expiry_date) else {
            warn!(
                id = ingredient.id,
                expiry_date = %ingredient.expiry_date,
                "skipping ingredient with unreadable expiry date"
            );
            continue;
        };
        let days = days_until_expiry(expiry, now);
        let key = ingredient.name.to_lowercase();
        let replace = stock
            .get(&key)
            .is_none_or(|existing| days < existing.days_until_expiry);
        if replace {
            stock.insert(
                key,
                StockEntry {
                    name: ingredient.name.clone(),
                    expiry_date: ingredient.expiry_date.clone(),
                    days_until_expiry: days,
                },
            );
        }
    }
    stock
}

#[allow(clippy::cast_precision_loss)]
fn score_recipe(recipe: RecipeDetail, stock: &HashMap<String, StockEntry>) -> RecipeSuggestion {
    let total_ingredients = recipe.ingredients.len();
    let mut match_count = 0usize;
    let mut total_expiry_score = 0.0;
    let mut expiring_ingredients_used = Vec::new();

    for ingredient in &recipe.ingredients {
        let Some(entry) = stock.get(&ingredient.ingredient_name.to_lowercase()) else {
            continue;
        };
        match_count += 1;
        total_expiry_score += expiry_score(entry.days_until_expiry);
        if is_expiring(entry.days_until_expiry) {
            expiring_ingredients_used.push(ExpiringIngredient {
                name: entry.name.clone(),
                days_until_expiry: entry.days_until_expiry,
                expiry_date: entry.expiry_date.clone(),
            });
        }
    }

    let match_percentage = if total_ingredients == 0 {
        0.0
    } else {
        match_count as f64 / total_ingredients as f64 * 100.0
    };
    let avg_expiry_score = if match_count > 0 {
        total_expiry_score / match_count as f64
    } else {
        0.0
    };
    let priority_score = match_percentage * MATCH_WEIGHT + avg_expiry_score * EXPIRY_WEIGHT;

    RecipeSuggestion {
        recipe,
        match_percentage,
        match_count,
        total_ingredients,
        expiring_ingredients_used,
        priority_score,
        avg_expiry_score,
    }
}

/// Pairwise ranking: higher priority first unless the two scores are within
/// `NEAR_TIE`, in which case more expiring ingredients wins. Not transitive.
#[must_use]
pub fn compare_suggestions(a: &RecipeSuggestion, b: &RecipeSuggestion) -> Ordering {
    let diff = b.priority_score - a.priority_score;
    if diff.abs() > NEAR_TIE {
        if diff < 0.0 {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    } else {
        b.expiring_ingredients_used
            .len()
            .cmp(&a.expiring_ingredients_used.len())
    }
}

/// Stable sort that only ever asks `compare` about pairs.
///
/// Detects the leading run (reversing it when strictly descending), then
/// binary-inserts the remaining elements. This is the short-array path of the
/// timsort used by V8, so orderings produced by a non-transitive comparator
/// match what the web client historically displayed.
pub fn stable_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }

    let descending = compare(&items[1], &items[0]) == Ordering::Less;
    let mut run = 2;
    while run < len {
        let order = compare(&items[run], &items[run - 1]);
        let continues = if descending {
            order == Ordering::Less
        } else {
            order != Ordering::Less
        };
        if !continues {
            break;
        }
        run += 1;
    }
    if descending {
        items[..run].reverse();
    }

    for start in run..len {
        let mut left = 0;
        let mut right = start;
        while left < right {
            let mid = left + (right - left) / 2;
            if compare(&items[start], &items[mid]) == Ordering::Less {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        items[left..=start].rotate_right(1);
    }
}

/// Score every recipe against the inventory, drop those under
/// `MIN_MATCH_PERCENTAGE` and rank the rest.
#[must_use]
pub fn suggest_recipes(
    ingredients: &[Ingredient],
    recipes: Vec<RecipeDetail>,
    now: DateTime<Utc>,
) -> Vec<RecipeSuggestion> {
    let stock = build_stock(ingredients, now);
    let mut suggestions: Vec<RecipeSuggestion> = recipes
        .into_iter()
        .map(|recipe| score_recipe(recipe, &stock))
        .filter(|s| s.match_percentage >= MIN_MATCH_PERCENTAGE)
        .collect();
    stable_sort_by(&mut suggestions, compare_suggestions);
    suggestions
}
