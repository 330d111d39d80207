use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use fridge_core::expiry::{Urgency, days_until_expiry, expiry_label};
use fridge_core::models::{DATE_FORMAT, Ingredient, parse_expiry_date};

/// Today's date on the UTC calendar, the one expiry dates are measured against.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse an expiry argument: `YYYY-MM-DD`, `today`, `tomorrow`, or `+N` days.
pub(crate) fn parse_expiry_arg(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        _ => {
            if let Some(days) = s.strip_prefix('+') {
                let days: i64 = days
                    .parse()
                    .with_context(|| format!("Invalid day offset '{s}'. Use +N, e.g. +5"))?;
                return Duration::try_days(days)
                    .and_then(|offset| today.checked_add_signed(offset))
                    .with_context(|| format!("Day offset '{s}' is out of range"));
            }
            parse_expiry_date(s)
        }
    }
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Label plus urgency tier, e.g. "2 days (very soon)".
pub(crate) fn expiry_status(expiry_date: &str) -> String {
    let Ok(date) = parse_expiry_date(expiry_date) else {
        return "?".to_string();
    };
    let days = days_until_expiry(date, Utc::now());
    let label = expiry_label(days);
    match Urgency::from_days(days) {
        Urgency::NotUrgent => label,
        urgency => format!("{label} ({})", urgency.as_str()),
    }
}

pub(crate) fn print_ingredient_table(ingredients: &[Ingredient]) {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Qty")]
        quantity: i64,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Expires")]
        expiry_date: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<IngredientRow> = ingredients
        .iter()
        .map(|i| IngredientRow {
            id: i.id,
            name: truncate(&i.name, 30),
            category: i.category.clone().unwrap_or_default(),
            quantity: i.quantity,
            unit: i.unit.clone().unwrap_or_default(),
            expiry_date: i.expiry_date.clone(),
            status: expiry_status(&i.expiry_date),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
