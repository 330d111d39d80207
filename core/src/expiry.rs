//! Days-until-expiry arithmetic and the urgency tiers derived from it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Signed whole days from `now` until `expiry_date`, rounded up.
///
/// The expiry instant is midnight UTC of the stored date and `now` keeps its
/// time of day, so the same date can read one day apart depending on the hour.
#[must_use]
pub fn days_until_expiry(expiry_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let expiry = expiry_date.and_time(NaiveTime::MIN).and_utc();
    let diff_ms = (expiry - now).num_milliseconds();
    // ceil(diff / day) for a positive divisor
    -(-diff_ms).div_euclid(MS_PER_DAY)
}

/// Urgency tiers, most pressing first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Expired or expiring today.
    Urgent,
    VerySoon,
    Soon,
    ThisWeek,
    NotUrgent,
}

impl Urgency {
    #[must_use]
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 0 => Self::Urgent,
            d if d <= 2 => Self::VerySoon,
            d if d <= 5 => Self::Soon,
            d if d <= 7 => Self::ThisWeek,
            _ => Self::NotUrgent,
        }
    }

    /// Weight used by the suggestion ranker.
    #[must_use]
    pub fn score(self) -> f64 {
        match self {
            Self::Urgent => 100.0,
            Self::VerySoon => 90.0,
            Self::Soon => 70.0,
            Self::ThisWeek => 50.0,
            Self::NotUrgent => 20.0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::VerySoon => "very soon",
            Self::Soon => "soon",
            Self::ThisWeek => "this week",
            Self::NotUrgent => "",
        }
    }
}

#[must_use]
pub fn expiry_score(days: i64) -> f64 {
    Urgency::from_days(days).score()
}

/// Ingredients inside this many days count as "expiring" in suggestions.
pub const EXPIRING_WITHIN_DAYS: i64 = 7;

#[must_use]
pub fn is_expiring(days: i64) -> bool {
    days <= EXPIRING_WITHIN_DAYS
}

/// Inventory label: "expired", "today", "1 day", "N days".
#[must_use]
pub fn expiry_label(days: i64) -> String {
    match days {
        d if d < 0 => "expired".to_string(),
        0 => "today".to_string(),
        1 => "1 day".to_string(),
        d => format!("{d} days"),
    }
}
