//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use scorekeep_core::RatingValue;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a score as five stars, filled up to the score rounded to the
/// nearest whole star.
///
/// Anything that is not a number renders as five empty stars.
///
/// Usage in templates: `{{ store.average|stars }}`
#[askama::filter_fn]
pub fn stars(score: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(star_string(&score.to_string()))
}

fn star_string(score: &str) -> String {
    let filled = score
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .map_or(0.0, f64::round);

    (RatingValue::MIN..=RatingValue::MAX)
        .map(|i| if f64::from(i) <= filled { '★' } else { '☆' })
        .collect()
}
