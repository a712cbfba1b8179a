//! Rating values and aggregates.

use serde::{Deserialize, Serialize};

/// Error returned when a score falls outside 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between 1 and 5, got {value}")]
pub struct RatingValueError {
    /// The rejected score.
    pub value: i64,
}

/// A single 1-5 star score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Lowest score a user may give.
    pub const MIN: u8 = 1;
    /// Highest score a user may give.
    pub const MAX: u8 = 5;

    /// Build a rating value, rejecting anything outside 1..=5.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValueError`] when `value` is below 1 or above 5.
    pub fn new(value: i64) -> Result<Self, RatingValueError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingValueError { value })
    }

    /// The score as a small integer.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Every valid score, lowest first.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for i16 {
    fn from(value: RatingValue) -> Self {
        Self::from(value.0)
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Arithmetic mean of a set of scores; `0.0` when there are none.
#[must_use]
pub fn average_rating<I>(scores: I) -> f64
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0.0_f64, 0_u32), |(sum, count), score| {
            (sum + score.into(), count + 1)
        });

    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(RatingValue::new(0).is_err());
        assert!(RatingValue::new(6).is_err());
        assert!(RatingValue::new(-1).is_err());
        assert_eq!(RatingValue::new(1).unwrap().get(), 1);
        assert_eq!(RatingValue::new(5).unwrap().get(), 5);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<RatingValue>("3").is_ok());
        assert!(serde_json::from_str::<RatingValue>("9").is_err());
    }

    #[test]
    fn test_all_lists_five_scores() {
        let scores: Vec<u8> = RatingValue::all().map(RatingValue::get).collect();
        assert_eq!(scores, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert!(average_rating(Vec::<i16>::new()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_is_arithmetic_mean() {
        let avg = average_rating([4_i16, 5, 3]);
        assert!((avg - 4.0).abs() < f64::EPSILON);

        let avg = average_rating([1_i16, 2]);
        assert!((avg - 1.5).abs() < f64::EPSILON);
    }
}
