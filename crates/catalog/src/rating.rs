//! Running laptop ratings.

use std::collections::HashMap;

/// Accumulated scores for one laptop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rating {
    /// Number of scores received
    pub count: u32,
    /// Sum of all scores
    pub sum: f64,
}

impl Rating {
    /// Mean score, or 0 before any score arrived.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }
}

/// Per-laptop running totals for one rating exchange.
///
/// An aggregator belongs to a single call and is dropped with it, so it needs
/// no locking.
#[derive(Debug, Default)]
pub struct RatingAggregator {
    ratings: HashMap<String, Rating>,
}

impl RatingAggregator {
    /// An aggregator with no scores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `score` for `laptop_id` and return the updated totals.
    pub fn add(&mut self, laptop_id: &str, score: f64) -> Rating {
        let rating = self.ratings.entry(laptop_id.to_string()).or_default();
        rating.count += 1;
        rating.sum += score;
        *rating
    }
}
