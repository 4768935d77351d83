use serde::{Deserialize, Serialize};

use super::Totals;

/// Daily health thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthLimits {
    /// grams
    pub sugar: f64,
    /// milligrams
    pub caffeine: f64,
    /// kcal
    pub calories: f64,
}

impl Default for HealthLimits {
    fn default() -> Self {
        Self {
            sugar: 50.0,
            caffeine: 400.0,
            calories: 2000.0,
        }
    }
}

/// How a set of totals compares to a set of limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitAssessment {
    pub sugar_percent: f64,
    pub caffeine_percent: f64,
    pub calories_percent: f64,
    pub sugar_exceeded: bool,
    pub caffeine_exceeded: bool,
    pub calories_exceeded: bool,
}

impl HealthLimits {
    /// Limits for a period spanning `days` calendar days.
    pub fn scaled(&self, days: u32) -> Self {
        let d = f64::from(days);
        Self {
            sugar: self.sugar * d,
            caffeine: self.caffeine * d,
            calories: self.calories * d,
        }
    }

    /// Reaching a limit counts as exceeding it.
    pub fn assess(&self, totals: &Totals) -> LimitAssessment {
        LimitAssessment {
            sugar_percent: percent(totals.sugar, self.sugar),
            caffeine_percent: percent(totals.caffeine, self.caffeine),
            calories_percent: percent(totals.calories, self.calories),
            sugar_exceeded: totals.sugar >= self.sugar,
            caffeine_exceeded: totals.caffeine >= self.caffeine,
            calories_exceeded: totals.calories >= self.calories,
        }
    }
}

fn percent(value: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return 0.0;
    }
    value / limit * 100.0
}
