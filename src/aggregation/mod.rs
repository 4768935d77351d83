//! Pure rollups over consumption records.
//!
//! Nothing in here performs I/O: callers fetch records, pick a reference
//! "now" and an offset, and get plain serializable data back.

pub mod limits;
pub mod streak;
pub mod window;

use serde::Serialize;
use time::OffsetDateTime;

use window::Window;

/// Anything that carries nutrient amounts and a timestamp.
pub trait Intake {
    fn taken_at(&self) -> OffsetDateTime;
    fn sugar(&self) -> f64;
    fn caffeine(&self) -> f64;
    fn calories(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub sugar: f64,
    pub caffeine: f64,
    pub calories: f64,
    pub count: usize,
}

impl Totals {
    fn add<T: Intake + ?Sized>(&mut self, record: &T) {
        self.sugar += amount(record.sugar());
        self.caffeine += amount(record.caffeine());
        self.calories += amount(record.calories());
        self.count += 1;
    }
}

/// Missing or corrupt amounts count as zero.
fn amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn totals<'a, T, I>(records: I) -> Totals
where
    T: Intake + 'a,
    I: IntoIterator<Item = &'a T>,
{
    records.into_iter().fold(Totals::default(), |mut acc, r| {
        acc.add(r);
        acc
    })
}

pub fn totals_for_window<'a, T, I>(records: I, window: &Window) -> Totals
where
    T: Intake + 'a,
    I: IntoIterator<Item = &'a T>,
{
    totals(records.into_iter().filter(|r| window.contains(r.taken_at())))
}

/// Lifetime statistics for one user's log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_consumptions: usize,
    pub total_caffeine: f64,
    pub total_sugar: f64,
    pub total_calories: f64,
    pub average_caffeine: f64,
    pub average_sugar: f64,
    pub average_calories: f64,
}

impl From<Totals> for UserStats {
    fn from(t: Totals) -> Self {
        if t.count == 0 {
            return Self::default();
        }
        let n = t.count as f64;
        Self {
            total_consumptions: t.count,
            total_caffeine: t.caffeine,
            total_sugar: t.sugar,
            total_calories: t.calories,
            average_caffeine: (t.caffeine / n).round(),
            average_sugar: (t.sugar / n).round(),
            average_calories: (t.calories / n).round(),
        }
    }
}
