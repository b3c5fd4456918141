//! Built-in template families.

mod ecommerce;
mod generic;
mod logs;
mod news;
mod timeseries;

pub use ecommerce::EcommerceFamily;
pub use generic::GenericFamily;
pub use logs::LogsFamily;
pub use news::NewsFamily;
pub use timeseries::TimeSeriesFamily;

use crate::fake::FakeData;
use rand::Rng;
use serde_json::Value;

/// The generated value with the given probability, otherwise JSON null
pub(crate) fn maybe<R: Rng>(
    fake: &mut FakeData<R>,
    probability: f64,
    value: impl FnOnce(&mut FakeData<R>) -> Value,
) -> Value {
    if fake.bool_with_probability(probability) {
        value(fake)
    } else {
        Value::Null
    }
}
