pub mod errors;
pub mod features;
pub mod hours;
pub mod model;
pub mod time;

pub use errors::ParseError;
pub use features::{parse_features, try_parse_features, FeatureMap};
pub use hours::{parse_day, parse_week, DaySchedule, WeekSchedule, Weekday};
pub use model::RawRow;
pub use time::{to_24_hour, Period, TimeOfDay};

#[cfg(test)]
mod tests;
