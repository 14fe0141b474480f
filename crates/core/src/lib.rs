pub mod category;
pub mod entry;
pub mod hours;
pub mod period;

pub use category::{Category, UnknownCategory, ALL_CATEGORIES};
pub use entry::{RawEntry, ReportRow};
pub use hours::Hours;
pub use period::{DateRange, PeriodError};
