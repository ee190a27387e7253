mod money;
mod month;

pub use money::{Money, MoneyConversionError};
pub use month::{month_of, month_of_datetime, next_month};
