use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AvailabilityError {
    #[error("Date {date} is outside the booking window ({first} to {last})")]
    DateOutsideWindow {
        date: NaiveDate,
        first: NaiveDate,
        last: NaiveDate,
    },
}
