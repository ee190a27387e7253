use chrono::{DateTime, Datelike, NaiveDate, Utc};

/// The calendar-month bucket a date falls into, represented as the first day of that month.
pub fn month_of(date: NaiveDate) -> NaiveDate {
    // day 1 always exists
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn month_of_datetime(ts: DateTime<Utc>) -> NaiveDate {
    month_of(ts.date_naive())
}

/// The first day of the month following `month`.
pub fn next_month(month: NaiveDate) -> NaiveDate {
    let (y, m) = if month.month() == 12 { (month.year() + 1, 1) } else { (month.year(), month.month() + 1) };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap_or(month)
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::{month_of, next_month};

    #[test]
    fn buckets() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(month_of(d), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(next_month(month_of(d)), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let dec = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(next_month(month_of(dec)), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
