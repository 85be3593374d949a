//! Calendar-day normalization for the heterogeneous date-time strings found
//! in field and station exports.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unparseable day-first date {input:?}")]
pub struct DateParseError {
    pub input: String,
}

/// Day-first formats seen across the source exports, tried in order.
const DAY_FIRST_FORMATS: &[&str] = &["%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Normalize a free-form date-time string to a calendar day.
///
/// Any time-of-day component (separated by whitespace) is discarded before
/// parsing. Day-first conventions are tried first, then ISO `%Y-%m-%d`.
pub fn parse_day_first(raw: &str) -> Result<NaiveDate, DateParseError> {
    let date_part = raw.split_whitespace().next().unwrap_or("");
    DAY_FIRST_FORMATS
        .iter()
        .chain(&["%Y-%m-%d"])
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| DateParseError {
            input: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_day_first_with_time() {
        let d = parse_day_first("05.03.2021 11:30").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2021, 3, 5).unwrap());
    }

    #[test]
    fn slashed_and_dashed_day_first() {
        assert_eq!(
            parse_day_first("31/12/1999").unwrap(),
            NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()
        );
        assert_eq!(
            parse_day_first("01-02-2010 06:00:00").unwrap(),
            NaiveDate::from_ymd_opt(2010, 2, 1).unwrap()
        );
    }

    #[test]
    fn iso_fallback() {
        assert_eq!(
            parse_day_first("2021-03-05T00:00").unwrap_err().input,
            "2021-03-05T00:00"
        );
        assert_eq!(
            parse_day_first("2021-03-05 00:00").unwrap(),
            NaiveDate::from_ymd_opt(2021, 3, 5).unwrap()
        );
    }

    #[test]
    fn time_of_day_is_discarded() {
        let morning = parse_day_first("14.01.2018 07:45").unwrap();
        let evening = parse_day_first("14.01.2018 22:10").unwrap();
        assert_eq!(morning, evening);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_day_first("not a date").is_err());
        assert!(parse_day_first("").is_err());
        assert!(parse_day_first("32.01.2020").is_err());
    }
}
