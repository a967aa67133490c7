use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use std::cmp::Ordering;
use std::fs::read_to_string;
use std::io;
use std::path::Path;
use thiserror::Error;

const DATE_COLUMN: &str = "date";

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error)]
pub enum EpochError {
    #[error("could not read dataset: {source}")]
    IoError {
        #[from]
        source: io::Error,
    },
    #[error("dataset has no 'date' column")]
    MissingDateColumn,
    #[error("invalid date '{value}' on line {line}")]
    InvalidDate { line: usize, value: String },
    #[error("dataset contains no dates")]
    Empty,
    #[error("dataset mixes dates with and without a utc offset (line {line})")]
    MixedTimezones { line: usize },
    #[error("epoch {naive} does not exist as local time in {timezone}")]
    NonexistentLocalTime { naive: NaiveDateTime, timezone: Tz },
}

/// Earliest date of the historical dataset, i.e. day zero for the regressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epoch {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl Epoch {
    /// Pins the epoch to an instant. Naive values are read as wall clock time
    /// in `timezone`, values that already carry an offset are left untouched.
    pub fn anchor(&self, timezone: Tz) -> Result<DateTime<FixedOffset>, EpochError> {
        match self {
            Epoch::Naive(naive) => timezone
                .from_local_datetime(naive)
                .earliest()
                .map(|anchored| anchored.fixed_offset())
                .ok_or(EpochError::NonexistentLocalTime {
                    naive: *naive,
                    timezone,
                }),
            Epoch::Zoned(zoned) => Ok(*zoned),
        }
    }

    fn compare(&self, other: &Epoch) -> Option<Ordering> {
        match (self, other) {
            (Epoch::Naive(a), Epoch::Naive(b)) => Some(a.cmp(b)),
            (Epoch::Zoned(a), Epoch::Zoned(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Epoch::Naive(naive) => write!(f, "{}", naive),
            Epoch::Zoned(zoned) => write!(f, "{}", zoned.to_rfc3339()),
        }
    }
}

pub fn read_epoch(file_path: impl AsRef<Path>) -> Result<Epoch, EpochError> {
    let contents = read_to_string(file_path)?;
    parse_epoch(&contents)
}

pub fn parse_epoch(contents: &str) -> Result<Epoch, EpochError> {
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or(EpochError::Empty)?;
    let header = header.strip_prefix('\u{feff}').unwrap_or(header);
    let date_index = split_record(header)
        .iter()
        .position(|name| name.eq_ignore_ascii_case(DATE_COLUMN))
        .ok_or(EpochError::MissingDateColumn)?;

    let mut earliest: Option<Epoch> = None;
    for (line, record) in lines {
        let fields = split_record(record);
        let value = fields.get(date_index).map(String::as_str).unwrap_or("");
        // Missing dates do not take part in the minimum.
        if value.is_empty() {
            continue;
        }
        let date = parse_date(value).ok_or_else(|| EpochError::InvalidDate {
            line,
            value: value.to_string(),
        })?;
        earliest = match earliest {
            None => Some(date),
            Some(current) => match date.compare(&current) {
                Some(Ordering::Less) => Some(date),
                Some(_) => Some(current),
                None => return Err(EpochError::MixedTimezones { line }),
            },
        };
    }
    earliest.ok_or(EpochError::Empty)
}

fn parse_date(value: &str) -> Option<Epoch> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(Epoch::Naive(date.and_time(NaiveTime::MIN)));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Epoch::Naive(naive));
        }
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z"))
        .ok()
        .map(Epoch::Zoned)
}

// Splits one csv record, honouring double quoted fields so that a comma in
// another column does not shift the date column.
fn split_record(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = record.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn naive(year: i32, month: u32, day: u32) -> Epoch {
        Epoch::Naive(
            NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_time(NaiveTime::MIN),
        )
    }

    #[test]
    fn test_earliest_date_is_epoch() {
        let csv = "date,temp_max,temp_min\n2021-03-01,31.0,22.1\n2020-01-15,25.2,14.0\n2022-07-30,35.5,27.3\n";
        assert_eq!(parse_epoch(csv).unwrap(), naive(2020, 1, 15));
    }

    #[test]
    fn test_date_column_can_be_anywhere() {
        let csv = "city,\"Date\",temp\n\"Pune, MH\",2020-02-02,30\nDelhi,2020-02-01,31\n";
        assert_eq!(parse_epoch(csv).unwrap(), naive(2020, 2, 1));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let csv = "\ndate\n\n2020-05-05\n   \n2020-05-04\n";
        assert_eq!(parse_epoch(csv).unwrap(), naive(2020, 5, 4));
    }

    #[test]
    fn test_datetime_values_keep_time_of_day() {
        let csv = "date\n2020-01-01 06:30:00\n2020-01-01T05:00\n";
        let expected = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        assert_eq!(parse_epoch(csv).unwrap(), Epoch::Naive(expected));
    }

    #[test]
    fn test_zoned_values_compare_by_instant() {
        let csv = "date\n2020-01-01T00:00:00+05:30\n2020-01-01T00:00:00+00:00\n";
        let epoch = parse_epoch(csv).unwrap();
        let Epoch::Zoned(zoned) = epoch else {
            panic!("expected zoned epoch, got {epoch:?}");
        };
        assert_eq!(zoned.to_rfc3339(), "2020-01-01T00:00:00+05:30");
    }

    #[test]
    fn test_byte_order_mark_before_header() {
        let csv = "\u{feff}date,temp\n2020-01-02,1\n2020-01-01,2\n";
        assert_eq!(parse_epoch(csv).unwrap(), naive(2020, 1, 1));
    }

    #[test]
    fn test_empty_date_cells_are_skipped() {
        let csv = "date,temp\n2020-01-02,1\n,2\n\"\",4\n2020-01-01,3\n";
        assert_eq!(parse_epoch(csv).unwrap(), naive(2020, 1, 1));
        let short = "temp,date\n1\n2,2020-03-04\n";
        assert_eq!(parse_epoch(short).unwrap(), naive(2020, 3, 4));
    }

    #[test]
    fn test_only_empty_dates_is_empty() {
        assert!(matches!(
            parse_epoch("date,temp\n,1\n,2\n"),
            Err(EpochError::Empty)
        ));
    }

    #[test]
    fn test_missing_date_column() {
        assert!(matches!(
            parse_epoch("day,temp\n1,2\n"),
            Err(EpochError::MissingDateColumn)
        ));
    }

    #[test]
    fn test_invalid_date_reports_line() {
        match parse_epoch("date\n2020-01-01\nyesterday\n") {
            Err(EpochError::InvalidDate { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(matches!(parse_epoch("date\n"), Err(EpochError::Empty)));
        assert!(matches!(parse_epoch(""), Err(EpochError::Empty)));
    }

    #[test]
    fn test_mixed_timezones_are_rejected() {
        assert!(matches!(
            parse_epoch("date\n2020-01-01\n2020-01-02T00:00:00Z\n"),
            Err(EpochError::MixedTimezones { line: 3 })
        ));
    }

    #[test]
    fn test_naive_epoch_is_reinterpreted_not_converted() {
        let anchored = naive(2020, 1, 1)
            .anchor(chrono_tz::Asia::Kolkata)
            .unwrap();
        assert_eq!(anchored.to_rfc3339(), "2020-01-01T00:00:00+05:30");
        assert_eq!(
            anchored.with_timezone(&Utc).to_rfc3339(),
            "2019-12-31T18:30:00+00:00"
        );
    }

    #[test]
    fn test_zoned_epoch_is_kept() {
        let zoned = DateTime::parse_from_rfc3339("2020-01-01T00:00:00+00:00").unwrap();
        let anchored = Epoch::Zoned(zoned)
            .anchor(chrono_tz::Asia::Kolkata)
            .unwrap();
        assert_eq!(anchored, zoned);
    }

    #[test]
    fn test_nonexistent_local_time_fails() {
        // Clocks in New York jumped from 02:00 to 03:00 on 2021-03-14.
        let gap = NaiveDate::from_ymd_opt(2021, 3, 14)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert!(matches!(
            Epoch::Naive(gap).anchor(chrono_tz::America::New_York),
            Err(EpochError::NonexistentLocalTime { .. })
        ));
    }
}
