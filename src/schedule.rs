//! Loader for the week-grid schedule CSV (`Person,W1,...,W40`).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Number of week columns in the schedule grid.
pub const WEEKS: usize = 40;

/// Person column plus one column per week.
const FIELDS: usize = WEEKS + 1;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("cannot open schedule CSV {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schedule CSV is empty; expected a Person,W1..W40 header")]
    Empty,
    #[error("malformed schedule CSV")]
    Csv(#[from] csv::Error),
    #[error("row {row} has non-empty fields beyond the expected person + 40 weeks: {extra:?}")]
    Overflow { row: usize, extra: Vec<String> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub person: String,
    weeks: Vec<String>,
}

impl ScheduleEntry {
    fn unassigned(person: String) -> Self {
        Self {
            person,
            weeks: vec![String::new(); WEEKS],
        }
    }

    /// Token for a 1-based week; `None` when unassigned or out of range.
    pub fn token(&self, week: usize) -> Option<&str> {
        let token = self.weeks.get(week.checked_sub(1)?)?;
        if token.is_empty() { None } else { Some(token) }
    }

    /// All 40 slots in week order, empty string meaning unassigned.
    pub fn weeks(&self) -> impl Iterator<Item = &str> {
        self.weeks.iter().map(String::as_str)
    }

    pub fn assigned_weeks(&self) -> usize {
        self.weeks.iter().filter(|t| !t.is_empty()).count()
    }
}

/// People in file order, one entry per distinct name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn get(&self, person: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.person == person)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, entry: ScheduleEntry) {
        match self.entries.iter_mut().find(|e| e.person == entry.person) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

fn normalize_token(raw: &str) -> String {
    let token = raw.trim();
    if token.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        token.to_string()
    }
}

/// Maps each header position to a 0-based week slot. `W<n>` headers name their
/// week explicitly; anything else keeps its position.
fn week_slots(header: &StringRecord) -> Vec<usize> {
    let re = Regex::new(r"^[Ww](\d+)$").expect("valid regex");
    (1..FIELDS)
        .map(|pos| {
            let named = header
                .get(pos)
                .and_then(|h| re.captures(h.trim()))
                .and_then(|caps| caps[1].parse::<usize>().ok())
                .filter(|w| (1..=WEEKS).contains(w));
            named.unwrap_or(pos) - 1
        })
        .collect()
}

/// Pads or trims a record to exactly [`FIELDS`] values. `row` is the 1-based data row.
fn normalize_record(record: &StringRecord, row: usize) -> Result<Vec<String>, ScheduleError> {
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();

    if fields.len() > FIELDS {
        let extra: Vec<String> = fields
            .split_off(FIELDS)
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .collect();
        if !extra.is_empty() {
            return Err(ScheduleError::Overflow { row, extra });
        }
        warn!("Row {row} had blank trailing fields beyond {FIELDS}; trimmed");
    }

    fields.resize(FIELDS, String::new());
    Ok(fields)
}

pub fn parse_schedule<R: Read>(reader: R) -> Result<Schedule, ScheduleError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let header = reader.headers()?;
    if header.is_empty() {
        return Err(ScheduleError::Empty);
    }
    let slots = week_slots(header);
    let mut schedule = Schedule::default();

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let fields = normalize_record(&record, idx + 1)?;

        let person = fields[0].trim();
        if person.is_empty() {
            continue;
        }

        let mut entry = ScheduleEntry::unassigned(person.to_string());
        for (value, &slot) in fields[1..].iter().zip(&slots) {
            entry.weeks[slot] = normalize_token(value);
        }
        debug!(person = %entry.person, assigned = entry.assigned_weeks(), "loaded schedule row");
        schedule.insert(entry);
    }

    Ok(schedule)
}

pub fn load_schedule(path: &Path) -> Result<Schedule, ScheduleError> {
    let file = File::open(path).map_err(|source| ScheduleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schedule(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> String {
        let weeks: Vec<String> = (1..=WEEKS).map(|w| format!("W{w}")).collect();
        format!("Person,{}\n", weeks.join(","))
    }

    fn parse(body: &str) -> Result<Schedule, ScheduleError> {
        parse_schedule(format!("{}{}", header(), body).as_bytes())
    }

    #[test]
    fn short_rows_are_padded() {
        let schedule = parse("Axel,CD\nBernd\n").unwrap();
        assert_eq!(schedule.len(), 2);

        let axel = schedule.get("Axel").unwrap();
        assert_eq!(axel.token(1), Some("CD"));
        assert_eq!(axel.token(2), None);
        assert_eq!(axel.weeks().count(), WEEKS);
        assert_eq!(schedule.get("Bernd").unwrap().assigned_weeks(), 0);
    }

    #[test]
    fn blank_overflow_is_trimmed() {
        let row = format!("Axel{} , ,\n", ",R+MN".repeat(WEEKS));
        let schedule = parse(&row).unwrap();
        let axel = schedule.get("Axel").unwrap();
        assert_eq!(axel.assigned_weeks(), WEEKS);
        assert_eq!(axel.token(40), Some("R+MN"));

        // Overflow is checked before a row without a person is dropped.
        let nameless = format!("{},,oops\n", ",".repeat(WEEKS));
        assert!(matches!(parse(&nameless), Err(ScheduleError::Overflow { row: 1, .. })));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_schedule("".as_bytes()), Err(ScheduleError::Empty)));
    }

    #[test]
    fn non_blank_overflow_names_the_row() {
        let good = "Axel,CD\n";
        let bad = format!("Bernd{},,oops\n", ",".repeat(WEEKS));
        let err = parse(&format!("{good}{bad}")).unwrap_err();
        match err {
            ScheduleError::Overflow { row, extra } => {
                assert_eq!(row, 2);
                assert_eq!(extra, vec!["oops".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nan_and_whitespace_tokens_are_unassigned() {
        let schedule = parse("Axel,nan,  ,NaN, SD \n").unwrap();
        let axel = schedule.get("Axel").unwrap();
        assert_eq!(axel.token(1), None);
        assert_eq!(axel.token(2), None);
        assert_eq!(axel.token(3), None);
        assert_eq!(axel.token(4), Some("SD"));
    }

    #[test]
    fn rows_without_person_are_skipped() {
        let schedule = parse(",CD\n  ,SD\nAxel,MD\n").unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.entries()[0].person, "Axel");
    }

    #[test]
    fn repeated_person_keeps_first_position_and_last_weeks() {
        let schedule = parse("Axel,CD\nBernd,SP\nAxel,,MD\n").unwrap();
        let names: Vec<&str> = schedule.entries().iter().map(|e| e.person.as_str()).collect();
        assert_eq!(names, ["Axel", "Bernd"]);
        let axel = schedule.get("Axel").unwrap();
        assert_eq!(axel.token(1), None);
        assert_eq!(axel.token(2), Some("MD"));
    }

    #[test]
    fn week_headers_place_tokens_by_number() {
        let csv = "Person,W2,W1\nAxel,second,first\n";
        let schedule = parse_schedule(csv.as_bytes()).unwrap();
        let axel = schedule.get("Axel").unwrap();
        assert_eq!(axel.token(1), Some("first"));
        assert_eq!(axel.token(2), Some("second"));
    }

    #[test]
    fn token_out_of_range_is_none() {
        let schedule = parse("Axel,CD\n").unwrap();
        let axel = schedule.get("Axel").unwrap();
        assert_eq!(axel.token(0), None);
        assert_eq!(axel.token(41), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_schedule(Path::new("no/such/schedule.csv")).unwrap_err();
        assert!(matches!(err, ScheduleError::Io { .. }));
        assert!(err.to_string().contains("no/such/schedule.csv"));
    }
}
