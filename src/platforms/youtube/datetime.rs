//! Date and time handling for the Studio schedule picker and video list.
//!
//! The picker offers one entry per 15 minutes of the day, starting at index 1.
//! The video list shows localized day labels ("Mar 10, 2021", "10 mars 2021",
//! "10.03.2021") and tooltips carrying a clock value ("3:15 PM", "15:15").

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

pub const SLOT_MINUTES: u32 = 15;
pub const SLOTS_PER_HOUR: u32 = 60 / SLOT_MINUTES;

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?:\s*([ap])\.?\s?m\b\.?)?").expect("valid clock regex")
});

/// Parse a 24-hour `HH:MM` value.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    let (h, m) = value
        .trim()
        .split_once(':')
        .with_context(|| format!("Time '{}' is not in HH:MM form", value))?;
    let hour: u32 = h
        .trim()
        .parse()
        .with_context(|| format!("Bad hour in '{}'", value))?;
    let minute: u32 = m
        .trim()
        .parse()
        .with_context(|| format!("Bad minute in '{}'", value))?;
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(time) => Ok(time),
        None => bail!("Time '{}' is out of range", value),
    }
}

/// 1-based position of `HH:MM` in the time picker. Minutes that do not fall
/// on a slot boundary land in the slot containing them.
#[cfg(test)]
fn time_slot_index(value: &str) -> Result<usize> {
    let time = parse_hhmm(value)?;
    Ok(slot_index_of(time))
}

pub fn slot_index_of(time: NaiveTime) -> usize {
    use chrono::Timelike;
    (time.hour() * SLOTS_PER_HOUR + time.minute() / SLOT_MINUTES + 1) as usize
}

/// Start of the slot containing `time`.
pub fn slot_start(time: NaiveTime) -> NaiveTime {
    use chrono::Timelike;
    let minute = time.minute() / SLOT_MINUTES * SLOT_MINUTES;
    NaiveTime::from_hms_opt(time.hour(), minute, 0).unwrap_or(time)
}

/// The date as typed into the schedule date field.
pub fn format_picker_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Language settings read from the page's `lang` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    language: String,
    region: Option<String>,
}

impl Locale {
    pub fn from_lang(tag: &str) -> Self {
        let tag = tag.trim().to_lowercase().replace('_', "-");
        let mut parts = tag.split('-');
        let language = match parts.next() {
            Some(lang) if !lang.is_empty() => lang.to_string(),
            _ => "en".to_string(),
        };
        let region = parts.next().map(|r| r.to_string());
        Self { language, region }
    }

    pub fn english() -> Self {
        Self::from_lang("en-US")
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Numeric dates read month first (`3/10/2021`).
    fn month_first(&self) -> bool {
        self.language == "en" && matches!(self.region.as_deref(), None | Some("us"))
    }

    fn month_table(&self) -> &'static [&'static [&'static str]; 12] {
        match self.language.as_str() {
            "de" => &DE_MONTHS,
            "fr" => &FR_MONTHS,
            "es" => &ES_MONTHS,
            "it" => &IT_MONTHS,
            "pt" => &PT_MONTHS,
            "nl" => &NL_MONTHS,
            _ => &EN_MONTHS,
        }
    }

    fn month_of(&self, word: &str) -> Option<u32> {
        lookup_month(self.month_table(), word).or_else(|| lookup_month(&EN_MONTHS, word))
    }
}

// Prefixes; a word names a month when it starts with one of them.
const EN_MONTHS: [&[&str]; 12] = [
    &["jan"], &["feb"], &["mar"], &["apr"], &["may"], &["jun"],
    &["jul"], &["aug"], &["sep"], &["oct"], &["nov"], &["dec"],
];
const DE_MONTHS: [&[&str]; 12] = [
    &["jan", "jän"], &["feb"], &["mär", "mrz"], &["apr"], &["mai"], &["jun"],
    &["jul"], &["aug"], &["sep"], &["okt"], &["nov"], &["dez"],
];
const FR_MONTHS: [&[&str]; 12] = [
    &["janv"], &["févr", "fevr"], &["mars"], &["avr"], &["mai"], &["juin"],
    &["juil"], &["août", "aout"], &["sept"], &["oct"], &["nov"], &["déc", "dec"],
];
const ES_MONTHS: [&[&str]; 12] = [
    &["ene"], &["feb"], &["mar"], &["abr"], &["may"], &["jun"],
    &["jul"], &["ago"], &["sep"], &["oct"], &["nov"], &["dic"],
];
const IT_MONTHS: [&[&str]; 12] = [
    &["gen"], &["feb"], &["mar"], &["apr"], &["mag"], &["giu"],
    &["lug"], &["ago"], &["set"], &["ott"], &["nov"], &["dic"],
];
const PT_MONTHS: [&[&str]; 12] = [
    &["jan"], &["fev"], &["mar"], &["abr"], &["mai"], &["jun"],
    &["jul"], &["ago"], &["set"], &["out"], &["nov"], &["dez"],
];
const NL_MONTHS: [&[&str]; 12] = [
    &["jan"], &["feb"], &["mrt", "maa"], &["apr"], &["mei"], &["jun"],
    &["jul"], &["aug"], &["sep"], &["okt"], &["nov"], &["dec"],
];

fn lookup_month(table: &[&[&str]; 12], word: &str) -> Option<u32> {
    table
        .iter()
        .position(|prefixes| prefixes.iter().any(|p| word.starts_with(p)))
        .map(|idx| idx as u32 + 1)
}

struct DateParts {
    year: Option<i32>,
    month: u32,
    day: u32,
}

fn split_date(label: &str, locale: &Locale) -> Option<DateParts> {
    let tokens: Vec<String> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    let numbers: Vec<&str> = tokens
        .iter()
        .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
        .map(|t| t.as_str())
        .collect();
    let month_word = tokens
        .iter()
        .filter(|t| t.chars().all(|c| c.is_alphabetic()))
        .find_map(|t| locale.month_of(t));

    if let Some(month) = month_word {
        let year = numbers
            .iter()
            .find(|n| n.len() == 4)
            .and_then(|n| n.parse::<i32>().ok());
        let day = numbers
            .iter()
            .find(|n| n.len() <= 2)
            .and_then(|n| n.parse::<u32>().ok())?;
        return Some(DateParts { year, month, day });
    }

    if numbers.len() != 3 {
        return None;
    }
    let parse = |s: &str| s.parse::<u32>().ok();
    let (y, m, d) = if numbers[0].len() == 4 {
        (parse(numbers[0])?, parse(numbers[1])?, parse(numbers[2])?)
    } else if locale.month_first() {
        (parse(numbers[2])?, parse(numbers[0])?, parse(numbers[1])?)
    } else {
        (parse(numbers[2])?, parse(numbers[1])?, parse(numbers[0])?)
    };
    let year = if y < 100 { 2000 + y } else { y };
    Some(DateParts {
        year: Some(year as i32),
        month: m,
        day: d,
    })
}

/// Parse a list day label. Labels without a year take `today`'s year.
pub fn parse_day_label(label: &str, locale: &Locale, today: NaiveDate) -> Option<NaiveDate> {
    use chrono::Datelike;
    let parts = split_date(label, locale)?;
    NaiveDate::from_ymd_opt(parts.year.unwrap_or(today.year()), parts.month, parts.day)
}

/// Parse a metadata schedule date: `2021-03-10`, `Mar 10, 2021` or
/// `10 Mar 2021`. The year is required.
pub fn parse_schedule_date(value: &str) -> Result<NaiveDate> {
    let parts = split_date(value, &Locale::english())
        .with_context(|| format!("Unrecognized schedule date '{}'", value))?;
    let year = parts
        .year
        .with_context(|| format!("Schedule date '{}' has no year", value))?;
    NaiveDate::from_ymd_opt(year, parts.month, parts.day)
        .with_context(|| format!("Schedule date '{}' is not a calendar date", value))
}

/// First clock value in `text`, honoring an AM/PM suffix.
pub fn extract_clock(text: &str) -> Option<NaiveTime> {
    let caps = CLOCK_RE.captures(text)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
    if let Some(meridiem) = caps.get(3) {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("p");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// ISO-8601 rendering; with a zone the wall-clock time is read in that zone
/// and carries its offset. Nonexistent local times (DST gaps) yield `None`.
pub fn to_iso(naive: NaiveDateTime, tz: Option<Tz>) -> Option<String> {
    match tz {
        Some(tz) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.to_rfc3339()),
        None => Some(naive.format("%Y-%m-%dT%H:%M:%S").to_string()),
    }
}
