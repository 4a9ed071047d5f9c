use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::Error;

const INVALID: &str = "Invalid date format.";

const FILLER: [&str; 4] = ["at", "on", "the", "of"];

const WEEKDAYS: [&str; 14] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    "mon", "tue", "wed", "thu", "fri", "sat", "sun"
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm
}

#[derive(Debug, Default)]
struct Parts {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    meridiem: Option<Meridiem>
}

fn month_number(token: &str) -> Option<u32> {
    let month = match token.trim_end_matches('.') {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None
    };

    Some(month)
}

fn meridiem(token: &str) -> Option<Meridiem> {
    match token {
        "am" | "a.m." | "a" => Some(Meridiem::Am),
        "pm" | "p.m." | "p" => Some(Meridiem::Pm),
        _ => None
    }
}

/// Splits "12pm" or "7:30am" into the clock part and its meridiem.
fn split_meridiem(token: &str) -> (&str, Option<Meridiem>) {
    for suffix in ["a.m.", "p.m.", "am", "pm"] {
        if let Some(clock) = token.strip_suffix(suffix) {
            if !clock.is_empty() && clock.chars().all(|c| c.is_ascii_digit() || c == ':') {
                return (clock, meridiem(suffix));
            }
        }
    }

    (token, None)
}

fn strip_ordinal(token: &str) -> &str {
    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(number) = token.strip_suffix(suffix) {
            if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
                return number;
            }
        }
    }

    token
}

fn number<T: std::str::FromStr>(text: &str) -> Result<T, Error> {
    text.parse().map_err(|_| INVALID.into())
}

fn parse_clock(parts: &mut Parts, clock: &str) -> Result<(), Error> {
    if parts.hour.is_some() {
        return Err(INVALID.into());
    }

    let mut pieces = clock.split(':');
    parts.hour = Some(number(pieces.next().unwrap_or_default())?);
    parts.minute = pieces.next().map(number).transpose()?;
    parts.second = pieces.next().map(number).transpose()?;

    if pieces.next().is_some() {
        return Err(INVALID.into());
    }

    Ok(())
}

/// `2024-11-07`, `11/07/2024`, `11/07` (month first).
fn parse_numeric_date(parts: &mut Parts, token: &str) -> Result<(), Error> {
    if parts.day.is_some() || parts.month.is_some() {
        return Err(INVALID.into());
    }

    let pieces: Vec<&str> = token.split(['-', '/', '.']).collect();

    match pieces.as_slice() {
        [year, month, day] if year.len() == 4 => {
            parts.year = Some(number(year)?);
            parts.month = Some(number(month)?);
            parts.day = Some(number(day)?);
        }
        [month, day, year] => {
            let year: i32 = number(year)?;
            parts.year = Some(if year < 100 { 2000 + year } else { year });
            parts.month = Some(number(month)?);
            parts.day = Some(number(day)?);
        }
        [month, day] => {
            parts.month = Some(number(month)?);
            parts.day = Some(number(day)?);
        }
        _ => return Err(INVALID.into())
    }

    Ok(())
}

fn parse_bare_number(parts: &mut Parts, token: &str, next: Option<&str>) -> Result<(), Error> {
    let value: u32 = number(token)?;

    if next.and_then(meridiem).is_some() {
        return parse_clock(parts, token);
    }

    if token.len() == 4 && parts.year.is_none() {
        parts.year = Some(value as i32);
    } else if parts.day.is_none() && (1..=31).contains(&value) {
        parts.day = Some(value);
    } else if parts.hour.is_none() {
        parts.hour = Some(value);
    } else {
        return Err(INVALID.into());
    }

    Ok(())
}

fn apply_meridiem(hour: u32, meridiem: Option<Meridiem>) -> Result<u32, Error> {
    match meridiem {
        None => Ok(hour),
        Some(_) if hour == 0 || hour > 12 => Err(INVALID.into()),
        Some(Meridiem::Am) => Ok(hour % 12),
        Some(Meridiem::Pm) => Ok(hour % 12 + 12)
    }
}

/// Reads loosely written dates like "November 7th at 12 pm" or "2024-11-07 18:30".
/// Whatever is missing comes from `today` (the date) or midnight (the time).
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDateTime, Error> {
    let lowered = input.to_lowercase().replace(',', " ");
    let tokens: Vec<&str> = lowered.split_whitespace()
        .filter(|token| !FILLER.contains(token))
        .collect();

    if tokens.is_empty() {
        return Err(INVALID.into());
    }

    let mut parts = Parts::default();

    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).copied();

        if WEEKDAYS.contains(token) {
            continue;
        }

        if let Some(month) = month_number(token) {
            if parts.month.replace(month).is_some() {
                return Err(INVALID.into());
            }
            continue;
        }

        if let Some(m) = meridiem(token) {
            parts.meridiem = Some(m);
            continue;
        }

        match *token {
            "noon" => {
                parse_clock(&mut parts, "12")?;
                parts.meridiem = Some(Meridiem::Pm);
                continue;
            }
            "midnight" => {
                parse_clock(&mut parts, "12")?;
                parts.meridiem = Some(Meridiem::Am);
                continue;
            }
            _ => {}
        }

        let (clock, suffix) = split_meridiem(token);
        if suffix.is_some() {
            parse_clock(&mut parts, clock)?;
            parts.meridiem = suffix;
            continue;
        }

        if token.contains(':') {
            parse_clock(&mut parts, token)?;
        } else if token.contains(['-', '/']) {
            parse_numeric_date(&mut parts, token)?;
        } else {
            parse_bare_number(&mut parts, strip_ordinal(token), next)?;
        }
    }

    let hour = apply_meridiem(parts.hour.unwrap_or(0), parts.meridiem)?;

    let date = NaiveDate::from_ymd_opt(
        parts.year.unwrap_or_else(|| today.year()),
        parts.month.unwrap_or_else(|| today.month()),
        parts.day.unwrap_or_else(|| today.day())
    ).ok_or(INVALID)?;

    let time = NaiveTime::from_hms_opt(hour, parts.minute.unwrap_or(0), parts.second.unwrap_or(0))
        .ok_or(INVALID)?;

    Ok(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn month_name_with_ordinal_and_meridiem() {
        assert_eq!(parse_date("November 7th at 12 pm", today()).unwrap(), at(2024, 11, 7, 12, 0));
        assert_eq!(parse_date("Nov 7 2025 7:30pm", today()).unwrap(), at(2025, 11, 7, 19, 30));
        assert_eq!(parse_date("december 1st, 2024 12am", today()).unwrap(), at(2024, 12, 1, 0, 0));
    }

    #[test]
    fn numeric_dates() {
        assert_eq!(parse_date("2024-11-07 18:30", today()).unwrap(), at(2024, 11, 7, 18, 30));
        assert_eq!(parse_date("11/07/2024 9am", today()).unwrap(), at(2024, 11, 7, 9, 0));
        assert_eq!(parse_date("11/07", today()).unwrap(), at(2024, 11, 7, 0, 0));
    }

    #[test]
    fn missing_pieces_come_from_today() {
        assert_eq!(parse_date("5pm", today()).unwrap(), at(2024, 3, 15, 17, 0));
        assert_eq!(parse_date("friday at noon", today()).unwrap(), at(2024, 3, 15, 12, 0));
        assert_eq!(parse_date("July 4", today()).unwrap(), at(2024, 7, 4, 0, 0));
    }

    #[test]
    fn rejects_nonsense() {
        assert!(parse_date("", today()).is_err());
        assert!(parse_date("tomorrowish", today()).is_err());
        assert!(parse_date("February 30", today()).is_err());
        assert!(parse_date("13pm", today()).is_err());
        assert!(parse_date("25:00", today()).is_err());
    }
}
