mod date_parser;
mod timezones;

use chrono::{LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

use crate::{HoradricContext, Error};

const BLUE: u32 = 0x3498DB;

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum TimestampFormat {
    #[name = "All Formats"]
    All,
    #[name = "Short Time"]
    ShortTime,
    #[name = "Long Time"]
    LongTime,
    #[name = "Short Date"]
    ShortDate,
    #[name = "Long Date"]
    LongDate,
    #[name = "Short Date/Time"]
    ShortDateTime,
    #[name = "Long Date/Time"]
    LongDateTime,
    #[name = "Relative Time"]
    Relative
}

const SINGLE_FORMATS: [TimestampFormat; 7] = [
    TimestampFormat::ShortTime,
    TimestampFormat::LongTime,
    TimestampFormat::ShortDate,
    TimestampFormat::LongDate,
    TimestampFormat::ShortDateTime,
    TimestampFormat::LongDateTime,
    TimestampFormat::Relative
];

impl TimestampFormat {
    fn label(self) -> &'static str {
        match self {
            TimestampFormat::All => "All Formats",
            TimestampFormat::ShortTime => "Short Time",
            TimestampFormat::LongTime => "Long Time",
            TimestampFormat::ShortDate => "Short Date",
            TimestampFormat::LongDate => "Long Date",
            TimestampFormat::ShortDateTime => "Short Date/Time",
            TimestampFormat::LongDateTime => "Long Date/Time",
            TimestampFormat::Relative => "Relative Time"
        }
    }

    /// Discord's style letter; `All` has none.
    fn style(self) -> Option<char> {
        match self {
            TimestampFormat::All => None,
            TimestampFormat::ShortTime => Some('t'),
            TimestampFormat::LongTime => Some('T'),
            TimestampFormat::ShortDate => Some('d'),
            TimestampFormat::LongDate => Some('D'),
            TimestampFormat::ShortDateTime => Some('f'),
            TimestampFormat::LongDateTime => Some('F'),
            TimestampFormat::Relative => Some('R')
        }
    }
}

fn markup(timestamp: i64, style: char) -> String {
    format!("<t:{timestamp}:{style}>")
}

/// Turns "<date text> <timezone>" into a unix timestamp.
/// A bad date is reported before a bad timezone.
fn to_unix(input: &str) -> Result<i64, Error> {
    let (date, zone) = input.trim().rsplit_once(' ').ok_or("Invalid date format.")?;
    date_parser::parse_date(date, Utc::now().date_naive())?;

    let tz = timezones::resolve(zone).ok_or("Invalid or unsupported timezone.")?;

    // Missing date parts are filled from the day it is in that zone.
    let today = Utc::now().with_timezone(&tz).date_naive();
    let naive = date_parser::parse_date(date, today)?;

    Ok(standard_time_timestamp(tz, &naive))
}

/// Clock times that a DST change repeats or skips are read as standard time.
fn standard_time_timestamp(tz: Tz, naive: &NaiveDateTime) -> i64 {
    let offset = match tz.offset_from_local_datetime(naive) {
        LocalResult::Single(offset) => offset.fix().local_minus_utc() as i64,
        LocalResult::Ambiguous(_, _) | LocalResult::None => {
            tz.offset_from_utc_datetime(naive).base_utc_offset().num_seconds()
        }
    };

    naive.and_utc().timestamp() - offset
}

#[poise::command(
    slash_command,
    description_localized("en-US", "Create a timestamp from a date and timezone.")
)]
pub async fn timestamp(
    ctx: HoradricContext<'_>,
    #[description = "Example: November 7th at 12 pm est"] date: String,
    #[description = "The format of the timestamp or all formats."] format: TimestampFormat)
-> Result<(), Error> {
    let timestamp = match to_unix(&date) {
        Ok(timestamp) => timestamp,
        Err(ex) => {
            ctx.send(|m| m.content(ex.to_string()).ephemeral(true)).await?;
            return Ok(());
        }
    };

    match format.style() {
        None => {
            ctx.send(|m| m.ephemeral(true).embed(|e| {
                e.title("Timestamps in All Formats").colour(BLUE);

                for single in SINGLE_FORMATS {
                    if let Some(style) = single.style() {
                        let code = markup(timestamp, style);
                        e.field(single.label(), format!("{code}\n`{code}`"), false);
                    }
                }

                e
            })).await?;
        }
        Some(style) => {
            let code = markup(timestamp, style);

            ctx.send(|m| m.ephemeral(true).embed(|e| e
                .title("Timestamp")
                .description(format!("**{}**\n{code}\n`{code}`", format.label()))
                .colour(BLUE)
            )).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_with_abbreviation() {
        // 2024-11-07 12:00 EST is 17:00 UTC.
        assert_eq!(to_unix("2024-11-07 12 pm est").unwrap(), 1730998800);
    }

    #[test]
    fn converts_with_iana_name() {
        assert_eq!(to_unix("January 1st 2024 00:00 utc").unwrap(), 1704067200);
        assert_eq!(to_unix("January 1st 2024 09:00 Asia/Tokyo").unwrap(), 1704067200);
    }

    #[test]
    fn reports_which_part_is_wrong() {
        assert_eq!(to_unix("November 7th mars").unwrap_err().to_string(), "Invalid or unsupported timezone.");
        assert_eq!(to_unix("notadate est").unwrap_err().to_string(), "Invalid date format.");
        assert_eq!(to_unix("est").unwrap_err().to_string(), "Invalid date format.");
    }

    #[test]
    fn bad_date_wins_over_bad_timezone() {
        assert_eq!(to_unix("notadate mars").unwrap_err().to_string(), "Invalid date format.");
    }

    #[test]
    fn repeated_hour_reads_as_standard_time() {
        // 01:30 happens twice on 2024-11-03 in New York; EST is 06:30 UTC.
        assert_eq!(to_unix("November 3 2024 1:30am est").unwrap(), 1730615400);
    }

    #[test]
    fn skipped_hour_uses_the_standard_offset() {
        // 02:30 never happens on 2024-03-10 in New York; at -05:00 it is 07:30 UTC.
        assert_eq!(to_unix("March 10 2024 2:30am est").unwrap(), 1710055800);
    }

    #[test]
    fn summer_times_use_daylight_offset() {
        // 2024-07-04 12:00 EDT is 16:00 UTC.
        assert_eq!(to_unix("July 4 2024 12pm est").unwrap(), 1720108800);
    }

    #[test]
    fn markup_uses_discord_syntax() {
        assert_eq!(markup(1704067200, 'R'), "<t:1704067200:R>");
        assert_eq!(SINGLE_FORMATS.iter().filter_map(|f| f.style()).collect::<String>(), "tTdDfFR");
    }
}
