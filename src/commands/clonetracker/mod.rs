mod dclone_models;

use std::time::{Duration, Instant};
use chrono::{Local, TimeZone};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use reqwest::Client;
use tracing::{debug, error};

use crate::{HoradricContext, Error, USER_AGENT};
use dclone_models::DcloneStatus;

const BASE_URL: &str = "https://diablo2.io/dclone_api.php";
const CACHE_TTL: Duration = Duration::from_secs(120);
const RED: u32 = 0xE74C3C;
const FETCH_FAILED: &str = "An error occurred while fetching Uber Diablo information.";

static CACHE: Lazy<DashMap<String, (Instant, Vec<DcloneStatus>)>> = Lazy::new(DashMap::new);

fn region_code(region: &str) -> Option<u8> {
    match region.to_lowercase().as_str() {
        "americas" => Some(1),
        "europe" => Some(2),
        "asia" => Some(3),
        "all" => Some(0),
        _ => None
    }
}

fn ladder_code(ladder: &str) -> Option<u8> {
    match ladder.to_lowercase().as_str() {
        "ladder" => Some(1),
        "non-ladder" => Some(2),
        "all" => Some(0),
        _ => None
    }
}

fn hardcore_code(hardcore: &str) -> Option<u8> {
    match hardcore.to_lowercase().as_str() {
        "hardcore" => Some(1),
        "softcore" => Some(2),
        "all" => Some(0),
        _ => None
    }
}

/// Builds the query URL, or the message explaining which argument is wrong.
fn tracker_url(region: &str, ladder: &str, hardcore: &str) -> Result<String, Error> {
    let region = region_code(region)
        .ok_or("Invalid region specified. Valid regions are: Americas, Europe, Asia, All.")?;
    let ladder = ladder_code(ladder)
        .ok_or("Invalid ladder type specified. Valid types are: Ladder, Non-Ladder, All.")?;
    let hardcore = hardcore_code(hardcore)
        .ok_or("Invalid hardcore type specified. Valid types are: Hardcore, Softcore, All.")?;

    Ok(format!("{BASE_URL}?region={region}&ladder={ladder}&hc={hardcore}"))
}

async fn fetch_status(url: &str) -> Result<Vec<DcloneStatus>, Error> {
    if let Some(entry) = CACHE.get(url) {
        let (fetched_at, statuses) = entry.value();
        if fetched_at.elapsed() < CACHE_TTL {
            debug!("Using cached dclone status for {}", url);
            return Ok(statuses.clone());
        }
    }

    let statuses = Client::new()
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<DcloneStatus>>()
        .await?;

    CACHE.insert(url.to_string(), (Instant::now(), statuses.clone()));

    Ok(statuses)
}

fn format_time(timestamp: i64) -> String {
    Local.timestamp_opt(timestamp, 0)
        .single()
        .map(|time| time.format("%I:%M %p").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Looks up the tracker, replying on its own when the arguments or the request fail.
async fn lookup(ctx: HoradricContext<'_>, region: &str, ladder: &str, hardcore: &str) -> Result<Option<Vec<DcloneStatus>>, Error> {
    let url = match tracker_url(region, ladder, hardcore) {
        Ok(url) => url,
        Err(ex) => {
            ctx.say(ex.to_string()).await?;
            return Ok(None);
        }
    };

    match fetch_status(&url).await {
        Ok(statuses) => Ok(Some(statuses)),
        Err(ex) => {
            error!("Failed to fetch dclone status from {}: {}", url, ex);
            ctx.say(FETCH_FAILED).await?;
            Ok(None)
        }
    }
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Search for Diablo on all regions.")
)]
pub async fn clonetracker(
    ctx: HoradricContext<'_>,
    #[description = "Americas, Europe, Asia or All."] region: Option<String>,
    #[description = "Ladder, Non-Ladder or All."] ladder: Option<String>,
    #[description = "Hardcore, Softcore or All."] hardcore: Option<String>)
-> Result<(), Error> {
    let region = region.unwrap_or_else(|| "all".to_string());
    let ladder = ladder.unwrap_or_else(|| "all".to_string());
    let hardcore = hardcore.unwrap_or_else(|| "all".to_string());

    let Some(statuses) = lookup(ctx, &region, &ladder, &hardcore).await? else {
        return Ok(());
    };

    let value = match statuses.first() {
        Some(status) => format!("Progress: {}/6\nLast Updated: {}", status.progress, format_time(status.timestamped)),
        None => "No information available.".to_string()
    };

    ctx.send(|m| m.embed(|e| e
        .title("Uber Diablo Status")
        .colour(RED)
        .field(format!("{ladder} - {hardcore}"), value, false)
    )).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Search for Diablo on all regions, as text.")
)]
pub async fn clonedatadump(
    ctx: HoradricContext<'_>,
    #[description = "Americas, Europe, Asia or All."] region: Option<String>,
    #[description = "Ladder, Non-Ladder or All."] ladder: Option<String>,
    #[description = "Hardcore, Softcore or All."] hardcore: Option<String>)
-> Result<(), Error> {
    let region = region.unwrap_or_else(|| "all".to_string());
    let ladder = ladder.unwrap_or_else(|| "all".to_string());
    let hardcore = hardcore.unwrap_or_else(|| "all".to_string());

    let Some(statuses) = lookup(ctx, &region, &ladder, &hardcore).await? else {
        return Ok(());
    };

    let line = match statuses.first() {
        Some(status) => format!("{ladder} - {hardcore}: Progress: {}/6, Last Updated: {}", status.progress, format_time(status.timestamped)),
        None => format!("{ladder} - {hardcore}: No information available.")
    };

    ctx.say(line).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(region_code("Europe"), Some(2));
        assert_eq!(ladder_code("NON-LADDER"), Some(2));
        assert_eq!(hardcore_code("Softcore"), Some(2));
        assert_eq!(region_code("mars"), None);
    }

    #[test]
    fn builds_query() {
        assert_eq!(
            tracker_url("Americas", "Ladder", "all").unwrap(),
            "https://diablo2.io/dclone_api.php?region=1&ladder=1&hc=0"
        );
    }

    #[test]
    fn reports_first_invalid_argument() {
        let err = tracker_url("mars", "nope", "nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid region specified. Valid regions are: Americas, Europe, Asia, All.");

        let err = tracker_url("all", "all", "medium").unwrap_err();
        assert_eq!(err.to_string(), "Invalid hardcore type specified. Valid types are: Hardcore, Softcore, All.");
    }

    #[test]
    fn formats_twelve_hour_time() {
        let formatted = format_time(1_700_000_000);
        assert!(formatted.ends_with("AM") || formatted.ends_with("PM"));
        assert_eq!(formatted.len(), 8);
    }
}
