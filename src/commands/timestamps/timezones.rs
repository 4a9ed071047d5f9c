use std::str::FromStr;
use chrono_tz::Tz;

/// Abbreviations people actually type, mapped to the zone that observes them.
fn from_abbreviation(abbreviation: &str) -> Option<Tz> {
    let tz = match abbreviation {
        "est" | "edt" => Tz::America__New_York,
        "cst" | "cdt" => Tz::America__Chicago,
        "mst" | "mdt" => Tz::America__Denver,
        "pst" | "pdt" => Tz::America__Los_Angeles,
        "gmt" => Tz::Etc__Greenwich,
        "bst" => Tz::Europe__London,
        "utc" => Tz::UTC,
        _ => return None
    };

    Some(tz)
}

/// Accepts an abbreviation or any IANA name, ignoring case.
pub fn resolve(name: &str) -> Option<Tz> {
    let name = name.trim();

    from_abbreviation(&name.to_lowercase())
        .or_else(|| Tz::from_str(name).ok())
        .or_else(|| Tz::from_str_insensitive(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_resolve() {
        assert_eq!(resolve("EST"), Some(Tz::America__New_York));
        assert_eq!(resolve("pdt"), Some(Tz::America__Los_Angeles));
        assert_eq!(resolve("utc"), Some(Tz::UTC));
    }

    #[test]
    fn iana_names_resolve_in_any_case() {
        assert_eq!(resolve("Europe/Berlin"), Some(Tz::Europe__Berlin));
        assert_eq!(resolve("asia/tokyo"), Some(Tz::Asia__Tokyo));
    }

    #[test]
    fn unknown_zones_do_not() {
        assert_eq!(resolve("xyz"), None);
        assert_eq!(resolve("Mars/Olympus_Mons"), None);
    }
}
