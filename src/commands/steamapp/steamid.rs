/// Every individual account id is offset from this in SteamID64 form.
const INDIVIDUAL_BASE: u64 = 76561197960265728;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteamId(pub u64);

impl SteamId {
    /// `None` when the account id would not fit in a SteamID64.
    pub fn from_account_id(account_id: u64) -> Option<Self> {
        INDIVIDUAL_BASE.checked_add(account_id).map(SteamId)
    }

    /// `STEAM_X:Y:Z`, where the account id is `Z * 2 + Y`.
    pub fn parse_steam2(input: &str) -> Option<Self> {
        let rest = input.strip_prefix("STEAM_")?;
        let mut parts = rest.split(':');

        let _universe: u8 = parts.next()?.parse().ok()?;
        let y: u64 = parts.next()?.parse().ok()?;
        let z: u64 = parts.next()?.parse().ok()?;

        if parts.next().is_some() || y > 1 {
            return None;
        }

        z.checked_mul(2)
            .and_then(|doubled| doubled.checked_add(y))
            .and_then(Self::from_account_id)
    }

    /// `[U:1:N]`, with or without the brackets.
    pub fn parse_steam3(input: &str) -> Option<Self> {
        let inner = input.trim_start_matches('[').trim_end_matches(']');
        let account_id = inner.strip_prefix("U:1:")?.parse().ok()?;

        Self::from_account_id(account_id)
    }

    pub fn as_32(self) -> u64 {
        self.0.saturating_sub(INDIVIDUAL_BASE)
    }

    pub fn as_steam2(self) -> String {
        let account_id = self.as_32();
        format!("STEAM_1:{}:{}", account_id & 1, account_id >> 1)
    }

    pub fn as_steam3(self) -> String {
        format!("[U:1:{}]", self.as_32())
    }
}

/// What a user typed when asking for a profile.
#[derive(Debug, PartialEq, Eq)]
pub enum SteamInput {
    Id(SteamId),
    Vanity(String)
}

/// Pulls the last path segment out of a community URL, trailing slash or not.
fn strip_profile_url(input: &str) -> &str {
    const PREFIXES: [&str; 4] = [
        "https://steamcommunity.com/id/",
        "http://steamcommunity.com/id/",
        "https://steamcommunity.com/profiles/",
        "http://steamcommunity.com/profiles/"
    ];

    PREFIXES.iter()
        .find_map(|prefix| input.strip_prefix(prefix))
        .map(|rest| rest.split('/').next().unwrap_or_default())
        .unwrap_or(input)
}

fn looks_like_id(input: &str) -> bool {
    input.starts_with("STEAM_") || input.starts_with("[U:") || input.starts_with("U:")
}

/// `None` when the input is shaped like an id but isn't a valid one.
pub fn parse_input(input: &str) -> Option<SteamInput> {
    let input = strip_profile_url(input.trim());

    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return input.parse().ok().map(|id| SteamInput::Id(SteamId(id)));
    }

    if looks_like_id(input) {
        return SteamId::parse_steam2(input)
            .or_else(|| SteamId::parse_steam3(input))
            .map(SteamInput::Id);
    }

    Some(SteamInput::Vanity(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_formats() {
        let id = SteamId(76561197960287930);

        assert_eq!(id.as_32(), 22202);
        assert_eq!(id.as_steam2(), "STEAM_1:0:11101");
        assert_eq!(id.as_steam3(), "[U:1:22202]");
    }

    #[test]
    fn parses_steam2_and_steam3() {
        assert_eq!(SteamId::parse_steam2("STEAM_0:0:11101"), Some(SteamId(76561197960287930)));
        assert_eq!(SteamId::parse_steam2("STEAM_1:1:11101"), Some(SteamId(76561197960287931)));
        assert_eq!(SteamId::parse_steam3("[U:1:22202]"), Some(SteamId(76561197960287930)));
        assert_eq!(SteamId::parse_steam2("STEAM_0:2:1"), None);
        assert_eq!(SteamId::parse_steam3("[G:1:22202]"), None);
    }

    #[test]
    fn reads_profile_urls() {
        assert_eq!(parse_input("https://steamcommunity.com/profiles/76561197960287930/"), Some(SteamInput::Id(SteamId(76561197960287930))));
        assert_eq!(parse_input("https://steamcommunity.com/profiles/76561197960287930"), Some(SteamInput::Id(SteamId(76561197960287930))));
        assert_eq!(parse_input("http://steamcommunity.com/id/gabelogannewell/"), Some(SteamInput::Vanity("gabelogannewell".to_string())));
    }

    #[test]
    fn bare_names_are_vanity() {
        assert_eq!(parse_input("robinwalker"), Some(SteamInput::Vanity("robinwalker".to_string())));
        assert_eq!(parse_input("STEAM_0:1:4491990"), SteamId::from_account_id(8983981).map(SteamInput::Id));
    }

    #[test]
    fn oversized_ids_are_rejected() {
        assert_eq!(parse_input("STEAM_0:0:18446744073709551615"), None);
        assert_eq!(parse_input("STEAM_0:1:9223372036854775807"), None);
        assert_eq!(parse_input("[U:1:18446744073709551615]"), None);
        assert_eq!(parse_input("99999999999999999999999"), None);
        assert_eq!(SteamId::from_account_id(u64::MAX), None);
    }

    #[test]
    fn malformed_ids_are_not_vanity_names() {
        assert_eq!(parse_input("STEAM_0:5:1"), None);
        assert_eq!(parse_input("[U:1:abc]"), None);
    }
}
