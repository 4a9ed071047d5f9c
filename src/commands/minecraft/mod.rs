pub mod player;
pub mod server;
mod mojang;

use player::*;
use server::*;

use crate::{HoradricContext, Error};
use crate::commands::group_help;

#[poise::command(prefix_command, slash_command,
    subcommands("player", "cape", "skin", "server"),
    discard_spare_arguments,
    description_localized("en-US", "Look up Minecraft players and servers."),
    aliases("mc"),
    guild_only,
    identifying_name = "Minecraft"
)]
pub async fn minecraft(ctx: HoradricContext<'_>) -> Result<(), Error> {
    group_help(ctx).await
}

fn parse_input(host: &str, port: Option<u16>) -> Result<String, Error> {
    let split = host.split(':').collect::<Vec<&str>>();

    let (input_host, input_port) = match split.as_slice() {
        [host] => (*host, port.unwrap_or(25565).to_string()),
        [host, port] => (*host, port.to_string()),
        _ => return Err("Invalid hostname, please try again.".into())
    };

    if input_host.is_empty() {
        return Err("Invalid hostname, please try again.".into());
    }

    match input_port.parse::<u16>() {
        Ok(port) if port > 0 => Ok(format!("{input_host}:{port}")),
        _ => Err("Invalid port, please try again.".into())
    }
}

/// Strips `§x` formatting codes from a server description.
fn clean_motd(motd: &str) -> String {
    let mut cleaned = String::with_capacity(motd.len());
    let mut chars = motd.chars();

    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            cleaned.push(c);
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_applied() {
        assert_eq!(parse_input("mc.example.com", None).unwrap(), "mc.example.com:25565");
        assert_eq!(parse_input("mc.example.com", Some(25570)).unwrap(), "mc.example.com:25570");
    }

    #[test]
    fn inline_port_wins() {
        assert_eq!(parse_input("mc.example.com:1234", Some(25570)).unwrap(), "mc.example.com:1234");
    }

    #[test]
    fn bad_input_is_rejected() {
        assert_eq!(parse_input("a:b:c", None).unwrap_err().to_string(), "Invalid hostname, please try again.");
        assert_eq!(parse_input("host:99999", None).unwrap_err().to_string(), "Invalid port, please try again.");
        assert_eq!(parse_input("host:0", None).unwrap_err().to_string(), "Invalid port, please try again.");
        assert!(parse_input(":25565", None).is_err());
    }

    #[test]
    fn motd_codes_are_removed() {
        assert_eq!(clean_motd("§aHello §lWorld§r!"), "Hello World!");
        assert_eq!(clean_motd("plain"), "plain");
        assert_eq!(clean_motd("trailing§"), "trailing");
    }
}
