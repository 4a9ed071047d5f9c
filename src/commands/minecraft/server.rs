use std::borrow::Cow;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serenity::model::channel::AttachmentType;
use tracing::{error, warn};
use crate::{HoradricContext, Error};
use super::{clean_motd, parse_input};
use proto_mc::ping::ping as mc_ping;

const GREEN: u32 = 0x2ECC71;
const PNG_DATA_URL: &str = "data:image/png;base64,";

/// The PNG bytes of a status favicon, which servers send as a data URL.
fn decode_favicon(favicon: &str) -> Option<Vec<u8>> {
    let encoded = favicon.strip_prefix(PNG_DATA_URL)?;
    // Some servers wrap the base64 text.
    let encoded: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    match STANDARD.decode(encoded) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(ex) => {
            warn!("Server sent an unreadable favicon: {}", ex);
            None
        }
    }
}

/// Attachment names can't hold the ':' of a host:port.
fn icon_filename(host: &str) -> String {
    let safe: String = host.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    format!("{safe}_icon.png")
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Get full information about a Minecraft server."),
    discard_spare_arguments
)]
pub async fn server(
    ctx: HoradricContext<'_>,
    #[description = "The hostname of the server."] host: String,
    #[description = "The port of the server."] #[min = 1] #[max = 65535] port: Option<u16>)
-> Result<(), Error> {

    let connection = match parse_input(&host, port) {
        Ok(connection) => connection,
        Err(ex) => {
            ctx.send(|msg| msg.content(ex.to_string()).ephemeral(true)).await?;
            return Ok(());
        }
    };

    ctx.defer().await?;

    match mc_ping(&connection).await {
        Ok(response) => {
            let icon = response.favicon.as_deref().and_then(decode_favicon);
            let icon_attached = icon.is_some();
            let filename = icon_filename(&host);

            ctx.send(|msg| {
                if let Some(icon) = icon {
                    msg.attachment(AttachmentType::Bytes { data: Cow::Owned(icon), filename: filename.clone() });
                }

                msg.embed(|embed| {
                    embed.title(format!("Server Info: {host}")).colour(GREEN);

                    if icon_attached {
                        embed.thumbnail(format!("attachment://{filename}"));
                    }

                    if let Some(description) = response.description {
                        embed.description(clean_motd(&description.text));
                    }

                    embed.field("Online", format!("{}/{}", response.players.online, response.players.max), false);
                    embed.field("Version", response.version.name, true);

                    if let Some(player_list) = response.players.sample {
                        let player_list = player_list
                            .iter()
                            .map(|o| o.name.clone())
                            .collect::<Vec<_>>()
                            .join(", ");

                        if !player_list.is_empty() {
                            embed.field("Players", player_list, false);
                        }
                    }

                    if let Some(ping) = response.ping {
                        embed.field("Latency", format!("{ping} ms"), false);
                    }

                    embed
                })
            }).await?;
        },
        Err(e) => {
            error!("Failed to ping server {}: {}", connection, e);

            ctx.send(|msg| {
                msg.content(format!("An error occurred: {e}")).ephemeral(true)
            }).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 1x1 transparent PNG.
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn favicon_data_url_is_decoded() {
        let bytes = decode_favicon(&format!("{PNG_DATA_URL}{PIXEL}")).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn wrapped_favicon_is_decoded() {
        let (head, tail) = PIXEL.split_at(20);
        assert!(decode_favicon(&format!("{PNG_DATA_URL}{head}\n{tail}")).is_some());
    }

    #[test]
    fn missing_or_broken_favicons_are_skipped() {
        assert!(decode_favicon("").is_none());
        assert!(decode_favicon("data:image/jpeg;base64,AAAA").is_none());
        assert!(decode_favicon(&format!("{PNG_DATA_URL}!!!")).is_none());
    }

    #[test]
    fn icon_names_are_attachment_safe() {
        assert_eq!(icon_filename("mc.example.com:25570"), "mc.example.com_25570_icon.png");
    }
}
