mod pokeapi_models;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::{HoradricContext, Error, USER_AGENT};
use pokeapi_models::*;

const BASE_URL: &str = "https://pokeapi.co/api/v2";

/// `None` when PokeAPI has no such resource.
async fn fetch<T: DeserializeOwned>(client: &Client, url: &str) -> Result<Option<T>, Error> {
    let response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    Ok(Some(response.error_for_status()?.json::<T>().await?))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new()
    }
}

/// PokeAPI flavor text is full of hard line breaks and form feeds.
fn english_flavor_text(entries: &[FlavorText]) -> String {
    entries.iter()
        .find(|entry| entry.language.name == "en")
        .map(|entry| entry.flavor_text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn evolution_line(chain: &ChainLink) -> String {
    let mut names = Vec::new();
    let mut link = Some(chain);

    while let Some(current) = link {
        names.push(capitalize(&current.species.name));
        link = current.evolves_to.first();
    }

    if names.len() > 1 {
        names.join(" -> ")
    } else {
        "No evolutions".to_string()
    }
}

/// Heights and weights come in decimetres and hectograms.
fn tenths(value: u32, unit: &str) -> String {
    format!("{:.1}{}", value as f64 / 10.0, unit)
}

fn item_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Show Pokemon info."),
    discard_spare_arguments
)]
pub async fn pokedex(
    ctx: HoradricContext<'_>,
    #[description = "The Pokemon's name or national dex number."] name_or_id: String)
-> Result<(), Error> {
    ctx.defer().await?;

    let client = Client::new();
    let species_url = format!("{BASE_URL}/pokemon-species/{}", name_or_id.trim().to_lowercase());

    let species: Species = match fetch(&client, &species_url).await {
        Ok(Some(species)) => species,
        Ok(None) => {
            ctx.say("No Pokemon found.").await?;
            return Ok(());
        }
        Err(ex) => {
            error!("Failed to fetch species {}: {}", name_or_id, ex);
            ctx.say("No Pokemon found.").await?;
            return Ok(());
        }
    };

    let variety = species.varieties.iter()
        .find(|variety| variety.is_default)
        .or_else(|| species.varieties.first())
        .and_then(|variety| variety.pokemon.url.clone());

    let pokemon: Option<Pokemon> = match variety {
        Some(url) => fetch(&client, &url).await.unwrap_or_else(|ex| {
            error!("Failed to fetch pokemon {}: {}", url, ex);
            None
        }),
        None => None
    };

    let Some(pokemon) = pokemon else {
        ctx.say("No Pokemon found.").await?;
        return Ok(());
    };

    let evolutions = match &species.evolution_chain {
        Some(chain) => match fetch::<EvolutionChain>(&client, &chain.url).await {
            Ok(Some(chain)) => evolution_line(&chain.chain),
            Ok(None) => "No evolutions".to_string(),
            Err(ex) => {
                error!("Failed to fetch evolution chain {}: {}", chain.url, ex);
                "No evolutions".to_string()
            }
        },
        None => "No evolutions".to_string()
    };

    let description = english_flavor_text(&species.flavor_text_entries);

    ctx.send(|m| m.embed(|e| {
        e.title(capitalize(&pokemon.name))
            .description(description)
            .field("Evolution Chain", evolutions, false)
            .field("Height", tenths(pokemon.height, "m"), true)
            .field("Weight", tenths(pokemon.weight, "kg"), true)
            .footer(|f| f.text("Powered by PokeAPI"));

        if let Some(sprite) = &pokemon.sprites.front_default {
            e.thumbnail(sprite);
        }

        e
    })).await?;

    Ok(())
}

#[poise::command(
    prefix_command,
    slash_command,
    description_localized("en-US", "Show Pokemon item info.")
)]
pub async fn iteminfo(
    ctx: HoradricContext<'_>,
    #[description = "The item's name."] #[rest] item_name: String)
-> Result<(), Error> {
    let url = format!("{BASE_URL}/item/{}", item_slug(&item_name));

    let item: Item = match fetch(&Client::new(), &url).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            ctx.say("No item found.").await?;
            return Ok(());
        }
        Err(ex) => {
            error!("Failed to fetch item {}: {}", item_name, ex);
            ctx.say("No item found.").await?;
            return Ok(());
        }
    };

    let effect = item.effect_entries.iter()
        .find(|entry| entry.language.name == "en")
        .or_else(|| item.effect_entries.first())
        .map(|entry| entry.effect.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let flavor_text = english_flavor_text(&item.flavor_text_entries);

    ctx.send(|m| m.embed(|e| {
        e.title("Item Information")
            .colour(0x3498DB)
            .field("Name", capitalize(&item.name), false)
            .field("Category", capitalize(&item.category.name), false)
            .field("Cost", item.cost.to_string(), false)
            .field("Effect", effect, false)
            .field("Flavor Text", if flavor_text.is_empty() { "\u{200b}".to_string() } else { flavor_text }, false)
            .footer(|f| f.text("Powered by PokeAPI"));

        if let Some(sprite) = &item.sprites.default {
            e.thumbnail(sprite);
        }

        e
    })).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(name: &str, evolves_to: Vec<ChainLink>) -> ChainLink {
        ChainLink {
            species: NamedResource { name: name.to_string(), url: None },
            evolves_to
        }
    }

    #[test]
    fn evolution_line_follows_first_branch() {
        let chain = link("bulbasaur", vec![link("ivysaur", vec![link("venusaur", vec![])])]);
        assert_eq!(evolution_line(&chain), "Bulbasaur -> Ivysaur -> Venusaur");

        let eevee = link("eevee", vec![link("vaporeon", vec![]), link("jolteon", vec![])]);
        assert_eq!(evolution_line(&eevee), "Eevee -> Vaporeon");
    }

    #[test]
    fn single_stage_has_no_evolutions() {
        assert_eq!(evolution_line(&link("tauros", vec![])), "No evolutions");
    }

    #[test]
    fn measurements_use_one_decimal() {
        assert_eq!(tenths(7, "m"), "0.7m");
        assert_eq!(tenths(10, "m"), "1.0m");
        assert_eq!(tenths(905, "kg"), "90.5kg");
    }

    #[test]
    fn flavor_text_prefers_english_and_collapses_breaks() {
        let entries: Vec<FlavorText> = serde_json::from_value(serde_json::json!([
            { "flavor_text": "Une graine", "language": { "name": "fr" } },
            { "flavor_text": "A strange seed was\nplanted on its\u{000c}back at birth.", "language": { "name": "en" } }
        ])).unwrap();

        assert_eq!(english_flavor_text(&entries), "A strange seed was planted on its back at birth.");
        assert_eq!(english_flavor_text(&[]), "");
    }

    #[test]
    fn item_names_become_slugs() {
        assert_eq!(item_slug(" Master Ball "), "master-ball");
        assert_eq!(item_slug("potion"), "potion");
    }

    #[test]
    fn item_flavor_text_uses_text_field() {
        let item: Item = serde_json::from_value(serde_json::json!({
            "name": "potion",
            "cost": 200,
            "category": { "name": "healing" },
            "effect_entries": [{ "effect": "Restores 20 HP.", "language": { "name": "en" } }],
            "flavor_text_entries": [{ "text": "Heals a bit.", "language": { "name": "en" } }],
            "sprites": { "default": null }
        })).unwrap();

        assert_eq!(english_flavor_text(&item.flavor_text_entries), "Heals a bit.");
        assert_eq!(capitalize(&item.category.name), "Healing");
    }
}
