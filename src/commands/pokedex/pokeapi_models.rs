use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>
}

#[derive(Debug, Deserialize)]
pub struct Species {
    pub varieties: Vec<Variety>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
    #[serde(default)]
    pub evolution_chain: Option<ApiResource>
}

#[derive(Debug, Deserialize)]
pub struct Variety {
    #[serde(default)]
    pub is_default: bool,
    pub pokemon: NamedResource
}

#[derive(Debug, Deserialize)]
pub struct ApiResource {
    pub url: String
}

#[derive(Debug, Deserialize)]
pub struct FlavorText {
    // Species use `flavor_text`, items use `text`.
    #[serde(alias = "text")]
    pub flavor_text: String,
    pub language: NamedResource
}

#[derive(Debug, Deserialize)]
pub struct Pokemon {
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    pub sprites: PokemonSprites
}

#[derive(Debug, Deserialize)]
pub struct PokemonSprites {
    pub front_default: Option<String>
}

#[derive(Debug, Deserialize)]
pub struct EvolutionChain {
    pub chain: ChainLink
}

#[derive(Debug, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>
}

#[derive(Debug, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub cost: u32,
    pub category: NamedResource,
    #[serde(default)]
    pub effect_entries: Vec<EffectEntry>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
    pub sprites: ItemSprites
}

#[derive(Debug, Deserialize)]
pub struct EffectEntry {
    pub effect: String,
    pub language: NamedResource
}

#[derive(Debug, Deserialize)]
pub struct ItemSprites {
    pub default: Option<String>
}
