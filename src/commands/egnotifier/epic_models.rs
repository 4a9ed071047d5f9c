use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FreeGamesResponse {
    pub data: FreeGamesData
}

#[derive(Debug, Deserialize)]
pub struct FreeGamesData {
    #[serde(rename = "Catalog")]
    pub catalog: Catalog
}

#[derive(Debug, Deserialize)]
pub struct Catalog {
    #[serde(rename = "searchStore")]
    pub search_store: SearchStore
}

#[derive(Debug, Deserialize)]
pub struct SearchStore {
    #[serde(default)]
    pub elements: Vec<Game>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_slug: Option<String>,
    #[serde(default)]
    pub url_slug: Option<String>,
    #[serde(default)]
    pub key_images: Vec<KeyImage>,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub promotions: Option<Promotions>
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyImage {
    pub url: String
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotions {
    #[serde(default)]
    pub promotional_offers: Vec<PromotionalOfferGroup>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionalOfferGroup {
    #[serde(default)]
    pub promotional_offers: Vec<PromotionalOffer>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionalOffer {
    #[serde(default)]
    pub end_date: Option<String>
}

impl Game {
    pub fn is_free_now(&self) -> bool {
        self.promotions.as_ref()
            .map(|promotions| !promotions.promotional_offers.is_empty())
            .unwrap_or(false)
    }

    /// Epic sometimes leaves the product slug empty and only fills the URL slug.
    pub fn store_url(&self) -> String {
        let slug = self.product_slug.as_deref()
            .filter(|slug| !slug.is_empty())
            .or(self.url_slug.as_deref())
            .unwrap_or_default();

        format!("https://epicgames.com/store/product/{slug}")
    }

    /// When the giveaway ends, from the running offer if there is one.
    pub fn available_until(&self) -> Option<&str> {
        self.promotions.as_ref()
            .and_then(|promotions| promotions.promotional_offers.first())
            .and_then(|group| group.promotional_offers.first())
            .and_then(|offer| offer.end_date.as_deref())
            .or(self.expiry_date.as_deref())
    }
}
