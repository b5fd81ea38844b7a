use crate::config::AssetsConfig;
use crate::models::{NftMetadata, Profile, Rarity, TokenId};

/// Locates token images on the collection's content gateway
#[derive(Debug, Clone)]
pub struct AssetGateway {
    base: String,
}

impl AssetGateway {
    pub fn new(config: &AssetsConfig) -> Self {
        Self {
            base: config.gateway_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn image_url(&self, id: TokenId) -> String {
        format!("{}/{id}.png", self.base)
    }

    pub fn primary_image_url(&self, profile: &Profile) -> Option<String> {
        profile.primary_nft_id().map(|id| self.image_url(id))
    }

    pub fn metadata(&self, id: TokenId) -> NftMetadata {
        NftMetadata {
            id,
            image_url: self.image_url(id),
            rarity: Rarity::for_token(id),
        }
    }
}
