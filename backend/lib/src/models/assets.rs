use serde::{Deserialize, Serialize};

use crate::constants::assets::{GENESIS_MAX_ID, RARE_MAX_ID, UNCOMMON_MAX_ID};
use crate::models::profile::TokenId;

/// Rarity class of a token, derived from its position in the mint order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Genesis,
}

impl Rarity {
    pub fn for_token(id: TokenId) -> Self {
        if id <= GENESIS_MAX_ID {
            Rarity::Genesis
        } else if id <= RARE_MAX_ID {
            Rarity::Rare
        } else if id <= UNCOMMON_MAX_ID {
            Rarity::Uncommon
        } else {
            Rarity::Common
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadata {
    pub id: TokenId,
    pub image_url: String,
    pub rarity: Rarity,
}
