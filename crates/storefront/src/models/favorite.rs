//! Per-user favorite marks.

use chrono::{DateTime, Utc};
use ruya_core::{Price, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::{PLACEHOLDER_IMAGE, ProductSnapshot};

/// A favorited product, stored at `users/{uid}/favorites/{productId}`.
///
/// Presence of the document is the mark; it is never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteMark {
    pub id: ProductId,
    pub user_id: UserId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_webp_url: String,
    #[serde(default)]
    pub image_fallback_url: String,
    #[serde(default)]
    pub category: String,
    /// Stamped by the store on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl FavoriteMark {
    /// A mark for `snapshot`, not yet stamped.
    #[must_use]
    pub fn new(user_id: UserId, snapshot: &ProductSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            user_id,
            name: snapshot.name.clone(),
            price: snapshot.price,
            image_webp_url: snapshot.image_webp_url.clone(),
            image_fallback_url: snapshot.image_fallback_url.clone(),
            category: snapshot.category.clone(),
            added_at: None,
        }
    }

    #[must_use]
    pub fn display_price(&self) -> Price {
        Price::usd(self.price)
    }

    /// Image for the favorites card.
    #[must_use]
    pub fn image(&self) -> &str {
        [&self.image_webp_url, &self.image_fallback_url]
            .into_iter()
            .find(|s| !s.is_empty())
            .map_or(PLACEHOLDER_IMAGE, String::as_str)
    }
}
