//! Catalog products.

use chrono::{DateTime, Utc};
use ruya_core::{Price, ProductId};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

const DEFAULT_CATEGORY: &str = "Eyewear";
const DEFAULT_MATERIAL: &str = "N/A";

/// A product document from the `products` collection.
///
/// Products are read-only here. Optional fields are often missing, `null`,
/// empty or of the wrong type in stored documents. Each such field decodes
/// to its default, so a product is never dropped from a listing over one
/// bad field; the accessor methods apply the display defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    /// Document id (not stored in the document body).
    #[serde(skip)]
    pub id: ProductId,
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "lenient_price"
    )]
    pub price: Decimal,
    #[serde(deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub stock: i64,
    #[serde(deserialize_with = "lenient")]
    pub description: String,
    #[serde(deserialize_with = "lenient")]
    pub material: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub image_webp_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub image_fallback_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub gallery_images: Vec<GalleryImage>,
    #[serde(deserialize_with = "lenient")]
    pub colors: Vec<ColorVariant>,
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Additional product photo in two encodings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryImage {
    #[serde(deserialize_with = "lenient")]
    pub webp: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub fallback: Option<String>,
}

/// A color the frame is available in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorVariant {
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub hex: String,
}

/// Decode a field, falling back to its default on `null` or a type mismatch.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Prices are stored as numbers; anything else reads as zero.
fn lenient_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(rust_decimal::serde::float::deserialize(value).unwrap_or_default())
}

/// The subset of a product copied into cart lines and favorite marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Card image: webp, then fallback, then placeholder.
    pub image: String,
    pub image_webp_url: String,
    pub image_fallback_url: String,
    pub category: String,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

impl Product {
    /// Price with currency, for display.
    #[must_use]
    pub fn display_price(&self) -> Price {
        Price::usd(self.price)
    }

    /// Category label, `Eyewear` when unset.
    #[must_use]
    pub fn category_label(&self) -> &str {
        non_empty(self.category.as_ref()).unwrap_or(DEFAULT_CATEGORY)
    }

    /// Material label, `N/A` when unset.
    #[must_use]
    pub fn material_label(&self) -> &str {
        non_empty(self.material.as_ref()).unwrap_or(DEFAULT_MATERIAL)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Image used on product cards and in the cart.
    #[must_use]
    pub fn card_image(&self) -> &str {
        non_empty(self.image_webp_url.as_ref())
            .or_else(|| non_empty(self.image_fallback_url.as_ref()))
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Main image on the detail page: full-size, then webp, then fallback.
    #[must_use]
    pub fn main_image(&self) -> &str {
        non_empty(self.image_url.as_ref())
            .or_else(|| non_empty(self.image_webp_url.as_ref()))
            .or_else(|| non_empty(self.image_fallback_url.as_ref()))
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    /// Copy the fields carts and favorites keep.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            image: self.card_image().to_owned(),
            image_webp_url: non_empty(self.image_webp_url.as_ref())
                .unwrap_or_default()
                .to_owned(),
            image_fallback_url: non_empty(self.image_fallback_url.as_ref())
                .unwrap_or_default()
                .to_owned(),
            category: self.category_label().to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decodes_stored_document() {
        let product: Product = serde_json::from_value(json!({
            "name": "Aviator Classic",
            "price": 49.99,
            "category": "men",
            "stock": 3,
            "imageWebpUrl": "/img/aviator.webp",
            "galleryImages": [{"webp": "/img/a2.webp", "fallback": "/img/a2.jpg"}],
            "colors": [{"name": "Gold", "hex": "#d4af37"}],
            "createdAt": "2025-01-05T15:04:00.000Z"
        }))
        .unwrap();
        assert_eq!(product.price, Decimal::new(4999, 2));
        assert_eq!(product.gallery_images.len(), 1);
        assert_eq!(product.colors[0].name, "Gold");
        assert!(product.created_at.is_some());
        assert_eq!(product.display_price().display(), "$49.99");
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let product: Product = serde_json::from_value(json!({"name": "Plain", "price": 10})).unwrap();
        assert_eq!(product.category_label(), "Eyewear");
        assert_eq!(product.material_label(), "N/A");
        assert_eq!(product.card_image(), PLACEHOLDER_IMAGE);
        assert_eq!(product.main_image(), PLACEHOLDER_IMAGE);
        assert!(!product.in_stock());
    }

    #[test]
    fn test_null_and_mistyped_fields_fall_back() {
        let product: Product = serde_json::from_value(json!({
            "name": "Aviator",
            "price": null,
            "category": "men",
            "stock": "three",
            "description": null,
            "imageWebpUrl": null,
            "galleryImages": null,
            "colors": [{"name": null, "hex": "#000000"}],
            "createdAt": 12,
        }))
        .unwrap();
        assert_eq!(product.name, "Aviator");
        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.stock, 0);
        assert_eq!(product.description, "");
        assert_eq!(product.card_image(), PLACEHOLDER_IMAGE);
        assert!(product.gallery_images.is_empty());
        assert_eq!(product.colors[0].name, "");
        assert_eq!(product.colors[0].hex, "#000000");
        assert!(product.created_at.is_none());
    }

    #[test]
    fn test_image_chains() {
        let product = Product {
            image_url: Some(String::new()),
            image_webp_url: Some("/a.webp".to_owned()),
            image_fallback_url: Some("/a.jpg".to_owned()),
            ..Product::default()
        };
        assert_eq!(product.main_image(), "/a.webp");
        assert_eq!(product.card_image(), "/a.webp");

        let fallback_only = Product {
            image_fallback_url: Some("/b.jpg".to_owned()),
            ..Product::default()
        };
        assert_eq!(fallback_only.card_image(), "/b.jpg");
    }

    #[test]
    fn test_snapshot() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Round".to_owned(),
            price: Decimal::new(1250, 2),
            image_fallback_url: Some("/r.jpg".to_owned()),
            ..Product::default()
        };
        let snapshot = product.snapshot();
        assert_eq!(snapshot.id.as_str(), "p1");
        assert_eq!(snapshot.image, "/r.jpg");
        assert_eq!(snapshot.image_webp_url, "");
        assert_eq!(snapshot.category, "Eyewear");
    }
}
