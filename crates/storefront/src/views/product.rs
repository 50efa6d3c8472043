//! Product detail page.

use crate::models::{PLACEHOLDER_IMAGE, Product};

/// Color swatch display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwatchView {
    pub name: String,
    pub hex: String,
    pub active: bool,
}

/// Product detail display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetailView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub category: String,
    pub material: String,
    /// "In Stock (N left)" or "Out of Stock".
    pub stock_label: String,
    /// Add-to-cart and quantity input are disabled when false.
    pub can_add_to_cart: bool,
    pub main_image: String,
    /// Main image first, then the gallery.
    pub thumbnails: Vec<String>,
    /// First color is selected.
    pub colors: Vec<SwatchView>,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let main_image = product.main_image().to_owned();
        let gallery = product.gallery_images.iter().map(|image| {
            [image.fallback.as_deref(), image.webp.as_deref()]
                .into_iter()
                .flatten()
                .find(|s| !s.is_empty())
                .unwrap_or(main_image.as_str())
                .to_owned()
        });
        let thumbnails = std::iter::once(main_image.clone()).chain(gallery).collect();

        let stock_label = if product.in_stock() {
            format!("In Stock ({} left)", product.stock)
        } else {
            "Out of Stock".to_owned()
        };

        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.display_price().display(),
            description: product.description.clone(),
            category: product.category_label().to_owned(),
            material: product.material_label().to_owned(),
            stock_label,
            can_add_to_cart: product.in_stock(),
            main_image,
            thumbnails,
            colors: product
                .colors
                .iter()
                .enumerate()
                .map(|(i, color)| SwatchView {
                    name: color.name.clone(),
                    hex: color.hex.clone(),
                    active: i == 0,
                })
                .collect(),
        }
    }
}

impl ProductDetailView {
    /// Whether the product has only the placeholder image.
    #[must_use]
    pub fn has_placeholder_image(&self) -> bool {
        self.main_image == PLACEHOLDER_IMAGE
    }
}
