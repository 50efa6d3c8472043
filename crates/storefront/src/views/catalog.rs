//! Shop page: product grid and pagination controls.

use askama::Template;
use ruya_core::{Category, SortOption};

use crate::models::Product;
use crate::services::{CatalogPage, FavoritesController};

/// Product card display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub category: String,
    pub href: String,
    pub favorited: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, favorited: bool) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.display_price().display(),
            image: product.card_image().to_owned(),
            category: product.category_label().to_owned(),
            href: format!("product-detail.html?id={}", urlencoding::encode(product.id.as_str())),
            favorited,
        }
    }
}

/// One numbered pagination button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub active: bool,
}

/// Pagination controls. Hidden when there is at most one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub pages: Vec<PageLink>,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PaginationView {
    #[must_use]
    pub fn new(page: &CatalogPage) -> Self {
        Self {
            pages: (1..=page.total_pages)
                .map(|number| PageLink {
                    number,
                    active: number == page.page_number,
                })
                .collect(),
            has_prev: page.has_prev(),
            has_next: page.has_next(),
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.pages.len() > 1
    }
}

/// A `<select>` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Sort dropdown options with the current one selected.
#[must_use]
pub fn sort_options(current: SortOption) -> Vec<OptionView> {
    SortOption::ALL
        .into_iter()
        .map(|option| OptionView {
            value: option.as_str(),
            label: option.label(),
            selected: option == current,
        })
        .collect()
}

/// Category sidebar entries, "All" first.
#[must_use]
pub fn category_options(current: Option<Category>) -> Vec<OptionView> {
    let all = OptionView {
        value: "",
        label: "All",
        selected: current.is_none(),
    };
    std::iter::once(all)
        .chain(Category::ALL.into_iter().map(|category| OptionView {
            value: category.as_str(),
            label: match category {
                Category::Men => "Men",
                Category::Women => "Women",
                Category::Kids => "Kids",
            },
            selected: current == Some(category),
        }))
        .collect()
}

/// Shop grid with the results label.
#[derive(Template)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub results_label: String,
    pub products: Vec<ProductCardView>,
}

impl ProductGridTemplate {
    /// Grid for a catalog page, hearts filled from the favorites set.
    #[must_use]
    pub fn new(page: &CatalogPage, favorites: &FavoritesController) -> Self {
        Self {
            results_label: page.results_label(),
            products: page
                .products
                .iter()
                .map(|p| ProductCardView::new(p, favorites.is_favorited(&p.id)))
                .collect(),
        }
    }
}

/// Pagination controls.
#[derive(Template)]
#[template(path = "partials/pagination.html")]
pub struct PaginationTemplate {
    pub pagination: PaginationView,
}
