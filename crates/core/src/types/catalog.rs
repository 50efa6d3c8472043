//! Catalog browsing vocabulary: categories and sort options.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Product category as stored in the `category` field of product documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Men,
    Women,
    Kids,
}

impl Category {
    /// All categories in sidebar order.
    pub const ALL: [Self; 3] = [Self::Men, Self::Women, Self::Kids];

    /// The stored field value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
            Self::Kids => "kids",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct CategoryError(pub String);

impl FromStr for Category {
    type Err = CategoryError;

    /// Case-insensitive, so `?category=Men` links work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "men" => Ok(Self::Men),
            "women" => Ok(Self::Women),
            "kids" => Ok(Self::Kids),
            _ => Err(CategoryError(s.to_owned())),
        }
    }
}

/// Direction of an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Shop listing sort option, as selected in the "sort by" dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// Alphabetical by name.
    #[default]
    Default,
    /// Newest first.
    Newness,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
}

impl SortOption {
    /// All options in dropdown order.
    pub const ALL: [Self; 4] = [Self::Default, Self::Newness, Self::PriceAsc, Self::PriceDesc];

    /// Document field and direction this option sorts by.
    #[must_use]
    pub const fn sort_key(&self) -> (&'static str, SortDirection) {
        match self {
            Self::Default => ("name", SortDirection::Ascending),
            Self::Newness => ("createdAt", SortDirection::Descending),
            Self::PriceAsc => ("price", SortDirection::Ascending),
            Self::PriceDesc => ("price", SortDirection::Descending),
        }
    }

    /// The dropdown value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Newness => "newness",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }

    /// Human label for the dropdown.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Default => "Default sorting",
            Self::Newness => "Sort by newness",
            Self::PriceAsc => "Sort by price: low to high",
            Self::PriceDesc => "Sort by price: high to low",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`SortOption`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort option: {0}")]
pub struct SortOptionError(pub String);

impl FromStr for SortOption {
    type Err = SortOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| SortOptionError(s.to_owned()))
    }
}
