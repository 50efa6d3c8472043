//! Profile page: account details, order history and favorites.

use chrono::{DateTime, Utc};

use crate::backend::StoreError;
use crate::models::{FavoriteMark, Order, UserProfile};
use crate::services::ProfilePage;
use crate::services::profile::{
    FAVORITES_ERROR, ORDERS_ERROR, PROFILE_ERROR, REMOVE_FAVORITE_ERROR,
};

use super::money;

const NOT_AVAILABLE: &str = "N/A";

pub const NO_ORDERS: &str = "You have no past orders.";
pub const NO_FAVORITES: &str = "You have no favorite products yet.";

/// Order date like "January 5, 2025, 03:04 PM", or "N/A".
#[must_use]
pub fn format_order_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(
        || NOT_AVAILABLE.to_owned(),
        |d| d.format("%B %-d, %Y, %I:%M %p").to_string(),
    )
}

fn or_na(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() { NOT_AVAILABLE } else { value }.to_owned()
}

/// Account details block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub country: String,
}

impl From<&UserProfile> for AccountView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            first_name: or_na(&profile.first_name),
            last_name: or_na(&profile.last_name),
            email: or_na(&profile.email),
            phone: or_na(&profile.phone),
            street: or_na(&profile.address.street),
            city: or_na(&profile.address.city),
            country: or_na(&profile.address.country),
        }
    }
}

/// One line of a past order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub subtotal: String,
}

/// A past order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: String,
    pub date: String,
    pub status: String,
    pub total: String,
    pub items: Vec<OrderItemView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            date: format_order_date(order.order_date),
            status: order.status.to_string(),
            total: order.display_total().display(),
            items: order
                .items
                .iter()
                .map(|line| OrderItemView {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    subtotal: money(line.item_subtotal),
                })
                .collect(),
        }
    }
}

/// A favorites card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    pub category: String,
}

impl From<&FavoriteMark> for FavoriteView {
    fn from(mark: &FavoriteMark) -> Self {
        Self {
            id: mark.id.to_string(),
            name: mark.name.clone(),
            price: mark.display_price().display(),
            image: mark.image().to_owned(),
            category: or_na(&mark.category),
        }
    }
}

/// A page section that either has content or a message in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section<T> {
    Items(T),
    Message(&'static str),
}

/// Everything the profile page renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    /// Greeting name: first name, else the sign-in email.
    pub display_name: String,
    pub account: Section<AccountView>,
    pub orders: Section<Vec<OrderView>>,
    pub favorites: Section<Vec<FavoriteView>>,
}

impl ProfileView {
    /// Build the page from loaded sections. `email` is the sign-in email,
    /// used when the profile has no first name.
    #[must_use]
    pub fn new(page: &ProfilePage, email: &str) -> Self {
        let (display_name, account) = match &page.profile {
            Ok(Some(profile)) => (
                profile.display_name(email).to_owned(),
                Section::Items(AccountView::from(profile)),
            ),
            Ok(None) => (
                email.to_owned(),
                Section::Items(AccountView::from(&UserProfile {
                    email: email.to_owned(),
                    ..UserProfile::default()
                })),
            ),
            Err(_) => (email.to_owned(), Section::Message(PROFILE_ERROR)),
        };

        let orders = match &page.orders {
            Ok(orders) if orders.is_empty() => Section::Message(NO_ORDERS),
            Ok(orders) => Section::Items(orders.iter().map(OrderView::from).collect()),
            Err(_) => Section::Message(ORDERS_ERROR),
        };

        Self {
            display_name,
            account,
            orders,
            favorites: favorites_section(&page.favorites),
        }
    }

    /// Apply the outcome of removing a favorite. On success the list is
    /// replaced; on failure it is left as is and the alert text returned.
    pub fn apply_favorite_removal(
        &mut self,
        result: &Result<Vec<FavoriteMark>, StoreError>,
    ) -> Option<&'static str> {
        if result.is_err() {
            return Some(REMOVE_FAVORITE_ERROR);
        }
        self.favorites = favorites_section(result);
        None
    }
}

fn favorites_section(
    result: &Result<Vec<FavoriteMark>, StoreError>,
) -> Section<Vec<FavoriteView>> {
    match result {
        Ok(marks) if marks.is_empty() => Section::Message(NO_FAVORITES),
        Ok(marks) => Section::Items(marks.iter().map(FavoriteView::from).collect()),
        Err(_) => Section::Message(FAVORITES_ERROR),
    }
}
