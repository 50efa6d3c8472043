//! Per-user favorite marks.

use std::collections::BTreeSet;
use std::sync::Arc;

use ruya_core::{ProductId, UserId};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::backend::{AuthUser, DocumentStore, Query, StoreError, document, server_timestamp};
use crate::error::add_breadcrumb;
use crate::models::{FavoriteMark, ProductSnapshot, favorites};

/// Errors from favorite operations.
#[derive(Debug, Error)]
pub enum FavoriteError {
    /// Favoriting needs a signed-in user.
    #[error("sign-in required to favorite products")]
    SignInRequired,

    /// The document store call failed.
    #[error("favorite update failed: {0}")]
    Store(#[from] StoreError),
}

impl FavoriteError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::SignInRequired => "Please log in to add items to your favorites.".to_owned(),
            Self::Store(_) => "Failed to update favorites. Please try again.".to_owned(),
        }
    }
}

/// Outcome of [`FavoritesController::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Favorited,
    Unfavorited,
}

/// Favorite toggling plus the signed-in user's favorited product ids, used to
/// mark heart icons on product cards.
pub struct FavoritesController {
    store: Arc<dyn DocumentStore>,
    owner: Option<UserId>,
    favorited: BTreeSet<ProductId>,
}

impl std::fmt::Debug for FavoritesController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesController")
            .field("owner", &self.owner)
            .field("favorited", &self.favorited.len())
            .finish_non_exhaustive()
    }
}

impl FavoritesController {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            owner: None,
            favorited: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn is_favorited(&self, id: &ProductId) -> bool {
        self.favorited.contains(id)
    }

    /// Favorited product ids of the current user.
    #[must_use]
    pub const fn favorited(&self) -> &BTreeSet<ProductId> {
        &self.favorited
    }

    /// Reload the favorited set for a session change. Signing out clears it
    /// without a remote call.
    ///
    /// # Errors
    ///
    /// Returns `FavoriteError::Store` if the marks cannot be listed; the
    /// previous set is kept.
    #[instrument(skip(self, user), fields(uid = user.map(|u| u.uid.as_str())))]
    pub async fn refresh(&mut self, user: Option<&AuthUser>) -> Result<(), FavoriteError> {
        let Some(user) = user else {
            self.clear();
            return Ok(());
        };

        let snapshots = self.store.query(&Query::new(favorites(&user.uid))).await?;
        self.favorited = snapshots
            .into_iter()
            .map(|s| ProductId::new(s.id))
            .collect();
        self.owner = Some(user.uid.clone());
        debug!(count = self.favorited.len(), "Favorites loaded");
        Ok(())
    }

    /// Forget the favorited set (sign-out).
    pub fn clear(&mut self) {
        self.owner = None;
        self.favorited.clear();
    }

    /// Flip the favorite mark for a product.
    ///
    /// # Errors
    ///
    /// Returns `FavoriteError::SignInRequired` without any remote call when
    /// nobody is signed in, or `FavoriteError::Store` if reading or writing
    /// the mark fails.
    #[instrument(skip(self, user, snapshot), fields(product_id = %snapshot.id))]
    pub async fn toggle(
        &mut self,
        user: Option<&AuthUser>,
        snapshot: &ProductSnapshot,
    ) -> Result<FavoriteToggle, FavoriteError> {
        let user = user.ok_or(FavoriteError::SignInRequired)?;
        if self.owner.as_ref() != Some(&user.uid) {
            self.favorited.clear();
            self.owner = Some(user.uid.clone());
        }

        let path = favorites(&user.uid).doc(snapshot.id.as_str());
        let outcome = if self.store.get(&path).await?.is_some() {
            self.store.delete(&path).await?;
            self.favorited.remove(&snapshot.id);
            FavoriteToggle::Unfavorited
        } else {
            let mark = FavoriteMark::new(user.uid.clone(), snapshot);
            let mut doc = document::to_document(&path.to_string(), &mark)?;
            doc.insert("addedAt".to_owned(), server_timestamp());
            self.store.set(&path, doc).await?;
            self.favorited.insert(snapshot.id.clone());
            FavoriteToggle::Favorited
        };

        debug!(?outcome, "Favorite toggled");
        let message = match outcome {
            FavoriteToggle::Favorited => "Added to favorites",
            FavoriteToggle::Unfavorited => "Removed from favorites",
        };
        add_breadcrumb(
            "favorites",
            message,
            Some(&[("product_id", snapshot.id.as_str())]),
        );
        Ok(outcome)
    }
}
