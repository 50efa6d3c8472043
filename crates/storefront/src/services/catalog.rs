//! Shop catalog: filtered, sorted, cursor-paginated product listing, plus
//! single-product lookup for the detail page.
//!
//! # Pagination
//!
//! Pages are fetched with "start after" cursors rather than offsets. The
//! controller remembers the first and last product on screen:
//!
//! - next: same ordering, start after the last visible product
//! - previous: reversed ordering, start after the first visible product,
//!   then the page is reversed back
//! - jump to page `n`: fetch page 1 and walk forward `n - 1` times
//!
//! Ties on the sort field are broken by document id in the same direction,
//! which keeps the ordering total and exactly reversible.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use ruya_core::{Category, ProductId, SortOption};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::backend::{
    Cursor, DocumentStore, FieldFilter, OrderBy, Query, Snapshot, StoreError, document,
};
use crate::models::{Product, products};

/// Products per shop page.
pub const PAGE_SIZE: usize = 9;

/// Errors from catalog queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document store call failed.
    #[error("catalog query failed: {0}")]
    Store(#[from] StoreError),

    /// No product has this id.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),
}

impl CatalogError {
    /// Message for the shop or product page.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => "Failed to load products. Please try again later.".to_owned(),
            Self::ProductNotFound(_) => "The product you are looking for does not exist.".to_owned(),
        }
    }
}

/// One page of shop results plus the numbers the pagination controls need.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    /// 1-based page number.
    pub page_number: u32,
    /// Products matching the filter.
    pub total_count: u64,
    /// `ceil(total_count / PAGE_SIZE)`, zero when nothing matches.
    pub total_pages: u32,
}

impl CatalogPage {
    /// "Showing 1-9 of 20 results", or "No results found".
    #[must_use]
    pub fn results_label(&self) -> String {
        if self.total_count == 0 {
            return "No results found".to_owned();
        }
        let page_size = PAGE_SIZE as u64;
        let page = u64::from(self.page_number);
        let first = (page_size * (page - 1) + 1).min(self.total_count);
        let last = (page_size * page).min(self.total_count);
        format!("Showing {first}-{last} of {} results", self.total_count)
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page_number > 1
    }
}

fn total_pages(total_count: u64) -> u32 {
    u32::try_from(total_count.div_ceil(PAGE_SIZE as u64)).unwrap_or(u32::MAX)
}

// =============================================================================
// CatalogController
// =============================================================================

/// How the next page is located.
#[derive(Debug, Clone)]
enum Navigation {
    /// Walk from the first page to page `n`.
    Page(u32),
    /// Forward from a cursor.
    Next { after: Cursor, page: u32 },
    /// Backward from a cursor.
    Prev { after: Cursor, page: u32 },
}

/// Result of a successful query, committed to the controller all at once.
struct Loaded {
    page: CatalogPage,
    first_visible: Option<Cursor>,
    last_visible: Option<Cursor>,
}

/// Shop listing state machine.
///
/// Owns the category filter, sort option, page number and visible cursors.
/// A failed query leaves every piece of state as it was.
pub struct CatalogController {
    store: Arc<dyn DocumentStore>,
    filter: Option<Category>,
    sort: SortOption,
    page: CatalogPage,
    first_visible: Option<Cursor>,
    last_visible: Option<Cursor>,
}

impl std::fmt::Debug for CatalogController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogController")
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("page_number", &self.page.page_number)
            .field("total_count", &self.page.total_count)
            .finish_non_exhaustive()
    }
}

impl CatalogController {
    /// A controller on page 1 with no filter and default sorting. Nothing is
    /// fetched until [`load`](Self::load).
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            filter: None,
            sort: SortOption::default(),
            page: CatalogPage {
                products: Vec::new(),
                page_number: 1,
                total_count: 0,
                total_pages: 0,
            },
            first_visible: None,
            last_visible: None,
        }
    }

    /// Start with a category filter (e.g. from a `?category=` link).
    #[must_use]
    pub const fn with_filter(mut self, filter: Option<Category>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn filter(&self) -> Option<Category> {
        self.filter
    }

    #[must_use]
    pub const fn sort(&self) -> SortOption {
        self.sort
    }

    /// The page currently displayed.
    #[must_use]
    pub const fn page(&self) -> &CatalogPage {
        &self.page
    }

    /// Fetch page 1 under the current filter and sort.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if a query fails; state is unchanged.
    #[instrument(skip(self), fields(filter = ?self.filter, sort = %self.sort))]
    pub async fn load(&mut self) -> Result<&CatalogPage, CatalogError> {
        let loaded = self.run(self.filter, self.sort, Navigation::Page(1)).await?;
        Ok(self.commit(self.filter, self.sort, loaded))
    }

    /// Change the category filter and return to page 1.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if a query fails; filter and page are unchanged.
    #[instrument(skip(self))]
    pub async fn set_filter(
        &mut self,
        filter: Option<Category>,
    ) -> Result<&CatalogPage, CatalogError> {
        let loaded = self.run(filter, self.sort, Navigation::Page(1)).await?;
        Ok(self.commit(filter, self.sort, loaded))
    }

    /// Change the sort option and return to page 1.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if a query fails; sort and page are unchanged.
    #[instrument(skip(self))]
    pub async fn set_sort(&mut self, sort: SortOption) -> Result<&CatalogPage, CatalogError> {
        let loaded = self.run(self.filter, sort, Navigation::Page(1)).await?;
        Ok(self.commit(self.filter, sort, loaded))
    }

    /// Jump to page `n`, clamped into the valid range.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if a query fails; state is unchanged.
    #[instrument(skip(self), fields(filter = ?self.filter, sort = %self.sort))]
    pub async fn go_to_page(&mut self, n: u32) -> Result<&CatalogPage, CatalogError> {
        let loaded = self.run(self.filter, self.sort, Navigation::Page(n)).await?;
        Ok(self.commit(self.filter, self.sort, loaded))
    }

    /// Advance one page. Does nothing on the last page.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if a query fails; state is unchanged.
    #[instrument(skip(self), fields(page = self.page.page_number))]
    pub async fn next(&mut self) -> Result<&CatalogPage, CatalogError> {
        let Some(after) = self.last_visible.clone().filter(|_| self.page.has_next()) else {
            debug!("Already on the last page");
            return Ok(&self.page);
        };
        let navigation = Navigation::Next {
            after,
            page: self.page.page_number + 1,
        };
        let loaded = self.run(self.filter, self.sort, navigation).await?;
        Ok(self.commit(self.filter, self.sort, loaded))
    }

    /// Go back one page. Does nothing on page 1.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if a query fails; state is unchanged.
    #[instrument(skip(self), fields(page = self.page.page_number))]
    pub async fn prev(&mut self) -> Result<&CatalogPage, CatalogError> {
        let Some(after) = self.first_visible.clone().filter(|_| self.page.has_prev()) else {
            debug!("Already on the first page");
            return Ok(&self.page);
        };
        let navigation = Navigation::Prev {
            after,
            page: self.page.page_number - 1,
        };
        let loaded = self.run(self.filter, self.sort, navigation).await?;
        Ok(self.commit(self.filter, self.sort, loaded))
    }

    fn commit(&mut self, filter: Option<Category>, sort: SortOption, loaded: Loaded) -> &CatalogPage {
        self.filter = filter;
        self.sort = sort;
        self.page = loaded.page;
        self.first_visible = loaded.first_visible;
        self.last_visible = loaded.last_visible;
        &self.page
    }

    async fn run(
        &self,
        filter: Option<Category>,
        sort: SortOption,
        navigation: Navigation,
    ) -> Result<Loaded, CatalogError> {
        let filters: Vec<FieldFilter> = filter
            .map(|c| FieldFilter::eq("category", c.as_str()))
            .into_iter()
            .collect();
        let total_count = self.store.count(&products(), &filters).await?;
        let total_pages = total_pages(total_count);

        if total_count == 0 {
            debug!("No products match");
            return Ok(Loaded {
                page: CatalogPage {
                    products: Vec::new(),
                    page_number: 1,
                    total_count,
                    total_pages,
                },
                first_visible: None,
                last_visible: None,
            });
        }

        let (field, direction) = sort.sort_key();
        let order = OrderBy::new(field, direction);
        let base = filters
            .into_iter()
            .fold(Query::new(products()), Query::filter)
            .limit(PAGE_SIZE);

        let (snapshots, page_number) = match navigation {
            Navigation::Page(n) => {
                let n = n.clamp(1, total_pages.max(1));
                let forward = base.order_by(order.clone());
                let mut snapshots = self.store.query(&forward.clone().start_after(None)).await?;
                for _ in 1..n {
                    let Some(last) = snapshots.last() else { break };
                    let after = Cursor::at(last, Some(&order));
                    snapshots = self.store.query(&forward.clone().start_after(Some(after))).await?;
                }
                (snapshots, n)
            }
            Navigation::Next { after, page } => {
                let query = base.order_by(order.clone()).start_after(Some(after));
                (self.store.query(&query).await?, page)
            }
            Navigation::Prev { after, page } => {
                let query = base.order_by(order.reversed()).start_after(Some(after));
                let mut snapshots = self.store.query(&query).await?;
                snapshots.reverse();
                (snapshots, page)
            }
        };

        let first_visible = snapshots.first().map(|s| Cursor::at(s, Some(&order)));
        let last_visible = snapshots.last().map(|s| Cursor::at(s, Some(&order)));
        let products = decode_products(&snapshots);
        debug!(
            total_count,
            page_number,
            shown = products.len(),
            "Catalog page loaded"
        );

        Ok(Loaded {
            page: CatalogPage {
                products,
                page_number,
                total_count,
                total_pages,
            },
            first_visible,
            last_visible,
        })
    }
}

fn decode_products(snapshots: &[Snapshot]) -> Vec<Product> {
    snapshots
        .iter()
        .filter_map(|snapshot| match snapshot.decode::<Product>(&products()) {
            Ok(mut product) => {
                product.id = ProductId::new(snapshot.id.clone());
                Some(product)
            }
            Err(e) => {
                warn!(error = %e, "Skipping unreadable product");
                None
            }
        })
        .collect()
}

// =============================================================================
// ProductCatalog
// =============================================================================

/// Single-product lookup for the detail page.
///
/// Products are cached for 5 minutes.
#[derive(Clone)]
pub struct ProductCatalog {
    inner: Arc<ProductCatalogInner>,
}

struct ProductCatalogInner {
    store: Arc<dyn DocumentStore>,
    cache: Cache<ProductId, Product>,
}

impl std::fmt::Debug for ProductCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductCatalog")
            .field("cached", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl ProductCatalog {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self {
            inner: Arc::new(ProductCatalogInner { store, cache }),
        }
    }

    /// Fetch a product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if there is no such product, or
    /// `CatalogError::Store` if the lookup fails or the document is unreadable.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self.inner.cache.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let path = products().doc(id.as_str());
        let doc = self
            .inner
            .store
            .get(&path)
            .await?
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))?;
        let mut product: Product = document::from_document(&path, doc)?;
        product.id = id.clone();

        self.inner.cache.insert(id.clone(), product.clone()).await;
        Ok(product)
    }

    /// Drop a cached product.
    pub async fn invalidate(&self, id: &ProductId) {
        self.inner.cache.invalidate(id).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::backend::{MemoryStore, StoreOperation};

    fn seeded(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..count {
            let category = if i % 2 == 0 { "men" } else { "women" };
            store.insert(
                &products(),
                format!("p{i:02}"),
                json!({
                    "name": format!("Frame {i:02}"),
                    "price": (i % 5) * 10,
                    "category": category,
                    "createdAt": format!("2025-01-{:02}T00:00:00.000Z", i + 1),
                })
                .as_object()
                .unwrap()
                .clone(),
            );
        }
        store
    }

    fn names(page: &CatalogPage) -> Vec<String> {
        page.products.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_results_label() {
        let page = |page_number, total_count| CatalogPage {
            products: Vec::new(),
            page_number,
            total_count,
            total_pages: total_pages(total_count),
        };
        assert_eq!(page(1, 20).results_label(), "Showing 1-9 of 20 results");
        assert_eq!(page(3, 20).results_label(), "Showing 19-20 of 20 results");
        assert_eq!(page(1, 0).results_label(), "No results found");
        assert_eq!(total_pages(18), 2);
        assert_eq!(total_pages(19), 3);
    }

    #[tokio::test]
    async fn test_load_first_page() {
        let store = Arc::new(seeded(20));
        let mut catalog = CatalogController::new(store);
        let page = catalog.load().await.unwrap();
        assert_eq!(page.total_count, 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.products.len(), 9);
        assert_eq!(page.products[0].id.as_str(), "p00");
        assert!(!page.has_prev());
    }

    #[tokio::test]
    async fn test_next_then_prev_returns_same_page() {
        let store = Arc::new(seeded(20));
        let mut catalog = CatalogController::new(store);
        catalog.set_sort(SortOption::PriceAsc).await.unwrap();
        let first = names(catalog.page());

        let second = names(catalog.next().await.unwrap());
        assert_eq!(catalog.page().page_number, 2);
        assert!(second.iter().all(|n| !first.contains(n)));

        let back = names(catalog.prev().await.unwrap());
        assert_eq!(back, first);
        assert_eq!(catalog.page().page_number, 1);
    }

    #[tokio::test]
    async fn test_newness_round_trip_within_one_millisecond() {
        let store = MemoryStore::new();
        for i in 0..12 {
            store.insert(
                &products(),
                format!("p{i:02}"),
                json!({
                    "name": format!("Frame {i:02}"),
                    "price": 10,
                    "createdAt": format!("2025-01-05T15:04:05.1234{i:02}Z"),
                })
                .as_object()
                .unwrap()
                .clone(),
            );
        }
        let mut catalog = CatalogController::new(Arc::new(store));
        let first = names(catalog.set_sort(SortOption::Newness).await.unwrap());
        assert_eq!(first[0], "Frame 11");
        assert_eq!(first[8], "Frame 03");

        let second = names(catalog.next().await.unwrap());
        assert_eq!(second, ["Frame 02", "Frame 01", "Frame 00"]);

        assert_eq!(names(catalog.prev().await.unwrap()), first);
    }

    #[tokio::test]
    async fn test_products_with_null_fields_stay_listed() {
        let store = MemoryStore::new();
        store.insert(
            &products(),
            "p1",
            json!({
                "name": "Aviator",
                "price": 10,
                "category": "men",
                "description": null,
                "stock": null,
                "colors": null,
                "galleryImages": "none",
            })
            .as_object()
            .unwrap()
            .clone(),
        );
        let mut catalog = CatalogController::new(Arc::new(store));
        let page = catalog.load().await.unwrap();
        assert_eq!(page.results_label(), "Showing 1-1 of 1 results");
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].id.as_str(), "p1");
        assert_eq!(page.products[0].description, "");
    }

    #[tokio::test]
    async fn test_boundaries_make_no_remote_calls() {
        let store = Arc::new(seeded(5));
        let mut catalog = CatalogController::new(store.clone());
        catalog.load().await.unwrap();
        store.reset_calls();

        catalog.next().await.unwrap();
        catalog.prev().await.unwrap();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_go_to_page_matches_walking() {
        let store = Arc::new(seeded(25));
        let mut walker = CatalogController::new(store.clone());
        walker.set_sort(SortOption::Newness).await.unwrap();
        walker.next().await.unwrap();
        let walked = names(walker.next().await.unwrap());

        let mut jumper = CatalogController::new(store);
        jumper.set_sort(SortOption::Newness).await.unwrap();
        let jumped = names(jumper.go_to_page(3).await.unwrap());
        assert_eq!(jumped, walked);
        assert_eq!(jumped.len(), 7);

        let clamped = jumper.go_to_page(99).await.unwrap();
        assert_eq!(clamped.page_number, 3);
        let clamped = jumper.go_to_page(0).await.unwrap();
        assert_eq!(clamped.page_number, 1);
    }

    #[tokio::test]
    async fn test_filter_resets_to_first_page() {
        let store = Arc::new(seeded(20));
        let mut catalog = CatalogController::new(store);
        catalog.load().await.unwrap();
        catalog.next().await.unwrap();

        let page = catalog.set_filter(Some(Category::Women)).await.unwrap();
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_count, 10);
        assert!(page.products.iter().all(|p| p.category.as_deref() == Some("women")));
    }

    #[tokio::test]
    async fn test_empty_results() {
        let store = Arc::new(seeded(0));
        let mut catalog = CatalogController::new(store);
        let page = catalog.set_filter(Some(Category::Kids)).await.unwrap();
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.results_label(), "No results found");
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_failure_keeps_prior_state() {
        let store = Arc::new(seeded(20));
        let mut catalog = CatalogController::new(store.clone());
        catalog.load().await.unwrap();
        let before = catalog.page().clone();

        store.fail(StoreOperation::Query);
        assert!(catalog.set_filter(Some(Category::Men)).await.is_err());
        assert!(catalog.next().await.is_err());
        assert_eq!(catalog.filter(), None);
        assert_eq!(catalog.page(), &before);

        store.heal();
        assert_eq!(catalog.next().await.unwrap().page_number, 2);
    }

    #[tokio::test]
    async fn test_product_lookup_is_cached() {
        let store = Arc::new(seeded(3));
        let catalog = ProductCatalog::new(store.clone());
        let product = catalog.product(&ProductId::new("p01")).await.unwrap();
        assert_eq!(product.name, "Frame 01");

        store.fail(StoreOperation::Get);
        assert!(catalog.product(&ProductId::new("p01")).await.is_ok());

        store.heal();
        assert!(matches!(
            catalog.product(&ProductId::new("missing")).await,
            Err(CatalogError::ProductNotFound(_))
        ));
    }
}
