//! Catalog and cart state store.
//!
//! The heart of the client: holds the book-list cache, the active query,
//! and the cart, and keeps them consistent with server-confirmed state.
//! All state lives in a watch channel, every mutation is a typed action
//! applied by a reducer, and every published snapshot is observable by the
//! presentation layer.
//!
//! # Consistency model
//!
//! Mutations are serialized through the watch sender, but two in-flight
//! requests against the same item resolve last-write-wins; there is no
//! request queue or cancellation. Failures are terminal for that call and
//! must be re-triggered by the user. Reads degrade to empty state rather
//! than leaving stale data behind.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use paperback_core::{
    Book, BookId, BookQuery, Cart, CartItem, CartItemId, FilterPatch, Order, SortKey,
};

use crate::api::{ApiClient, ApiError};
use crate::error::ShopError;
use crate::session::{Session, SessionStore};

/// How long free-text input must stay idle before a search request is sent.
const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Snapshot of catalog and cart state.
#[derive(Debug, Clone, Default)]
pub struct ShopState {
    /// Current book-list results, in server order.
    pub books: Vec<Book>,
    /// `None` when anonymous or after a failed cart read; the empty shell
    /// (`Cart::empty()`) when the server has no cart yet.
    pub cart: Option<Cart>,
    /// True while a book-list request is in flight.
    pub loading: bool,
    /// The active search/filter/sort query.
    pub query: BookQuery,
}

// =============================================================================
// Reducer
// =============================================================================

/// State transitions. Every mutation of `ShopState` goes through
/// [`apply`], never through ad hoc field pokes.
#[derive(Debug)]
enum Action {
    SetLoading(bool),
    SetBooks(Vec<Book>),
    SetCart(Option<Cart>),
    SetSearch(String),
    MergeFilters(FilterPatch),
    SetSort(SortKey),
    /// Splice in the server's version of one item, matched by id.
    ReplaceItem(CartItem),
    RemoveItem(CartItemId),
    /// Empty the item collection in place, keeping the cart id.
    ClearItems,
}

fn apply(state: &mut ShopState, action: Action) {
    match action {
        Action::SetLoading(loading) => state.loading = loading,
        Action::SetBooks(books) => state.books = books,
        Action::SetCart(cart) => state.cart = cart,
        Action::SetSearch(text) => state.query.search = text,
        Action::MergeFilters(patch) => state.query.filters.merge(patch),
        Action::SetSort(sort) => state.query.sort = sort,
        Action::ReplaceItem(item) => {
            if let Some(cart) = &mut state.cart
                && let Some(slot) = cart.items.iter_mut().find(|existing| existing.id == item.id)
            {
                *slot = item;
            }
        }
        Action::RemoveItem(id) => {
            if let Some(cart) = &mut state.cart {
                cart.items.retain(|item| item.id != id);
            }
        }
        Action::ClearItems => {
            if let Some(cart) = &mut state.cart {
                cart.items.clear();
            }
        }
    }
}

// =============================================================================
// ShopStore
// =============================================================================

/// Store owning catalog and cart state.
///
/// Clones share state. Construction subscribes to session transitions:
/// gaining a session loads the cart, losing one clears it locally without
/// a network call.
#[derive(Clone)]
pub struct ShopStore {
    inner: Arc<ShopStoreInner>,
}

struct ShopStoreInner {
    api: ApiClient,
    session: SessionStore,
    state: watch::Sender<ShopState>,
    /// The armed debounce timer, superseded on every keystroke.
    debounce: Mutex<Option<JoinHandle<()>>>,
}

impl ShopStore {
    /// Create the store and subscribe to session transitions.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(api: ApiClient, session: &SessionStore) -> Self {
        let (state, _) = watch::channel(ShopState::default());
        let store = Self {
            inner: Arc::new(ShopStoreInner {
                api,
                session: session.clone(),
                state,
                debounce: Mutex::new(None),
            }),
        };
        store.spawn_session_listener(session.subscribe());
        store
    }

    fn spawn_session_listener(&self, mut sessions: watch::Receiver<Session>) {
        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                let session = sessions.borrow_and_update().clone();
                {
                    let Some(inner) = inner.upgrade() else { break };
                    match session {
                        Session::Authenticated(_) => {
                            if let Err(err) = inner.load_cart().await {
                                warn!(error = %err, "cart load after sign-in failed");
                            }
                        }
                        // An anonymous session has no cart; no network call.
                        Session::Anonymous => inner.dispatch(Action::SetCart(None)),
                        Session::Unchecked | Session::Checking => {}
                    }
                }
                if sessions.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> ShopState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ShopState> {
        self.inner.state.subscribe()
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Reload the book list with the current query.
    ///
    /// # Errors
    ///
    /// Returns the request error after resetting the results to empty;
    /// the failure is non-fatal for the UI (empty results, not a crash).
    pub async fn load_books(&self) -> Result<(), ShopError> {
        self.inner.load_books().await
    }

    /// Set the search text and reload with the full merged query.
    ///
    /// # Errors
    ///
    /// See [`load_books`](Self::load_books).
    pub async fn search_books(&self, text: impl Into<String>) -> Result<(), ShopError> {
        self.inner.search_books(text.into()).await
    }

    /// Debounced [`search_books`](Self::search_books) for keystroke-level
    /// input: the request goes out only after 500ms of inactivity, and each
    /// call supersedes the previous pending one.
    pub async fn search_debounced(&self, text: impl Into<String>) {
        let text = text.into();
        let inner = Arc::downgrade(&self.inner);
        let mut armed = self.inner.debounce.lock().await;
        if let Some(previous) = armed.take() {
            previous.abort();
        }
        *armed = Some(tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            let Some(inner) = inner.upgrade() else { return };
            if let Err(err) = inner.search_books(text).await {
                warn!(error = %err, "debounced search failed");
            }
        }));
    }

    /// Merge a partial filter update and reload with the full merged query.
    /// Setting a filter never erases the search text, and vice versa.
    ///
    /// # Errors
    ///
    /// See [`load_books`](Self::load_books).
    pub async fn apply_filters(&self, patch: FilterPatch) -> Result<(), ShopError> {
        self.inner.dispatch(Action::MergeFilters(patch));
        self.inner.load_books().await
    }

    /// Set the sort order and reload with the full merged query.
    ///
    /// # Errors
    ///
    /// See [`load_books`](Self::load_books).
    pub async fn sort_books(&self, sort: SortKey) -> Result<(), ShopError> {
        self.inner.dispatch(Action::SetSort(sort));
        self.inner.load_books().await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the cart from the server.
    ///
    /// No-op (cart stays `None`) when the session is anonymous. A NotFound
    /// answer synthesizes the empty shell: "no cart yet" is a valid state.
    ///
    /// # Errors
    ///
    /// Any other failure nulls the cart and is returned.
    pub async fn load_cart(&self) -> Result<(), ShopError> {
        self.inner.load_cart().await
    }

    /// Add a book to the cart, then re-fetch the whole cart so local state
    /// matches the server's totals and stock clamps.
    ///
    /// # Errors
    ///
    /// Fails fast with `Unauthenticated` or `InvalidQuantity` before any
    /// network call.
    pub async fn add_to_cart(&self, book_id: BookId, quantity: u32) -> Result<(), ShopError> {
        self.inner.add_to_cart(book_id, quantity).await
    }

    /// Set a cart item's quantity. On success only the matching item is
    /// replaced, using the server's returned item.
    ///
    /// # Errors
    ///
    /// Fails fast with `InvalidQuantity` for a zero quantity; removal is
    /// the only way to eliminate an item.
    pub async fn update_cart_item(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), ShopError> {
        self.inner.update_cart_item(item_id, quantity).await
    }

    /// Remove a cart item. On success the matching item is dropped from
    /// local state.
    ///
    /// # Errors
    ///
    /// Returns the API error; local state is untouched on failure.
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<(), ShopError> {
        self.inner.remove_cart_item(item_id).await
    }

    /// Empty the cart. On success the item collection is cleared in place,
    /// preserving the cart identifier.
    ///
    /// # Errors
    ///
    /// Returns the API error; local state is untouched on failure.
    pub async fn clear_cart(&self) -> Result<(), ShopError> {
        self.inner.clear_cart().await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order from the current cart.
    ///
    /// On success the local cart is emptied; on failure it is untouched so
    /// the user can retry.
    ///
    /// # Errors
    ///
    /// Fails fast with `EmptyCart` before any network call when there is
    /// nothing to order.
    pub async fn checkout(&self) -> Result<Order, ShopError> {
        self.inner.checkout().await
    }

    /// List the current user's orders.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn orders(&self) -> Result<Vec<Order>, ShopError> {
        self.inner.orders().await
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// Fails fast with `OrderClosed` for delivered or cancelled orders;
    /// the server is never asked.
    pub async fn cancel_order(&self, order: &Order) -> Result<Order, ShopError> {
        self.inner.cancel_order(order).await
    }
}

impl ShopStoreInner {
    fn dispatch(&self, action: Action) {
        self.state.send_modify(|state| apply(state, action));
    }

    fn snapshot(&self) -> ShopState {
        self.state.borrow().clone()
    }

    #[instrument(skip(self))]
    async fn load_books(&self) -> Result<(), ShopError> {
        self.dispatch(Action::SetLoading(true));
        let query = self.snapshot().query;
        let result = self.api.list_books(&query).await;
        self.dispatch(Action::SetLoading(false));
        match result {
            Ok(books) => {
                debug!(count = books.len(), "book list refreshed");
                self.dispatch(Action::SetBooks(books));
                Ok(())
            }
            Err(err) => {
                // Empty results, never stale ones.
                warn!(error = %err, "book list request failed");
                self.dispatch(Action::SetBooks(Vec::new()));
                Err(err.into())
            }
        }
    }

    async fn search_books(&self, text: String) -> Result<(), ShopError> {
        self.dispatch(Action::SetSearch(text));
        self.load_books().await
    }

    #[instrument(skip(self))]
    async fn load_cart(&self) -> Result<(), ShopError> {
        if !self.session.current().is_authenticated() {
            self.dispatch(Action::SetCart(None));
            return Ok(());
        }
        match self.api.get_cart().await {
            Ok(cart) => {
                self.dispatch(Action::SetCart(Some(cart)));
                Ok(())
            }
            // "No cart yet" is a valid empty state, not a failure.
            Err(ApiError::NotFound) => {
                debug!("no server cart yet, synthesizing empty shell");
                self.dispatch(Action::SetCart(Some(Cart::empty())));
                Ok(())
            }
            Err(err) => {
                self.dispatch(Action::SetCart(None));
                Err(err.into())
            }
        }
    }

    async fn add_to_cart(&self, book_id: BookId, quantity: u32) -> Result<(), ShopError> {
        if !self.session.current().is_authenticated() {
            return Err(ShopError::Unauthenticated);
        }
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        self.api.add_cart_item(book_id, quantity).await?;
        // Re-fetch over patch: server-computed totals win over a local splice.
        self.load_cart().await
    }

    async fn update_cart_item(&self, item_id: CartItemId, quantity: u32) -> Result<(), ShopError> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        let item = self.api.update_cart_item(item_id, quantity).await?;
        self.dispatch(Action::ReplaceItem(item));
        Ok(())
    }

    async fn remove_cart_item(&self, item_id: CartItemId) -> Result<(), ShopError> {
        self.api.remove_cart_item(item_id).await?;
        self.dispatch(Action::RemoveItem(item_id));
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), ShopError> {
        self.api.clear_cart().await?;
        self.dispatch(Action::ClearItems);
        Ok(())
    }

    async fn checkout(&self) -> Result<Order, ShopError> {
        let has_items = self
            .snapshot()
            .cart
            .is_some_and(|cart| !cart.is_empty());
        if !has_items {
            return Err(ShopError::EmptyCart);
        }
        let order = self.api.create_order().await?;
        self.dispatch(Action::ClearItems);
        Ok(order)
    }

    async fn orders(&self) -> Result<Vec<Order>, ShopError> {
        Ok(self.api.list_orders().await?)
    }

    async fn cancel_order(&self, order: &Order) -> Result<Order, ShopError> {
        if order.status.is_terminal() {
            return Err(ShopError::OrderClosed(order.status));
        }
        Ok(self.api.cancel_order(order.id).await?)
    }
}
