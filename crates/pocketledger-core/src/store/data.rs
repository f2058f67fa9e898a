use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::api::{ApiClient, ApiError, Envelope};
use crate::cache::CacheManager;
use crate::models::{
    Category, CategoryBreakdown, CategoryInput, Statistics, Transaction, TransactionFilters,
    TransactionInput, TransactionType,
};

async fn fetch_transactions(client: &ApiClient, filters: &TransactionFilters) -> Result<Vec<Transaction>, ApiError> {
    client.get_transactions(filters).await.into_result()?.field("transactions")
}

async fn fetch_categories(client: &ApiClient, kind: Option<TransactionType>) -> Result<Vec<Category>, ApiError> {
    client.get_categories(kind).await.into_result()?.field("categories")
}

async fn fetch_statistics(client: &ApiClient, filters: &TransactionFilters) -> Result<Statistics, ApiError> {
    client.get_statistics(filters).await.into_result()?.field("statistics")
}

/// Transactions, categories and statistics of the signed-in user.
///
/// Every failure is recorded in [`DataStore::error`] and leaves previously
/// loaded data in place.
pub struct DataStore {
    client: Arc<ApiClient>,
    cache: Option<CacheManager>,
    authenticated: bool,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    statistics: Statistics,
    loading: bool,
    error: Option<String>,
}

impl DataStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            cache: None,
            authenticated: false,
            transactions: Vec::new(),
            categories: Vec::new(),
            statistics: Statistics::default(),
            loading: false,
            error: None,
        }
    }

    /// Snapshot unfiltered loads into `cache`
    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load everything when a user signs in; reset to empty when they leave.
    pub async fn on_auth_changed(&mut self, authenticated: bool) -> Result<(), ApiError> {
        self.authenticated = authenticated;
        if authenticated {
            return self.load_initial_data().await;
        }

        self.transactions.clear();
        self.categories.clear();
        self.statistics = Statistics::default();
        self.error = None;
        if let Some(ref cache) = self.cache {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "Failed to clear cache");
            }
        }
        Ok(())
    }

    /// Fetch transactions, categories and statistics concurrently. Returns the
    /// first failure after all three have settled.
    pub async fn load_initial_data(&mut self) -> Result<(), ApiError> {
        self.loading = true;
        let client = self.client.clone();
        let no_filters = TransactionFilters::default();
        let (transactions, categories, statistics) = tokio::join!(
            fetch_transactions(&client, &no_filters),
            fetch_categories(&client, None),
            fetch_statistics(&client, &no_filters),
        );
        self.loading = false;

        let results = [
            self.apply_transactions(transactions, true),
            self.apply_categories(categories, true),
            self.apply_statistics(statistics, true),
        ];
        results.into_iter().collect::<Result<(), ApiError>>()
    }

    pub async fn load_transactions(&mut self, filters: &TransactionFilters) -> Result<Vec<Transaction>, ApiError> {
        let result = fetch_transactions(&self.client, filters).await;
        self.apply_transactions(result, filters.is_empty())?;
        Ok(self.transactions.clone())
    }

    pub async fn load_categories(&mut self, kind: Option<TransactionType>) -> Result<Vec<Category>, ApiError> {
        let result = fetch_categories(&self.client, kind).await;
        self.apply_categories(result, kind.is_none())?;
        Ok(self.categories.clone())
    }

    pub async fn load_statistics(&mut self, filters: &TransactionFilters) -> Result<Statistics, ApiError> {
        let result = fetch_statistics(&self.client, filters).await;
        self.apply_statistics(result, filters.is_empty())?;
        Ok(self.statistics.clone())
    }

    /// Per-category totals for one transaction type. Not kept in the store.
    pub async fn get_category_breakdown(
        &mut self,
        kind: TransactionType,
        filters: &TransactionFilters,
    ) -> Result<CategoryBreakdown, ApiError> {
        let result = self
            .client
            .get_category_breakdown(kind, filters)
            .await
            .into_result()
            .and_then(|envelope| envelope.field("breakdown"));
        result.map_err(|e| self.fail("category breakdown", e))
    }

    /// Returns the created transaction when the server echoes it back.
    pub async fn create_transaction(&mut self, input: &TransactionInput) -> Result<Option<Transaction>, ApiError> {
        let envelope = self.client.create_transaction(input).await;
        let created = self
            .mutated(envelope)?
            .optional_field("transaction")
            .map_err(|e| self.fail("create transaction", e))?;
        self.refresh_after_transaction_change().await;
        Ok(created)
    }

    pub async fn update_transaction(&mut self, id: &str, input: &TransactionInput) -> Result<(), ApiError> {
        let envelope = self.client.update_transaction(id, input).await;
        self.mutated(envelope)?;
        self.refresh_after_transaction_change().await;
        Ok(())
    }

    pub async fn delete_transaction(&mut self, id: &str) -> Result<(), ApiError> {
        let envelope = self.client.delete_transaction(id).await;
        self.mutated(envelope)?;
        self.refresh_after_transaction_change().await;
        Ok(())
    }

    pub async fn create_category(&mut self, input: &CategoryInput) -> Result<Option<Category>, ApiError> {
        let envelope = self.client.create_category(input).await;
        let created = self
            .mutated(envelope)?
            .optional_field("category")
            .map_err(|e| self.fail("create category", e))?;
        self.refresh_categories().await;
        Ok(created)
    }

    pub async fn update_category(&mut self, id: &str, input: &CategoryInput) -> Result<(), ApiError> {
        let envelope = self.client.update_category(id, input).await;
        self.mutated(envelope)?;
        self.refresh_categories().await;
        Ok(())
    }

    pub async fn delete_category(&mut self, id: &str) -> Result<(), ApiError> {
        let envelope = self.client.delete_category(id).await;
        self.mutated(envelope)?;
        self.refresh_categories().await;
        Ok(())
    }

    /// Reload everything, if a user is signed in
    pub async fn refresh_data(&mut self) -> Result<(), ApiError> {
        if !self.authenticated {
            return Ok(());
        }
        self.load_initial_data().await
    }

    /// Fill empty state from the offline cache. Returns whether anything was
    /// restored.
    pub fn restore_cached(&mut self) -> bool {
        let Some(ref cache) = self.cache else {
            return false;
        };
        let mut restored = false;
        match cache.load_transactions() {
            Ok(Some(cached)) => {
                self.transactions = cached.data;
                restored = true;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable transactions cache"),
        }
        match cache.load_categories() {
            Ok(Some(cached)) => {
                self.categories = cached.data;
                restored = true;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable categories cache"),
        }
        match cache.load_statistics() {
            Ok(Some(cached)) => {
                self.statistics = cached.data;
                restored = true;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable statistics cache"),
        }
        restored
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        self.cache.as_ref()
    }

    async fn refresh_after_transaction_change(&mut self) {
        let client = self.client.clone();
        let no_filters = TransactionFilters::default();
        let (transactions, statistics) = tokio::join!(
            fetch_transactions(&client, &no_filters),
            fetch_statistics(&client, &no_filters),
        );
        // Already recorded in `error`; the mutation itself went through
        let _ = self.apply_transactions(transactions, true);
        let _ = self.apply_statistics(statistics, true);
    }

    async fn refresh_categories(&mut self) {
        let result = fetch_categories(&self.client, None).await;
        let _ = self.apply_categories(result, true);
    }

    fn mutated(&mut self, envelope: Envelope) -> Result<Envelope, ApiError> {
        envelope.into_result().map_err(|e| self.fail("save", e))
    }

    fn apply_transactions(&mut self, result: Result<Vec<Transaction>, ApiError>, snapshot: bool) -> Result<(), ApiError> {
        let transactions = result.map_err(|e| self.fail("transactions", e))?;
        debug!(count = transactions.len(), "Transactions loaded");
        if snapshot {
            if let Some(ref cache) = self.cache {
                if let Err(e) = cache.save_transactions(&transactions) {
                    warn!(error = %e, "Failed to cache transactions");
                }
            }
        }
        self.transactions = transactions;
        Ok(())
    }

    fn apply_categories(&mut self, result: Result<Vec<Category>, ApiError>, snapshot: bool) -> Result<(), ApiError> {
        let categories = result.map_err(|e| self.fail("categories", e))?;
        debug!(count = categories.len(), "Categories loaded");
        if snapshot {
            if let Some(ref cache) = self.cache {
                if let Err(e) = cache.save_categories(&categories) {
                    warn!(error = %e, "Failed to cache categories");
                }
            }
        }
        self.categories = categories;
        Ok(())
    }

    fn apply_statistics(&mut self, result: Result<Statistics, ApiError>, snapshot: bool) -> Result<(), ApiError> {
        let statistics = result.map_err(|e| self.fail("statistics", e))?;
        if snapshot {
            if let Some(ref cache) = self.cache {
                if let Err(e) = cache.save_statistics(&statistics) {
                    warn!(error = %e, "Failed to cache statistics");
                }
            }
        }
        self.statistics = statistics;
        Ok(())
    }

    fn fail(&mut self, what: &str, e: ApiError) -> ApiError {
        error!(what, error = %e, "Data request failed");
        self.error = Some(e.to_string());
        e
    }
}
