use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{Context, Result};
use cms_core::{
    DatabaseRouter, Filter, Page, PageRequest, Query, Sort, SortOrder, StorageDriver, UniqueIndex,
    ID_FIELD,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A record stored in a collection, identified by its `id` field.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    fn id(&self) -> &str;
}

/// Typed access to one collection.
///
/// The target database is looked up from the router on every call, never
/// cached, so the same repository serves every tenant.
pub struct Repository<T> {
    driver: Arc<dyn StorageDriver>,
    router: Arc<dyn DatabaseRouter>,
    collection: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            router: Arc::clone(&self.router),
            collection: self.collection.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(
        driver: Arc<dyn StorageDriver>,
        router: Arc<dyn DatabaseRouter>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            router,
            collection: collection.into(),
            _record: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn database(&self) -> String {
        self.router.active_database().name().to_string()
    }

    fn decode(&self, value: Value) -> Result<T> {
        serde_json::from_value(value)
            .with_context(|| format!("malformed document in '{}'", self.collection))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.find_one(Filter::by_id(id)).await
    }

    pub async fn find_one(&self, filter: Filter) -> Result<Option<T>> {
        let query = Query::new(filter).window(0, 1);
        let found = self
            .driver
            .find(&self.database(), &self.collection, &query)
            .await?;
        found.into_iter().next().map(|v| self.decode(v)).transpose()
    }

    /// Every match, ordered by id.
    pub async fn find_all(&self, filter: Filter) -> Result<Vec<T>> {
        let query = Query::new(filter).sorted(Sort::new(ID_FIELD, SortOrder::Asc));
        self.driver
            .find(&self.database(), &self.collection, &query)
            .await?
            .into_iter()
            .map(|v| self.decode(v))
            .collect()
    }

    pub async fn find_page(&self, filter: Filter, request: &PageRequest) -> Result<Page<T>> {
        let database = self.database();
        let total = self
            .driver
            .count(&database, &self.collection, &filter)
            .await?;
        let query = Query::new(filter)
            .sorted(request.sort.clone())
            .window(request.offset(), request.page_size);
        let content = self
            .driver
            .find(&database, &self.collection, &query)
            .await?
            .into_iter()
            .map(|v| self.decode(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, request, total))
    }

    pub async fn exists(&self, filter: Filter) -> Result<bool> {
        Ok(self.count(filter).await? > 0)
    }

    pub async fn count(&self, filter: Filter) -> Result<u64> {
        self.driver
            .count(&self.database(), &self.collection, &filter)
            .await
    }

    /// Declare a unique index in the currently routed database.
    pub async fn ensure_unique(&self, index: &UniqueIndex) -> Result<()> {
        self.driver
            .create_unique_index(&self.database(), &self.collection, index)
            .await
    }

    /// Fails with [`cms_core::DuplicateKey`] when a unique index refuses it.
    pub async fn insert(&self, record: &T) -> Result<()> {
        let value = serde_json::to_value(record)?;
        self.driver
            .insert(&self.database(), &self.collection, value)
            .await
    }

    /// Replace the stored record with the same id. Returns `false` if there
    /// was none.
    pub async fn save(&self, record: &T) -> Result<bool> {
        let value = serde_json::to_value(record)?;
        self.driver
            .replace(&self.database(), &self.collection, record.id(), value)
            .await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<bool> {
        self.driver
            .delete(&self.database(), &self.collection, id)
            .await
    }
}

/// Fresh random identifier for a new record.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
