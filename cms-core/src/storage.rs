//! Persistence boundary.
//!
//! The core only needs a driver that can address a named database, manage
//! collections and run a handful of document operations. Documents are JSON
//! objects carrying their identifier under `"id"`.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::paging::Sort;

pub const ID_FIELD: &str = "id";

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { field: String, value: Value },
    /// Substring match on a string field.
    Contains {
        field: String,
        needle: String,
        case_insensitive: bool,
    },
    /// Array field holding at least one of `values`.
    HasAny { field: String, values: Vec<Value> },
    /// Scalar field equal to one of `values`.
    OneOf { field: String, values: Vec<Value> },
}

/// Conjunction of conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq(ID_FIELD, Value::String(id.to_string()))
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            field: field.into(),
            needle: needle.into(),
            case_insensitive: false,
        });
        self
    }

    pub fn contains_ignore_case(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions.push(Condition::Contains {
            field: field.into(),
            needle: needle.into(),
            case_insensitive: true,
        });
        self
    }

    pub fn has_any<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::HasAny {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn one_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions.push(Condition::OneOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn window(mut self, skip: u64, limit: u64) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }
}

/// Uniqueness constraint on one field of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndex {
    pub field: String,
    /// Values differing only in letter case collide.
    pub case_insensitive: bool,
}

impl UniqueIndex {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            case_insensitive: false,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

/// A write that would repeat a value held under a [`UniqueIndex`].
#[derive(Debug, Error)]
#[error("duplicate value for unique field '{field}' in '{database}.{collection}'")]
pub struct DuplicateKey {
    pub database: String,
    pub collection: String,
    pub field: String,
}

impl DuplicateKey {
    /// Find a `DuplicateKey` anywhere in an `anyhow` chain.
    pub fn find(err: &anyhow::Error) -> Option<&DuplicateKey> {
        err.chain().find_map(|e| e.downcast_ref::<DuplicateKey>())
    }
}

/// Storage driver consumed by the lifecycle and by repositories.
///
/// Inserting into a collection that does not exist yet creates it, as
/// document stores usually do.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Databases that currently hold at least one collection.
    async fn database_names(&self) -> Result<Vec<String>>;

    async fn database_exists(&self, database: &str) -> Result<bool> {
        Ok(self
            .database_names()
            .await?
            .iter()
            .any(|name| name == database))
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>>;

    async fn collection_exists(&self, database: &str, collection: &str) -> Result<bool> {
        Ok(self
            .collection_names(database)
            .await?
            .iter()
            .any(|name| name == collection))
    }

    /// Fails if the collection already exists.
    async fn create_collection(&self, database: &str, collection: &str) -> Result<()>;

    /// Dropping a database that does not exist succeeds.
    async fn drop_database(&self, database: &str) -> Result<()>;

    /// Declare a unique index, creating the collection if needed. Declaring
    /// the same index again succeeds.
    async fn create_unique_index(&self, database: &str, collection: &str, index: &UniqueIndex) -> Result<()>;

    /// `document` must carry a string `"id"` that is unique in the collection.
    /// Fails with [`DuplicateKey`] when a unique index already holds one of
    /// its values.
    async fn insert(&self, database: &str, collection: &str, document: Value) -> Result<()>;

    async fn find(&self, database: &str, collection: &str, query: &Query) -> Result<Vec<Value>>;

    async fn count(&self, database: &str, collection: &str, filter: &Filter) -> Result<u64>;

    /// Returns `false` when no document has that id. Fails with
    /// [`DuplicateKey`] when another document holds one of its unique values.
    async fn replace(&self, database: &str, collection: &str, id: &str, document: Value) -> Result<bool>;

    /// Returns `false` when no document has that id.
    async fn delete(&self, database: &str, collection: &str, id: &str) -> Result<bool>;
}
