use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use cms_core::{
    Condition, DuplicateKey, Filter, Query, SortOrder, StorageDriver, UniqueIndex, ID_FIELD,
};
use parking_lot::RwLock;
use serde_json::Value;

#[derive(Default)]
struct Collection {
    // insertion order
    documents: Vec<Value>,
    unique: Vec<UniqueIndex>,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| doc.get(ID_FIELD).and_then(Value::as_str) == Some(id))
    }

    /// First unique index on which `document` collides with a stored
    /// document other than the one at `except`.
    fn clash(&self, document: &Value, except: Option<usize>) -> Option<&UniqueIndex> {
        self.unique.iter().find(|index| {
            let Some(wanted) = document.get(&index.field).filter(|v| !v.is_null()) else {
                return false;
            };
            self.documents
                .iter()
                .enumerate()
                .filter(|(at, _)| Some(*at) != except)
                .filter_map(|(_, doc)| doc.get(&index.field))
                .any(|held| same_key(held, wanted, index.case_insensitive))
        })
    }
}

fn same_key(a: &Value, b: &Value, case_insensitive: bool) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) if case_insensitive => {
            x.to_lowercase() == y.to_lowercase()
        }
        _ => a == b,
    }
}

// database -> collection
type Databases = HashMap<String, HashMap<String, Collection>>;

/// In-memory driver for tests and local development.
///
/// Cloning shares the underlying data. Unique indexes are checked under the
/// same write lock that stores the document.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    databases: Arc<RwLock<Databases>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

fn document_id(document: &Value) -> Result<&str> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("document is missing a string '{ID_FIELD}' field"))
}

fn duplicate(database: &str, collection: &str, index: &UniqueIndex) -> anyhow::Error {
    DuplicateKey {
        database: database.to_string(),
        collection: collection.to_string(),
        field: index.field.clone(),
    }
    .into()
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    async fn database_names(&self) -> Result<Vec<String>> {
        let databases = self.databases.read();
        let mut names: Vec<String> = databases
            .iter()
            .filter(|(_, collections)| !collections.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>> {
        let databases = self.databases.read();
        let mut names: Vec<String> = databases
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    async fn create_collection(&self, database: &str, collection: &str) -> Result<()> {
        let mut databases = self.databases.write();
        let collections = databases.entry(database.to_string()).or_default();
        if collections.contains_key(collection) {
            bail!("collection '{database}.{collection}' already exists");
        }
        collections.insert(collection.to_string(), Collection::default());
        Ok(())
    }

    async fn create_unique_index(&self, database: &str, collection: &str, index: &UniqueIndex) -> Result<()> {
        let mut databases = self.databases.write();
        let target = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        if let Some(existing) = target.unique.iter().find(|i| i.field == index.field) {
            if existing != index {
                bail!(
                    "'{database}.{collection}' already has a different unique index on '{}'",
                    index.field
                );
            }
            return Ok(());
        }

        let held: Vec<&Value> = target
            .documents
            .iter()
            .filter_map(|doc| doc.get(&index.field))
            .filter(|v| !v.is_null())
            .collect();
        for (at, value) in held.iter().enumerate() {
            if held[..at]
                .iter()
                .any(|earlier| same_key(earlier, value, index.case_insensitive))
            {
                bail!(
                    "cannot index '{database}.{collection}' on '{}': stored documents repeat {value}",
                    index.field
                );
            }
        }

        target.unique.push(index.clone());
        Ok(())
    }

    async fn drop_database(&self, database: &str) -> Result<()> {
        self.databases.write().remove(database);
        Ok(())
    }

    async fn insert(&self, database: &str, collection: &str, document: Value) -> Result<()> {
        let id = document_id(&document)?.to_string();
        let mut databases = self.databases.write();
        let target = databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        if target.position(&id).is_some() {
            bail!("duplicate id '{id}' in '{database}.{collection}'");
        }
        if let Some(index) = target.clash(&document, None) {
            return Err(duplicate(database, collection, index));
        }
        target.documents.push(document);
        Ok(())
    }

    async fn find(&self, database: &str, collection: &str, query: &Query) -> Result<Vec<Value>> {
        let databases = self.databases.read();
        let Some(source) = databases.get(database).and_then(|c| c.get(collection)) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<&Value> = source
            .documents
            .iter()
            .filter(|doc| matches_filter(doc, &query.filter))
            .collect();

        if let Some(sort) = &query.sort {
            hits.sort_by(|a, b| {
                let ordering = compare_values(a.get(&sort.field), b.get(&sort.field));
                match sort.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(hits.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn count(&self, database: &str, collection: &str, filter: &Filter) -> Result<u64> {
        let databases = self.databases.read();
        let count = databases
            .get(database)
            .and_then(|c| c.get(collection))
            .map(|source| {
                source
                    .documents
                    .iter()
                    .filter(|doc| matches_filter(doc, filter))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn replace(&self, database: &str, collection: &str, id: &str, document: Value) -> Result<bool> {
        let mut databases = self.databases.write();
        let Some(target) = databases.get_mut(database).and_then(|c| c.get_mut(collection)) else {
            return Ok(false);
        };
        let Some(at) = target.position(id) else {
            return Ok(false);
        };
        if let Some(index) = target.clash(&document, Some(at)) {
            return Err(duplicate(database, collection, index));
        }
        target.documents[at] = document;
        Ok(true)
    }

    async fn delete(&self, database: &str, collection: &str, id: &str) -> Result<bool> {
        let mut databases = self.databases.write();
        let Some(target) = databases.get_mut(database).and_then(|c| c.get_mut(collection)) else {
            return Ok(false);
        };
        let before = target.documents.len();
        target
            .documents
            .retain(|doc| doc.get(ID_FIELD).and_then(Value::as_str) != Some(id));
        Ok(target.documents.len() != before)
    }
}

fn matches_filter(document: &Value, filter: &Filter) -> bool {
    filter
        .conditions
        .iter()
        .all(|condition| matches_condition(document, condition))
}

fn matches_condition(document: &Value, condition: &Condition) -> bool {
    match condition {
        Condition::Eq { field, value } => document.get(field) == Some(value),
        Condition::Contains {
            field,
            needle,
            case_insensitive,
        } => match document.get(field).and_then(Value::as_str) {
            Some(haystack) if *case_insensitive => {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            Some(haystack) => haystack.contains(needle.as_str()),
            None => false,
        },
        Condition::HasAny { field, values } => match document.get(field) {
            Some(Value::Array(items)) => items.iter().any(|item| values.contains(item)),
            _ => false,
        },
        Condition::OneOf { field, values } => {
            document.get(field).is_some_and(|v| values.contains(v))
        }
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use cms_core::{Sort, SortOrder};
    use serde_json::json;

    use super::*;

    async fn seeded() -> MemoryDriver {
        let driver = MemoryDriver::new();
        for doc in [
            json!({"id": "1", "name": "Alice Smith", "phone": "+100", "categoryIds": ["c1"]}),
            json!({"id": "2", "name": "bob", "phone": "+200", "categoryIds": []}),
            json!({"id": "3", "name": "ALICIA", "phone": "+300", "categoryIds": ["c2", "c1"]}),
        ] {
            driver.insert("tenant_a", "contacts", doc).await.unwrap();
        }
        driver
    }

    #[tokio::test]
    async fn filters_cover_contains_and_array_membership() {
        let driver = seeded().await;

        let by_name = Query::new(Filter::new().contains_ignore_case("name", "ali"));
        let hits = driver.find("tenant_a", "contacts", &by_name).await.unwrap();
        assert_eq!(hits.len(), 2);

        let by_category = Filter::new().has_any("categoryIds", ["c2"]);
        assert_eq!(driver.count("tenant_a", "contacts", &by_category).await.unwrap(), 1);

        let by_ids = Filter::new().one_of("id", ["1", "2"]);
        assert_eq!(driver.count("tenant_a", "contacts", &by_ids).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn sort_and_window() {
        let driver = seeded().await;

        let query = Query::new(Filter::new())
            .sorted(Sort::new("phone", SortOrder::Desc))
            .window(1, 5);
        let hits = driver.find("tenant_a", "contacts", &query).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn duplicate_ids_and_collections_are_rejected() {
        let driver = seeded().await;

        assert!(driver
            .insert("tenant_a", "contacts", json!({"id": "1"}))
            .await
            .is_err());
        assert!(driver.create_collection("tenant_a", "contacts").await.is_err());
        assert!(driver.insert("tenant_a", "contacts", json!({"name": "x"})).await.is_err());
    }

    #[tokio::test]
    async fn unique_index_refuses_repeated_values() {
        let driver = seeded().await;
        let phone = UniqueIndex::new("phone");
        driver.create_unique_index("tenant_a", "contacts", &phone).await.unwrap();
        driver.create_unique_index("tenant_a", "contacts", &phone).await.unwrap();

        let err = driver
            .insert("tenant_a", "contacts", json!({"id": "4", "phone": "+100"}))
            .await
            .unwrap_err();
        assert_eq!(DuplicateKey::find(&err).unwrap().field, "phone");

        let err = driver
            .replace("tenant_a", "contacts", "2", json!({"id": "2", "phone": "+300"}))
            .await
            .unwrap_err();
        assert!(DuplicateKey::find(&err).is_some());

        // A document may keep its own value.
        assert!(driver
            .replace("tenant_a", "contacts", "2", json!({"id": "2", "name": "Bob", "phone": "+200"}))
            .await
            .unwrap());
        assert_eq!(driver.count("tenant_a", "contacts", &Filter::new()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn case_insensitive_index_folds_letter_case() {
        let driver = MemoryDriver::new();
        let name = UniqueIndex::new("categoryName").ignore_case();
        driver.create_unique_index("tenant_a", "categories", &name).await.unwrap();

        driver
            .insert("tenant_a", "categories", json!({"id": "1", "categoryName": "Family"}))
            .await
            .unwrap();
        let err = driver
            .insert("tenant_a", "categories", json!({"id": "2", "categoryName": "FAMILY"}))
            .await
            .unwrap_err();
        assert!(DuplicateKey::find(&err).is_some());

        // Indexes do not leak into other databases.
        driver
            .insert("tenant_b", "categories", json!({"id": "1", "categoryName": "Family"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn indexing_existing_duplicates_fails() {
        let driver = MemoryDriver::new();
        for id in ["1", "2"] {
            driver
                .insert("db", "tenants", json!({"id": id, "username": "bob"}))
                .await
                .unwrap();
        }
        assert!(driver
            .create_unique_index("db", "tenants", &UniqueIndex::new("username"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn databases_are_independent() {
        let driver = seeded().await;

        assert_eq!(
            driver.count("tenant_b", "contacts", &Filter::new()).await.unwrap(),
            0
        );
        driver.drop_database("tenant_a").await.unwrap();
        assert!(!driver.database_exists("tenant_a").await.unwrap());
        driver.drop_database("never_created").await.unwrap();
    }
}
