//! MongoDB driver.
//!
//! Each logical database maps to a MongoDB database of the same name. The
//! document `"id"` is stored as `_id`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cms_core::{
    Condition, DuplicateKey, Filter, Query, SortOrder, StorageDriver, UniqueIndex, ID_FIELD,
};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{Collation, CollationStrength, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde_json::Value;
use tracing::debug;

const MONGO_ID: &str = "_id";
const DUPLICATE_KEY_CODE: i32 = 11000;
const UNIQUE_INDEX_SUFFIX: &str = "_unique";

#[derive(Clone)]
pub struct MongoDriver {
    client: Client,
}

impl MongoDriver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn connect(uri: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .with_context(|| "failed to connect to MongoDB")?;
        Ok(Self::new(client))
    }

    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection::<Document>(collection)
    }
}

fn field_name(field: &str) -> &str {
    if field == ID_FIELD {
        MONGO_ID
    } else {
        field
    }
}

fn index_name(field: &str) -> String {
    format!("{field}{UNIQUE_INDEX_SUFFIX}")
}

/// Turn a duplicate key write error into [`DuplicateKey`]. The field is read
/// back from the index name in the server message.
fn write_error(err: MongoError, database: &str, collection: &str) -> anyhow::Error {
    let message = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE => {
            write.message.clone()
        }
        _ => return err.into(),
    };
    let field = message
        .split("index: ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .map(|name| name.trim_end_matches(UNIQUE_INDEX_SUFFIX).to_string())
        .unwrap_or_else(|| MONGO_ID.to_string());
    DuplicateKey {
        database: database.to_string(),
        collection: collection.to_string(),
        field,
    }
    .into()
}

fn to_document(mut value: Value) -> Result<Document> {
    if let Some(object) = value.as_object_mut() {
        if let Some(id) = object.remove(ID_FIELD) {
            object.insert(MONGO_ID.to_string(), id);
        }
    }
    bson::to_document(&value).context("document is not a JSON object")
}

fn from_document(mut document: Document) -> Value {
    if let Some(id) = document.remove(MONGO_ID) {
        document.insert(ID_FIELD, id);
    }
    Bson::Document(document).into_relaxed_extjson()
}

fn to_bson_list(values: &[Value]) -> Result<Vec<Bson>> {
    values
        .iter()
        .map(|v| bson::to_bson(v).map_err(anyhow::Error::from))
        .collect()
}

fn escape_regex(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_filter(filter: &Filter) -> Result<Document> {
    let mut clauses = Vec::with_capacity(filter.conditions.len());
    for condition in &filter.conditions {
        let clause = match condition {
            Condition::Eq { field, value } => doc! { field_name(field): bson::to_bson(value)? },
            Condition::Contains {
                field,
                needle,
                case_insensitive,
            } => {
                let options = if *case_insensitive { "i" } else { "" };
                doc! { field_name(field): { "$regex": escape_regex(needle), "$options": options } }
            }
            // `$in` on an array field matches when any element is listed.
            Condition::HasAny { field, values } | Condition::OneOf { field, values } => {
                doc! { field_name(field): { "$in": to_bson_list(values)? } }
            }
        };
        clauses.push(Bson::Document(clause));
    }

    Ok(if clauses.is_empty() {
        Document::new()
    } else {
        doc! { "$and": clauses }
    })
}

#[async_trait]
impl StorageDriver for MongoDriver {
    async fn database_names(&self) -> Result<Vec<String>> {
        Ok(self.client.list_database_names().await?)
    }

    async fn collection_names(&self, database: &str) -> Result<Vec<String>> {
        Ok(self.client.database(database).list_collection_names().await?)
    }

    async fn create_collection(&self, database: &str, collection: &str) -> Result<()> {
        debug!(database, collection, "creating collection");
        self.client
            .database(database)
            .create_collection(collection)
            .await
            .with_context(|| format!("failed to create collection '{database}.{collection}'"))?;
        Ok(())
    }

    async fn create_unique_index(&self, database: &str, collection: &str, index: &UniqueIndex) -> Result<()> {
        debug!(database, collection, field = %index.field, "creating unique index");
        let collation = index.case_insensitive.then(|| {
            Collation::builder()
                .locale("en")
                .strength(CollationStrength::Secondary)
                .build()
        });
        let options = IndexOptions::builder()
            .name(index_name(&index.field))
            .unique(true)
            .collation(collation)
            .build();
        let model = IndexModel::builder()
            .keys(doc! { field_name(&index.field): 1 })
            .options(options)
            .build();
        self.collection(database, collection)
            .create_index(model)
            .await
            .with_context(|| format!("failed to index '{database}.{collection}' on '{}'", index.field))?;
        Ok(())
    }

    async fn drop_database(&self, database: &str) -> Result<()> {
        debug!(database, "dropping database");
        self.client
            .database(database)
            .drop()
            .await
            .with_context(|| format!("failed to drop database '{database}'"))?;
        Ok(())
    }

    async fn insert(&self, database: &str, collection: &str, document: Value) -> Result<()> {
        let document = to_document(document)?;
        self.collection(database, collection)
            .insert_one(document)
            .await
            .map_err(|e| write_error(e, database, collection))?;
        Ok(())
    }

    async fn find(&self, database: &str, collection: &str, query: &Query) -> Result<Vec<Value>> {
        let mut action = self
            .collection(database, collection)
            .find(to_filter(&query.filter)?)
            .skip(query.skip);
        if let Some(sort) = &query.sort {
            let direction = match sort.order {
                SortOrder::Asc => 1,
                SortOrder::Desc => -1,
            };
            action = action.sort(doc! { field_name(&sort.field): direction });
        }
        if let Some(limit) = query.limit {
            action = action.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<Document> = action.await?.try_collect().await?;
        Ok(documents.into_iter().map(from_document).collect())
    }

    async fn count(&self, database: &str, collection: &str, filter: &Filter) -> Result<u64> {
        Ok(self
            .collection(database, collection)
            .count_documents(to_filter(filter)?)
            .await?)
    }

    async fn replace(&self, database: &str, collection: &str, id: &str, document: Value) -> Result<bool> {
        let result = self
            .collection(database, collection)
            .replace_one(doc! { MONGO_ID: id }, to_document(document)?)
            .await
            .map_err(|e| write_error(e, database, collection))?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, database: &str, collection: &str, id: &str) -> Result<bool> {
        let result = self
            .collection(database, collection)
            .delete_one(doc! { MONGO_ID: id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
