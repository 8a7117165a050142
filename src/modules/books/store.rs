use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

use super::models::{Book, BookDocument, BookFields, BookFilter};

#[derive(Debug, Error)]
pub enum BookStoreError {
    #[error("Book {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Backend(#[from] mongodb::error::Error),
}

/// Persistence seam for the books collection.
///
/// Each operation is a single call against the backend; the backend's own
/// concurrency control is the only coordination between in-flight requests.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new record, returning it with its assigned identifier.
    async fn insert(&self, fields: BookFields) -> Result<Book, BookStoreError>;

    /// Return all records matching the equality filters; omitted filters
    /// match everything.
    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, BookStoreError>;

    /// Return the record matching `id`.
    async fn get(&self, id: &str) -> Result<Book, BookStoreError>;

    /// Replace the three fields of the record matching `id`, returning the
    /// updated record.
    async fn replace(&self, id: &str, fields: BookFields) -> Result<Book, BookStoreError>;

    /// Remove the record matching `id`, returning how many records were
    /// deleted. Unknown ids succeed with a count of 0.
    async fn remove(&self, id: &str) -> Result<u64, BookStoreError>;
}

/// MongoDB-backed store.
pub struct MongoBookStore {
    collection: Collection<BookDocument>,
}

impl MongoBookStore {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }
}

// A syntactically invalid ObjectId cannot address any stored record, so
// lookups treat it the same as an unknown id.
fn parse_object_id(id: &str) -> Result<ObjectId, BookStoreError> {
    ObjectId::parse_str(id).map_err(|_| BookStoreError::NotFound(id.to_string()))
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, fields: BookFields) -> Result<Book, BookStoreError> {
        let document = BookDocument {
            id: None,
            name: Some(fields.name.clone()),
            img: Some(fields.img.clone()),
            summary: Some(fields.summary.clone()),
        };

        let result = self.collection.insert_one(&document).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .unwrap_or_default();

        Ok(Book {
            id,
            name: document.name,
            img: document.img,
            summary: document.summary,
        })
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, BookStoreError> {
        let mut query = Document::new();
        if let Some(name) = &filter.name {
            query.insert("name", name);
        }
        if let Some(img) = &filter.img {
            query.insert("img", img);
        }
        if let Some(summary) = &filter.summary {
            query.insert("summary", summary);
        }

        let mut cursor = self.collection.find(query).await?;
        let mut books = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            books.push(document.into());
        }

        Ok(books)
    }

    async fn get(&self, id: &str) -> Result<Book, BookStoreError> {
        let oid = parse_object_id(id)?;

        self.collection
            .find_one(doc! { "_id": oid })
            .await?
            .map(Into::into)
            .ok_or_else(|| BookStoreError::NotFound(id.to_string()))
    }

    async fn replace(&self, id: &str, fields: BookFields) -> Result<Book, BookStoreError> {
        let oid = parse_object_id(id)?;

        self.collection
            .find_one_and_update(
                doc! { "_id": oid },
                doc! { "$set": {
                    "name": &fields.name,
                    "img": &fields.img,
                    "summary": &fields.summary,
                }},
            )
            .return_document(ReturnDocument::After)
            .await?
            .map(Into::into)
            .ok_or_else(|| BookStoreError::NotFound(id.to_string()))
    }

    async fn remove(&self, id: &str) -> Result<u64, BookStoreError> {
        // Deleting an unaddressable id is a successful no-op.
        let oid = match ObjectId::parse_str(id) {
            Ok(oid) => oid,
            Err(_) => return Ok(0),
        };

        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count)
    }
}

/// In-memory store mirroring the MongoDB semantics, used by tests.
pub struct InMemoryBookStore {
    books: RwLock<HashMap<String, BookFields>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    fn matches(fields: &BookFields, filter: &BookFilter) -> bool {
        filter.name.as_ref().map_or(true, |name| *name == fields.name)
            && filter.img.as_ref().map_or(true, |img| *img == fields.img)
            && filter
                .summary
                .as_ref()
                .map_or(true, |summary| *summary == fields.summary)
    }

    fn to_book(id: &str, fields: &BookFields) -> Book {
        Book {
            id: id.to_string(),
            name: Some(fields.name.clone()),
            img: Some(fields.img.clone()),
            summary: Some(fields.summary.clone()),
        }
    }
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, fields: BookFields) -> Result<Book, BookStoreError> {
        let id = ObjectId::new().to_hex();
        let book = Self::to_book(&id, &fields);

        let mut books = self.books.write().expect("book store lock poisoned");
        books.insert(id, fields);

        Ok(book)
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, BookStoreError> {
        let books = self.books.read().expect("book store lock poisoned");

        let mut matching: Vec<Book> = books
            .iter()
            .filter(|(_, fields)| Self::matches(fields, filter))
            .map(|(id, fields)| Self::to_book(id, fields))
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(matching)
    }

    async fn get(&self, id: &str) -> Result<Book, BookStoreError> {
        let books = self.books.read().expect("book store lock poisoned");

        books
            .get(id)
            .map(|fields| Self::to_book(id, fields))
            .ok_or_else(|| BookStoreError::NotFound(id.to_string()))
    }

    async fn replace(&self, id: &str, fields: BookFields) -> Result<Book, BookStoreError> {
        let mut books = self.books.write().expect("book store lock poisoned");

        match books.get_mut(id) {
            Some(existing) => {
                *existing = fields;
                Ok(Self::to_book(id, existing))
            }
            None => Err(BookStoreError::NotFound(id.to_string())),
        }
    }

    async fn remove(&self, id: &str) -> Result<u64, BookStoreError> {
        let mut books = self.books.write().expect("book store lock poisoned");
        Ok(books.remove(id).map(|_| 1).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, img: &str, summary: &str) -> BookFields {
        BookFields {
            name: name.to_string(),
            img: img.to_string(),
            summary: summary.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let store = InMemoryBookStore::new();

        let first = store.insert(fields("Dune", "dune.jpg", "Desert")).await.unwrap();
        let second = store.insert(fields("Dune", "dune.jpg", "Desert")).await.unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn get_round_trips_inserted_fields() {
        let store = InMemoryBookStore::new();
        let created = store
            .insert(fields("Dune", "dune.jpg", "Desert planet saga"))
            .await
            .unwrap();

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let store = InMemoryBookStore::new();
        let err = store.get(&ObjectId::new().to_hex()).await.unwrap_err();
        assert!(matches!(err, BookStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn replace_updates_all_fields() {
        let store = InMemoryBookStore::new();
        let created = store.insert(fields("Dune", "dune.jpg", "Old")).await.unwrap();

        let updated = store
            .replace(&created.id, fields("Dune", "dune.jpg", "New"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.summary.as_deref(), Some("New"));
        assert_eq!(store.get(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn replace_unknown_id_is_not_found() {
        let store = InMemoryBookStore::new();
        let err = store
            .replace(&ObjectId::new().to_hex(), fields("a", "b", "c"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = InMemoryBookStore::new();
        let created = store.insert(fields("Dune", "dune.jpg", "Desert")).await.unwrap();

        assert_eq!(store.remove(&created.id).await.unwrap(), 1);
        assert_eq!(store.remove(&created.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_applies_equality_filters() {
        let store = InMemoryBookStore::new();
        store.insert(fields("Dune", "dune.jpg", "Desert")).await.unwrap();
        store.insert(fields("Dune", "other.jpg", "Desert")).await.unwrap();
        store.insert(fields("Hyperion", "hyperion.jpg", "Pilgrims")).await.unwrap();

        let all = store.list(&BookFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let by_name = store
            .list(&BookFilter {
                name: Some("Dune".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 2);

        let by_name_and_img = store
            .list(&BookFilter {
                name: Some("Dune".to_string()),
                img: Some("other.jpg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name_and_img.len(), 1);

        let no_match = store
            .list(&BookFilter {
                name: Some("Foundation".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(no_match.is_empty());
    }
}
