//! In-memory catalog backed by a single persisted blob.
//!
//! Readers take a snapshot (`Arc<Vec<Book>>`) and work on it without holding
//! any lock. Writers are serialized by `write_lock` for the whole
//! read-modify-persist sequence; the next snapshot is only published after the
//! blob save succeeded, so a failed save leaves memory exactly as it was.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use shelf_db::BlobStore;
use uuid::Uuid;

use super::error::CatalogError;
use super::models::Book;
use super::persistence;
use super::validation::{Rating, ValidatedBook};

pub struct Store {
    blob: Arc<dyn BlobStore>,
    books: RwLock<Arc<Vec<Book>>>,
    write_lock: Mutex<()>,
}

impl Store {
    /// Load the catalog from `blob`. A missing or malformed blob is fatal.
    pub fn open(blob: Arc<dyn BlobStore>) -> Result<Self, CatalogError> {
        let location = blob.describe();
        let bytes = blob.load().map_err(|e| CatalogError::Storage(e.to_string()))?;
        let books = persistence::decode(&bytes)?;

        tracing::info!(blob = %location, books = books.len(), "catalog loaded");

        Ok(Self {
            blob,
            books: RwLock::new(Arc::new(books)),
            write_lock: Mutex::new(()),
        })
    }

    /// Current collection in insertion order.
    pub fn all(&self) -> Arc<Vec<Book>> {
        self.books.read().clone()
    }

    pub fn get(&self, id: &str) -> Result<Book, CatalogError> {
        self.all()
            .iter()
            .find(|book| book.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })
    }

    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mint an id, append the book and persist.
    pub fn insert(&self, validated: ValidatedBook) -> Result<Book, CatalogError> {
        let _guard = self.write_lock.lock();
        let mut next = Vec::clone(&self.all());

        let mut id = Uuid::now_v7().to_string();
        while next.iter().any(|book| book.id == id) {
            id = Uuid::now_v7().to_string();
        }

        let book = validated.into_book(id);
        next.push(book.clone());
        self.commit(next)?;

        tracing::info!(id = %book.id, title = %book.title, genre = %book.genre, "book created");
        Ok(book)
    }

    /// Replace the rating of one book and persist.
    pub fn update_rating(&self, id: &str, rating: Rating) -> Result<Book, CatalogError> {
        let _guard = self.write_lock.lock();
        let mut next = Vec::clone(&self.all());

        let book = next
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })?;
        let previous = book.rating;
        book.rating = rating.value();
        let updated = book.clone();

        self.commit(next)?;

        tracing::info!(id = %id, previous, rating = updated.rating, "book rating updated");
        Ok(updated)
    }

    /// Persist `next` and publish it. Caller must hold `write_lock`.
    fn commit(&self, next: Vec<Book>) -> Result<(), CatalogError> {
        let bytes = persistence::encode(&next)?;
        if let Err(err) = self.blob.save(&bytes) {
            tracing::error!(blob = %self.blob.describe(), error = %err, "catalog save failed, mutation discarded");
            return Err(CatalogError::Io(err));
        }
        *self.books.write() = Arc::new(next);
        Ok(())
    }
}
