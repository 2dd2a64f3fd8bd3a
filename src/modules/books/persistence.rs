//! Catalog document codec: a pretty-printed JSON array of books.

use std::collections::HashSet;

use super::error::CatalogError;
use super::models::Book;
use super::validation::check_stored;

/// Serialize the collection with two-space indentation and a trailing newline.
pub fn encode(books: &[Book]) -> Result<Vec<u8>, CatalogError> {
    let mut bytes = serde_json::to_vec_pretty(books)
        .map_err(|e| CatalogError::Storage(format!("failed to serialize catalog: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse a persisted collection. Anything that is not a valid collection is an
/// error; an unreadable document never decodes to an empty catalog.
pub fn decode(bytes: &[u8]) -> Result<Vec<Book>, CatalogError> {
    let mut books: Vec<Book> = serde_json::from_slice(bytes)
        .map_err(|e| CatalogError::Storage(format!("malformed catalog document: {e}")))?;

    for book in &mut books {
        check_stored(book).map_err(|e| {
            CatalogError::Storage(format!(
                "book '{}' has invalid {}: {}",
                book.id, e.field, e.reason
            ))
        })?;
    }

    let mut seen = HashSet::with_capacity(books.len());
    for (index, book) in books.iter().enumerate() {
        if !seen.insert(book.id.as_str()) {
            return Err(CatalogError::Storage(format!(
                "duplicate book id '{}' at position {index}",
                book.id
            )));
        }
    }

    Ok(books)
}
