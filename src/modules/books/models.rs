use serde::{Deserialize, Deserializer, Serialize};

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier minted by the store
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Year of first publication, 1..=9999
    pub publication_year: u16,
    pub description: String,
    /// Reader rating, 0.0..=5.0
    pub rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

/// An explicit `null` reads the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Inventory details attached to a book. All values are non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub pages: f64,
    #[serde(default)]
    pub stock_left: f64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default = "Metadata::default_edition")]
    pub edition: f64,
}

impl Metadata {
    pub(crate) fn default_edition() -> f64 {
        1.0
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            pages: 0.0,
            stock_left: 0.0,
            price: 0.0,
            discount: 0.0,
            edition: Self::default_edition(),
        }
    }
}

impl Book {
    /// Look up a numeric field by its wire name. Metadata fields answer to both
    /// `pages` and `metadata.pages`. Anything else yields `None`.
    pub fn numeric_field(&self, name: &str) -> Option<f64> {
        let name = name.strip_prefix("metadata.").unwrap_or(name);
        match name {
            "rating" => Some(self.rating),
            "publicationYear" => Some(f64::from(self.publication_year)),
            "pages" => Some(self.metadata.pages),
            "stockLeft" => Some(self.metadata.stock_left),
            "price" => Some(self.metadata.price),
            "discount" => Some(self.metadata.discount),
            "edition" => Some(self.metadata.edition),
            _ => None,
        }
    }

    pub fn summary(&self) -> BookSummary {
        BookSummary {
            title: self.title.clone(),
            publication_year: self.publication_year,
        }
    }
}

/// Title and year only, as surfaced by statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub title: String,
    pub publication_year: u16,
}

/// Request body for the rating update endpoint. The value stays untyped so
/// numeric strings can be coerced by the validator.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingUpdate {
    #[serde(default)]
    pub rating: serde_json::Value,
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_keys() {
        let book = fixtures::book("1", "Dune", 1965, "SF", 4.5);
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["publicationYear"], 1965);
        assert_eq!(value["metadata"]["stockLeft"], 0.0);
        assert_eq!(value["metadata"]["edition"], 1.0);
    }

    #[test]
    fn missing_metadata_defaults_edition_to_one() {
        let book: Book = serde_json::from_value(json!({
            "id": "1",
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "SF",
            "publicationYear": 1965,
            "description": "Spice",
            "rating": 4.5
        }))
        .unwrap();
        assert_eq!(book.metadata, Metadata::default());
    }

    #[test]
    fn null_metadata_reads_as_absent() {
        let book: Book = serde_json::from_value(json!({
            "id": "1",
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "SF",
            "publicationYear": 1965,
            "description": "Spice",
            "rating": 4.5,
            "metadata": null
        }))
        .unwrap();
        assert_eq!(book.metadata, Metadata::default());
    }

    #[test]
    fn numeric_field_lookup() {
        let mut book = fixtures::book("1", "Dune", 1965, "SF", 4.5);
        book.metadata.pages = 412.0;

        assert_eq!(book.numeric_field("rating"), Some(4.5));
        assert_eq!(book.numeric_field("publicationYear"), Some(1965.0));
        assert_eq!(book.numeric_field("pages"), Some(412.0));
        assert_eq!(book.numeric_field("metadata.pages"), Some(412.0));
        assert_eq!(book.numeric_field("title"), None);
        assert_eq!(book.numeric_field("weight"), None);
    }
}
