//! Schema checks for caller-supplied book data.
//!
//! Input arrives as loosely-typed JSON. Validation walks an explicit list of
//! required and optional fields, applies the metadata defaults, and yields typed
//! values the store can trust. The first failing field is reported, in the
//! order the fields are listed below.

use serde_json::{Map, Value};

use super::error::ValidationError;
use super::models::{Book, Metadata};

const TEXT_FIELDS: [&str; 4] = ["title", "author", "genre", "description"];
const MIN_YEAR: u16 = 1;
const MAX_YEAR: u16 = 9999;
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

/// A rating known to lie within `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating(f64);

impl Rating {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::new("rating", "must be a finite number"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(ValidationError::new(
                "rating",
                format!("must be between {MIN_RATING} and {MAX_RATING}"),
            ));
        }
        Ok(Self(unsigned_zero(value)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Book input that passed validation; the store turns it into a [`Book`] once
/// it has minted an id.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBook {
    title: String,
    author: String,
    genre: String,
    description: String,
    publication_year: u16,
    rating: Rating,
    metadata: Metadata,
}

impl ValidatedBook {
    pub fn into_book(self, id: String) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            publication_year: self.publication_year,
            description: self.description,
            rating: self.rating.value(),
            metadata: self.metadata,
        }
    }
}

/// Validate a create request. Any `id` in the input is ignored.
pub fn validate_for_create(input: &Value) -> Result<ValidatedBook, ValidationError> {
    let object = input
        .as_object()
        .ok_or_else(|| ValidationError::new("$", "expected a JSON object"))?;

    let [title, author, genre, description] = TEXT_FIELDS.map(|field| required_text(object, field));
    let (title, author, genre, description) = (title?, author?, genre?, description?);

    let publication_year = publication_year(object.get("publicationYear"))?;
    let rating = match object.get("rating") {
        None | Some(Value::Null) => Rating(MIN_RATING),
        Some(value) => validate_rating(value)?,
    };
    let metadata = metadata(object.get("metadata"))?;

    Ok(ValidatedBook {
        title,
        author,
        genre,
        description,
        publication_year,
        rating,
        metadata,
    })
}

/// Coerce a rating from a JSON number or numeric string.
pub fn validate_rating(value: &Value) -> Result<Rating, ValidationError> {
    let number = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ValidationError::new("rating", "is not representable as a number"))?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::new("rating", "must be a number"));
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| ValidationError::new("rating", "must be a number"))?
        }
        _ => return Err(ValidationError::new("rating", "must be a number")),
    };
    Rating::new(number)
}

fn required_text(object: &Map<String, Value>, field: &str) -> Result<String, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(field, "is required")),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(ValidationError::new(field, "must not be empty"))
            } else {
                Ok(trimmed.to_string())
            }
        }
        Some(_) => Err(ValidationError::new(field, "must be a string")),
    }
}

fn publication_year(value: Option<&Value>) -> Result<u16, ValidationError> {
    const FIELD: &str = "publicationYear";
    let number = match value {
        None | Some(Value::Null) => return Err(ValidationError::new(FIELD, "is required")),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(ValidationError::new(FIELD, "must be an integer")),
    };

    let year = match number.as_i64() {
        Some(year) => year,
        // 1990.0 is still an integer
        None => match number.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => f as i64,
            _ => return Err(ValidationError::new(FIELD, "must be an integer")),
        },
    };

    if !(i64::from(MIN_YEAR)..=i64::from(MAX_YEAR)).contains(&year) {
        return Err(ValidationError::new(
            FIELD,
            format!("must be between {MIN_YEAR} and {MAX_YEAR}"),
        ));
    }
    Ok(year as u16)
}

fn metadata(value: Option<&Value>) -> Result<Metadata, ValidationError> {
    let object = match value {
        None | Some(Value::Null) => return Ok(Metadata::default()),
        Some(Value::Object(object)) => object,
        Some(_) => return Err(ValidationError::new("metadata", "must be an object")),
    };

    let defaults = Metadata::default();
    Ok(Metadata {
        pages: non_negative(object, "pages", defaults.pages)?,
        stock_left: non_negative(object, "stockLeft", defaults.stock_left)?,
        price: non_negative(object, "price", defaults.price)?,
        discount: non_negative(object, "discount", defaults.discount)?,
        edition: non_negative(object, "edition", defaults.edition)?,
    })
}

fn non_negative(
    object: &Map<String, Value>,
    field: &str,
    default: f64,
) -> Result<f64, ValidationError> {
    let path = format!("metadata.{field}");
    match object.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) => stored_non_negative(&path, v),
            None => Err(ValidationError::new(path, "must be a non-negative number")),
        },
        Some(_) => Err(ValidationError::new(path, "must be a non-negative number")),
    }
}

fn stored_non_negative(path: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(unsigned_zero(value))
    } else {
        Err(ValidationError::new(path, "must be a non-negative number"))
    }
}

/// `-0.0 + 0.0` is `+0.0`; every other value passes through unchanged.
fn unsigned_zero(value: f64) -> f64 {
    value + 0.0
}

/// Hold a record read back from storage to the rules create enforces: non-blank
/// text, year and rating in range, finite non-negative metadata. Signed zeros
/// are normalized in place.
pub fn check_stored(book: &mut Book) -> Result<(), ValidationError> {
    let texts = [
        ("title", &book.title),
        ("author", &book.author),
        ("genre", &book.genre),
        ("description", &book.description),
    ];
    if let Some((field, _)) = texts.iter().find(|(_, text)| text.trim().is_empty()) {
        return Err(ValidationError::new(*field, "must not be empty"));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&book.publication_year) {
        return Err(ValidationError::new(
            "publicationYear",
            format!("must be between {MIN_YEAR} and {MAX_YEAR}"),
        ));
    }
    book.rating = Rating::new(book.rating)?.value();

    let metadata = &mut book.metadata;
    metadata.pages = stored_non_negative("metadata.pages", metadata.pages)?;
    metadata.stock_left = stored_non_negative("metadata.stockLeft", metadata.stock_left)?;
    metadata.price = stored_non_negative("metadata.price", metadata.price)?;
    metadata.discount = stored_non_negative("metadata.discount", metadata.discount)?;
    metadata.edition = stored_non_negative("metadata.edition", metadata.edition)?;
    Ok(())
}
