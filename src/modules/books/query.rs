//! Filtering and ordering over a catalog snapshot. Nothing here mutates its
//! input; every operation returns a new sequence.

use std::cmp::Ordering;
use std::str::FromStr;

use super::error::CatalogError;
use super::models::Book;

/// Keep books whose genre equals `genre`, ignoring case.
pub fn filter_by_genre(books: &[Book], genre: &str) -> Vec<Book> {
    let wanted = genre.to_lowercase();
    books
        .iter()
        .filter(|book| book.genre.to_lowercase() == wanted)
        .cloned()
        .collect()
}

/// Keep books rated at least `threshold`.
pub fn filter_by_min_rating(books: &[Book], threshold: f64) -> Vec<Book> {
    books
        .iter()
        .filter(|book| book.rating >= threshold)
        .cloned()
        .collect()
}

/// Parse a numeric threshold for `field`. Only finite numbers are thresholds.
pub fn parse_threshold(field: &str, raw: &str) -> Result<f64, CatalogError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CatalogError::invalid_query(format!(
            "'{field}' expects a numeric threshold, got '{raw}'"
        ))),
    }
}

/// How multiple field conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            other => Err(CatalogError::invalid_query(format!(
                "unknown combinator '{other}', expected AND or OR"
            ))),
        }
    }
}

/// A non-empty set of `field > threshold` conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    conditions: Vec<(String, f64)>,
    combinator: Combinator,
}

impl FieldFilter {
    pub fn new(
        conditions: Vec<(String, f64)>,
        combinator: Combinator,
    ) -> Result<Self, CatalogError> {
        if conditions.is_empty() {
            return Err(CatalogError::invalid_query(
                "at least one filter field is required",
            ));
        }
        Ok(Self {
            conditions,
            combinator,
        })
    }

    /// A field the book does not have fails its condition.
    pub fn matches(&self, book: &Book) -> bool {
        let passes = |(field, threshold): &(String, f64)| {
            book.numeric_field(field)
                .is_some_and(|value| value > *threshold)
        };
        match self.combinator {
            Combinator::And => self.conditions.iter().all(passes),
            Combinator::Or => self.conditions.iter().any(passes),
        }
    }

    pub fn apply(&self, books: &[Book]) -> Vec<Book> {
        books
            .iter()
            .filter(|book| self.matches(book))
            .cloned()
            .collect()
    }
}

/// Field a collection can be ordered by.
///
/// Text fields order by Unicode scalar value (plain `str` ordering, no locale
/// collation), so `"Zebra" < "apple"`. Numeric fields order numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Author,
    Genre,
    Description,
    PublicationYear,
    Rating,
    Pages,
    StockLeft,
    Price,
    Discount,
    Edition,
}

impl FromStr for SortField {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix("metadata.").unwrap_or(name);
        Ok(match name {
            "id" => SortField::Id,
            "title" => SortField::Title,
            "author" => SortField::Author,
            "genre" => SortField::Genre,
            "description" => SortField::Description,
            "publicationYear" => SortField::PublicationYear,
            "rating" => SortField::Rating,
            "pages" => SortField::Pages,
            "stockLeft" => SortField::StockLeft,
            "price" => SortField::Price,
            "discount" => SortField::Discount,
            "edition" => SortField::Edition,
            other => {
                return Err(CatalogError::invalid_query(format!(
                    "cannot sort by unknown field '{other}'"
                )))
            }
        })
    }
}

impl SortField {
    fn compare(self, a: &Book, b: &Book) -> Ordering {
        // stored numbers are finite, so only signed zeros could split here
        let numeric = |f: fn(&Book) -> f64| f(a).partial_cmp(&f(b)).unwrap_or(Ordering::Equal);
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Author => a.author.cmp(&b.author),
            SortField::Genre => a.genre.cmp(&b.genre),
            SortField::Description => a.description.cmp(&b.description),
            SortField::PublicationYear => a.publication_year.cmp(&b.publication_year),
            SortField::Rating => numeric(|book| book.rating),
            SortField::Pages => numeric(|book| book.metadata.pages),
            SortField::StockLeft => numeric(|book| book.metadata.stock_left),
            SortField::Price => numeric(|book| book.metadata.price),
            SortField::Discount => numeric(|book| book.metadata.discount),
            SortField::Edition => numeric(|book| book.metadata.edition),
        }
    }
}

/// Stable ascending sort into a new vector.
pub fn sort(books: &[Book], field: SortField) -> Vec<Book> {
    let mut sorted = books.to_vec();
    sorted.sort_by(|a, b| field.compare(a, b));
    sorted
}

/// Composite query applied left to right: genre, minimum rating, field
/// conditions, then ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    pub genre: Option<String>,
    pub min_rating: Option<f64>,
    pub fields: Option<FieldFilter>,
    pub sort: Option<SortField>,
}

impl CatalogQuery {
    pub fn run(&self, books: &[Book]) -> Vec<Book> {
        let mut result = match &self.genre {
            Some(genre) => filter_by_genre(books, genre),
            None => books.to_vec(),
        };
        if let Some(threshold) = self.min_rating {
            result = filter_by_min_rating(&result, threshold);
        }
        if let Some(fields) = &self.fields {
            result = fields.apply(&result);
        }
        if let Some(field) = self.sort {
            result = sort(&result, field);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::fixtures::{book, sample};

    fn titles(books: &[Book]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn genre_filter_ignores_case() {
        let mut books = sample();
        books.push(book("d", "D", 2010, "fantasy", 2.0));

        let expected = filter_by_genre(&books, "Fantasy");
        assert_eq!(titles(&expected), ["C", "D"]);
        assert_eq!(filter_by_genre(&books, "fantasy"), expected);
        assert_eq!(filter_by_genre(&books, "FANTASY"), expected);
        assert!(filter_by_genre(&books, "Fanta").is_empty());
    }

    #[test]
    fn min_rating_is_inclusive() {
        assert_eq!(titles(&filter_by_min_rating(&sample(), 4.0)), ["B", "C"]);
        assert_eq!(titles(&filter_by_min_rating(&sample(), 3.0)), ["A", "B", "C"]);
    }

    #[test]
    fn and_filter_uses_strict_greater_than() {
        let filter = FieldFilter::new(vec![("rating".into(), 3.0)], Combinator::And).unwrap();
        assert_eq!(titles(&filter.apply(&sample())), ["B", "C"]);
    }

    #[test]
    fn and_requires_every_condition_or_requires_one() {
        let conditions = vec![("rating".to_string(), 3.5), ("publicationYear".to_string(), 1995.0)];

        let and = FieldFilter::new(conditions.clone(), Combinator::And).unwrap();
        assert_eq!(titles(&and.apply(&sample())), ["B"]);

        let or = FieldFilter::new(conditions, Combinator::Or).unwrap();
        assert_eq!(titles(&or.apply(&sample())), ["B", "C"]);
    }

    #[test]
    fn unknown_fields_fail_without_error() {
        let and = FieldFilter::new(
            vec![("rating".into(), 0.0), ("weight".into(), 0.0)],
            Combinator::And,
        )
        .unwrap();
        assert!(and.apply(&sample()).is_empty());

        let or = FieldFilter::new(
            vec![("weight".into(), 0.0), ("rating".into(), 4.5)],
            Combinator::Or,
        )
        .unwrap();
        assert_eq!(titles(&or.apply(&sample())), ["B"]);

        let text = FieldFilter::new(vec![("title".into(), 0.0)], Combinator::And).unwrap();
        assert!(text.apply(&sample()).is_empty());
    }

    #[test]
    fn metadata_fields_are_filterable() {
        let mut books = sample();
        books[1].metadata.pages = 500.0;
        let filter = FieldFilter::new(vec![("metadata.pages".into(), 100.0)], Combinator::And).unwrap();
        assert_eq!(titles(&filter.apply(&books)), ["B"]);
    }

    #[test]
    fn empty_condition_set_is_invalid() {
        assert!(matches!(
            FieldFilter::new(Vec::new(), Combinator::Or),
            Err(CatalogError::InvalidQuery(_))
        ));
    }

    #[test]
    fn thresholds_must_be_finite_numbers() {
        assert_eq!(parse_threshold("rating", " 3.5 ").unwrap(), 3.5);
        for raw in ["NaN", "inf", "-infinity", "", "high"] {
            assert!(
                matches!(parse_threshold("rating", raw), Err(CatalogError::InvalidQuery(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn combinator_parsing() {
        assert_eq!("and".parse::<Combinator>().unwrap(), Combinator::And);
        assert_eq!(" Or ".parse::<Combinator>().unwrap(), Combinator::Or);
        assert!(matches!(
            "xor".parse::<Combinator>(),
            Err(CatalogError::InvalidQuery(_))
        ));
        assert_eq!(Combinator::default(), Combinator::And);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let sorted = sort(&sample(), SortField::PublicationYear);
        assert_eq!(titles(&sorted), ["A", "C", "B"]);

        let by_genre = sort(&sample(), SortField::Genre);
        assert_eq!(titles(&by_genre), ["C", "A", "B"]);
    }

    #[test]
    fn signed_zeros_are_equal_sort_keys() {
        let books = vec![
            book("p", "P", 2000, "x", 0.0),
            book("q", "Q", 2000, "x", -0.0),
        ];
        assert_eq!(titles(&sort(&books, SortField::Rating)), ["P", "Q"]);

        let mut books = books;
        books[0].metadata.price = -0.0;
        assert_eq!(titles(&sort(&books, SortField::Price)), ["P", "Q"]);
    }

    #[test]
    fn sort_does_not_touch_input() {
        let books = sample();
        let sorted = sort(&books, SortField::Rating);
        assert_eq!(titles(&sorted), ["A", "C", "B"]);
        assert_eq!(titles(&books), ["A", "B", "C"]);
    }

    #[test]
    fn text_sort_is_codepoint_order() {
        let books = vec![
            book("1", "apple", 2000, "x", 1.0),
            book("2", "Zebra", 2000, "x", 1.0),
            book("3", "Émile", 2000, "x", 1.0),
        ];
        assert_eq!(titles(&sort(&books, SortField::Title)), ["Zebra", "apple", "Émile"]);
    }

    #[test]
    fn sort_field_parsing() {
        assert_eq!("publicationYear".parse::<SortField>().unwrap(), SortField::PublicationYear);
        assert_eq!("metadata.price".parse::<SortField>().unwrap(), SortField::Price);
        assert!(matches!(
            "publication_year".parse::<SortField>(),
            Err(CatalogError::InvalidQuery(_))
        ));
    }

    #[test]
    fn composite_query_filters_then_sorts() {
        let mut books = sample();
        books.push(book("d", "D", 1980, "sf", 4.5));

        let query = CatalogQuery {
            genre: Some("SF".into()),
            min_rating: Some(3.5),
            fields: None,
            sort: Some(SortField::PublicationYear),
        };
        assert_eq!(titles(&query.run(&books)), ["D", "B"]);

        assert_eq!(CatalogQuery::default().run(&books), books);
    }
}
