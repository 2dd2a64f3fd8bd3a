use std::collections::BTreeMap;

use serde::Serialize;

use super::models::{Book, BookSummary};

pub const EMPTY_MESSAGE: &str = "No books available";

/// Aggregates over a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statistics {
    Empty { message: String },
    Summary(CatalogStats),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    /// Mean rating per genre (exact genre text), rounded to two decimals.
    pub average_rating_by_genre: BTreeMap<String, f64>,
    pub oldest_book: BookSummary,
    pub newest_book: BookSummary,
}

pub fn compute_statistics(books: &[Book]) -> Statistics {
    let Some(first) = books.first() else {
        return Statistics::Empty {
            message: EMPTY_MESSAGE.to_string(),
        };
    };

    let mut totals: BTreeMap<&str, (f64, u32)> = BTreeMap::new();
    for book in books {
        let entry = totals.entry(book.genre.as_str()).or_default();
        entry.0 += book.rating;
        entry.1 += 1;
    }
    let average_rating_by_genre = totals
        .into_iter()
        .map(|(genre, (total, count))| (genre.to_string(), round2(total / f64::from(count))))
        .collect();

    // strict comparisons: the earliest record wins ties
    let oldest = books.iter().fold(first, |oldest, book| {
        if book.publication_year < oldest.publication_year {
            book
        } else {
            oldest
        }
    });
    let newest = books.iter().fold(first, |newest, book| {
        if book.publication_year > newest.publication_year {
            book
        } else {
            newest
        }
    });

    Statistics::Summary(CatalogStats {
        average_rating_by_genre,
        oldest_book: oldest.summary(),
        newest_book: newest.summary(),
    })
}

/// Two decimals, halves rounded away from zero.
///
/// The rule applies to the shortest decimal text that reads back as `value`
/// (`1.005` rounds to `1.01`), not to the binary expansion, where scaling by 100
/// would push some halves down and others up.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let text = value.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    if fraction.len() <= 2 {
        return value;
    }
    let (Ok(whole), Ok(cents)) = (whole.parse::<u64>(), fraction[..2].parse::<u64>()) else {
        return value;
    };

    let mut cents = whole * 100 + cents;
    if fraction.as_bytes()[2] >= b'5' {
        cents += 1;
    }
    let rounded = cents as f64 / 100.0;
    if value.is_sign_negative() && cents != 0 {
        -rounded
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::fixtures::{book, sample};
    use serde_json::json;

    fn summary(stats: Statistics) -> CatalogStats {
        match stats {
            Statistics::Summary(stats) => stats,
            Statistics::Empty { .. } => panic!("expected a summary"),
        }
    }

    #[test]
    fn empty_collection_yields_notice() {
        let stats = compute_statistics(&[]);
        assert_eq!(
            stats,
            Statistics::Empty {
                message: EMPTY_MESSAGE.to_string()
            }
        );
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({ "message": "No books available" })
        );
    }

    #[test]
    fn sample_collection_statistics() {
        let stats = summary(compute_statistics(&sample()));

        assert_eq!(stats.average_rating_by_genre.len(), 2);
        assert_eq!(stats.average_rating_by_genre["SF"], 4.00);
        assert_eq!(stats.average_rating_by_genre["Fantasy"], 4.00);
        assert_eq!(
            stats.oldest_book,
            BookSummary {
                title: "A".into(),
                publication_year: 1990
            }
        );
        assert_eq!(
            stats.newest_book,
            BookSummary {
                title: "B".into(),
                publication_year: 2000
            }
        );
    }

    #[test]
    fn newest_tie_goes_to_first_record() {
        let books = vec![
            book("1", "First", 2020, "x", 1.0),
            book("2", "Second", 2020, "x", 1.0),
            book("3", "Old", 1900, "x", 1.0),
        ];
        let stats = summary(compute_statistics(&books));
        assert_eq!(stats.newest_book.title, "First");
        assert_eq!(stats.oldest_book.title, "Old");
    }

    #[test]
    fn averages_round_to_two_decimals() {
        let books = vec![
            book("1", "a", 2000, "Poetry", 1.0),
            book("2", "b", 2000, "Poetry", 2.0),
            book("3", "c", 2000, "Poetry", 2.0),
            book("4", "d", 2000, "Drama", 4.125),
        ];
        let stats = summary(compute_statistics(&books));
        assert_eq!(stats.average_rating_by_genre["Poetry"], 1.67);
        // 412.5 is exact in binary, so this exercises the half case
        assert_eq!(stats.average_rating_by_genre["Drama"], 4.13);
    }

    #[test]
    fn genre_keys_keep_their_case() {
        let books = vec![
            book("1", "a", 2000, "SF", 2.0),
            book("2", "b", 2000, "sf", 4.0),
        ];
        let stats = summary(compute_statistics(&books));
        assert_eq!(stats.average_rating_by_genre["SF"], 2.0);
        assert_eq!(stats.average_rating_by_genre["sf"], 4.0);
    }

    #[test]
    fn serializes_in_camel_case() {
        let value = serde_json::to_value(compute_statistics(&sample())).unwrap();
        assert_eq!(value["averageRatingByGenre"]["SF"], 4.0);
        assert_eq!(
            value["oldestBook"],
            json!({ "title": "A", "publicationYear": 1990 })
        );
        assert_eq!(
            value["newestBook"],
            json!({ "title": "B", "publicationYear": 2000 })
        );
    }

    #[test]
    fn round2_halves_away_from_zero() {
        assert_eq!(round2(2.125), 2.13);
        assert_eq!(round2(-2.125), -2.13);
        assert_eq!(round2(3.0), 3.0);
        assert_eq!(round2(4.994), 4.99);
        assert_eq!(round2(4.995), 5.0);
        assert_eq!(round2(0.001), 0.0);
    }

    #[test]
    fn round2_reads_halves_from_decimal_text() {
        // neither value is exact in binary; 1.005 sits below the half, 2.675 above
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(2.675), 2.68);
        assert_eq!(round2(1.015), 1.02);
        assert_eq!(round2(0.125), 0.13);
    }

    #[test]
    fn genre_means_on_a_half_all_round_up() {
        let books = vec![
            book("1", "a", 2000, "X", 1.0),
            book("2", "b", 2000, "X", 1.01),
            book("3", "c", 2000, "Y", 2.67),
            book("4", "d", 2000, "Y", 2.68),
        ];
        let stats = summary(compute_statistics(&books));
        assert_eq!(stats.average_rating_by_genre["X"], 1.01);
        assert_eq!(stats.average_rating_by_genre["Y"], 2.68);
    }
}
