//! Demo catalog contents.
//!
//! Rows go through `CatalogService::create` like any caller input. Genres are
//! created before books because book rows reference genre ids 1..=3.

use crate::model::{
    FieldValue, Fields, TableKind, FIELD_AUTHOR_ID, FIELD_GENRE_ID, FIELD_NAME, FIELD_TITLE,
};
use crate::service::catalog_service::{CatalogResult, CatalogService};
use log::info;

const DEMO_AUTHORS: &[&str] = &[
    "John Doe",
    "Jane Smith",
    "Michael Johnson",
    "Emily Davis",
    "Christopher Brown",
    "Amanda Wilson",
    "Daniel Taylor",
    "Sophia White",
    "Ryan Martinez",
    "Olivia Garcia",
];

const DEMO_GENRES: &[&str] = &[
    "Science Fiction",
    "Mystery",
    "Romance",
    "Programming",
    "Self-Help",
    "Fantasy",
    "Historical",
    "Biography",
    "Horror",
    "Poetry",
];

/// `(title, author id, genre id)`; ids are positions in the lists above, 1-based.
const DEMO_BOOKS: &[(&str, u64, u64)] = &[
    ("Python Basics", 1, 1),
    ("Data Science Fundamentals", 2, 2),
    ("Mystery Novel", 3, 3),
    ("Web Development 101", 4, 1),
    ("Artificial Intelligence", 5, 2),
    ("Romantic Drama", 6, 3),
    ("JavaScript Mastery", 7, 1),
    ("The Science of Mindfulness", 8, 2),
    ("Epic Fantasy", 9, 3),
    ("Machine Learning in Practice", 10, 1),
    ("Historical Fiction", 1, 3),
    ("Game Development Essentials", 2, 1),
    ("Thriller: Behind the Scenes", 3, 2),
    ("Poetry Anthology", 4, 3),
];

/// Number of rows created per table by `load_demo_data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub authors: usize,
    pub genres: usize,
    pub books: usize,
}

/// Creates the demo authors, genres and books.
///
/// Book references use the ids returned by this call's own inserts, so the
/// seed stays correct on a catalog whose counters are already past 1.
pub fn load_demo_data(service: &mut CatalogService) -> CatalogResult<SeedSummary> {
    let mut author_ids = Vec::with_capacity(DEMO_AUTHORS.len());
    for name in DEMO_AUTHORS {
        author_ids.push(service.create(TableKind::Author, &named(name))?);
    }

    let mut genre_ids = Vec::with_capacity(DEMO_GENRES.len());
    for name in DEMO_GENRES {
        genre_ids.push(service.create(TableKind::Genre, &named(name))?);
    }

    for &(title, author, genre) in DEMO_BOOKS {
        let fields = Fields::new()
            .with(FIELD_TITLE, FieldValue::text(title))
            .with(FIELD_AUTHOR_ID, seeded_ref(&author_ids, author))
            .with(FIELD_GENRE_ID, seeded_ref(&genre_ids, genre));
        service.create(TableKind::Book, &fields)?;
    }

    let summary = SeedSummary {
        authors: DEMO_AUTHORS.len(),
        genres: DEMO_GENRES.len(),
        books: DEMO_BOOKS.len(),
    };
    info!(
        "event=seed_load module=seed status=ok authors={} genres={} books={}",
        summary.authors, summary.genres, summary.books
    );
    Ok(summary)
}

fn named(name: &str) -> Fields {
    Fields::new().with(FIELD_NAME, FieldValue::text(name))
}

fn seeded_ref(ids: &[u64], position: u64) -> FieldValue {
    let index = usize::try_from(position).ok().and_then(|p| p.checked_sub(1));
    FieldValue::Ref(index.and_then(|i| ids.get(i).copied()))
}

#[cfg(test)]
mod tests {
    use super::{load_demo_data, SeedSummary};
    use crate::service::catalog_service::CatalogService;

    #[test]
    fn demo_data_loads_every_row_with_resolved_references() {
        let mut service = CatalogService::new();
        let summary = load_demo_data(&mut service).unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                authors: 10,
                genres: 10,
                books: 14,
            }
        );
        assert_eq!(service.inner_join_books_authors().count(), 14);
        assert!(service
            .left_join_books_genres()
            .all(|(_, genre)| genre.is_some()));
    }
}
