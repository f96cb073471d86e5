//! Foreign-key join iterators.
//!
//! # Invariants
//! - One pass over the left table in id order; the right side is looked up by
//!   primary key, never scanned.
//! - Inner join emits only pairs whose key resolves.
//! - Left outer join emits exactly one pair per left row, with `None` as the
//!   absent marker.

use crate::model::{Entity, RecordId};
use crate::store::RecordStore;
use std::collections::btree_map::Values;

/// Lazy `left INNER JOIN right ON left.fk = right.id`.
pub fn inner_join<'a, L: Entity, R: Entity>(
    left: &'a RecordStore<L>,
    right: &'a RecordStore<R>,
    fk_field: &'a str,
) -> InnerJoin<'a, L, R> {
    InnerJoin {
        left: left.all(),
        right,
        fk_field,
    }
}

/// Lazy `left LEFT OUTER JOIN right ON left.fk = right.id`.
pub fn left_outer_join<'a, L: Entity, R: Entity>(
    left: &'a RecordStore<L>,
    right: &'a RecordStore<R>,
    fk_field: &'a str,
) -> LeftOuterJoin<'a, L, R> {
    LeftOuterJoin {
        left: left.all(),
        right,
        fk_field,
    }
}

pub struct InnerJoin<'a, L: Entity, R: Entity> {
    left: Values<'a, RecordId, L>,
    right: &'a RecordStore<R>,
    fk_field: &'a str,
}

impl<'a, L: Entity, R: Entity> Iterator for InnerJoin<'a, L, R> {
    type Item = (&'a L, &'a R);

    fn next(&mut self) -> Option<Self::Item> {
        let right = self.right;
        let fk_field = self.fk_field;
        self.left.find_map(|row| {
            row.reference(fk_field)
                .and_then(|id| right.get(id).ok())
                .map(|matched| (row, matched))
        })
    }
}

pub struct LeftOuterJoin<'a, L: Entity, R: Entity> {
    left: Values<'a, RecordId, L>,
    right: &'a RecordStore<R>,
    fk_field: &'a str,
}

impl<'a, L: Entity, R: Entity> Iterator for LeftOuterJoin<'a, L, R> {
    type Item = (&'a L, Option<&'a R>);

    fn next(&mut self) -> Option<Self::Item> {
        let right = self.right;
        let row = self.left.next()?;
        let matched = row
            .reference(self.fk_field)
            .and_then(|id| right.get(id).ok());
        Some((row, matched))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.left.size_hint()
    }
}

impl<L: Entity, R: Entity> ExactSizeIterator for LeftOuterJoin<'_, L, R> {}

#[cfg(test)]
mod tests {
    use super::{inner_join, left_outer_join};
    use crate::model::{
        Author, Book, FieldValue, Fields, Genre, FIELD_AUTHOR_ID, FIELD_GENRE_ID, FIELD_NAME,
        FIELD_TITLE,
    };
    use crate::store::RecordStore;

    fn named(name: &str) -> Fields {
        Fields::new().with(FIELD_NAME, FieldValue::text(name))
    }

    fn book(title: &str, author_id: Option<u64>, genre_id: Option<u64>) -> Fields {
        Fields::new()
            .with(FIELD_TITLE, FieldValue::text(title))
            .with(FIELD_AUTHOR_ID, FieldValue::Ref(author_id))
            .with(FIELD_GENRE_ID, FieldValue::Ref(genre_id))
    }

    fn fixture() -> (RecordStore<Book>, RecordStore<Author>, RecordStore<Genre>) {
        let mut authors = RecordStore::new();
        authors.insert(&named("Doe")).unwrap();
        let mut genres = RecordStore::new();
        genres.insert(&named("SciFi")).unwrap();

        // Store-level inserts skip reference checks, so dangling keys are possible here.
        let mut books = RecordStore::new();
        books.insert(&book("resolved", Some(1), Some(1))).unwrap();
        books.insert(&book("dangling", Some(9), Some(9))).unwrap();
        books.insert(&book("unset", None, None)).unwrap();
        books.insert(&book("second", Some(1), None)).unwrap();
        (books, authors, genres)
    }

    #[test]
    fn inner_join_skips_unresolved_keys_in_left_order() {
        let (books, authors, _) = fixture();
        let pairs: Vec<(&str, &str)> = inner_join(&books, &authors, FIELD_AUTHOR_ID)
            .map(|(book, author)| (book.title.as_str(), author.name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("resolved", "Doe"), ("second", "Doe")]);
    }

    #[test]
    fn left_outer_join_keeps_every_left_row() {
        let (books, _, genres) = fixture();
        let join = left_outer_join(&books, &genres, FIELD_GENRE_ID);
        assert_eq!(join.len(), 4);

        let pairs: Vec<(u64, Option<&str>)> = join
            .map(|(book, genre)| (book.id, genre.map(|g| g.name.as_str())))
            .collect();
        assert_eq!(
            pairs,
            vec![(1, Some("SciFi")), (2, None), (3, None), (4, None)]
        );
    }

    #[test]
    fn joins_are_restartable() {
        let (books, authors, _) = fixture();
        let first = inner_join(&books, &authors, FIELD_AUTHOR_ID).count();
        let second = inner_join(&books, &authors, FIELD_AUTHOR_ID).count();
        assert_eq!(first, second);
    }
}
