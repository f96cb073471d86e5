use shelf_core::{
    load_demo_data, Author, Book, CatalogService, FieldValue, Fields, TableKind, FIELD_AUTHOR_ID,
    FIELD_GENRE_ID, FIELD_NAME, FIELD_TITLE,
};

fn named(name: &str) -> Fields {
    Fields::new().with(FIELD_NAME, FieldValue::text(name))
}

fn book(title: &str, author_id: Option<u64>, genre_id: Option<u64>) -> Fields {
    Fields::new()
        .with(FIELD_TITLE, FieldValue::text(title))
        .with(FIELD_AUTHOR_ID, FieldValue::Ref(author_id))
        .with(FIELD_GENRE_ID, FieldValue::Ref(genre_id))
}

#[test]
fn doe_scifi_scenario() {
    let mut service = CatalogService::new();
    assert_eq!(service.create(TableKind::Author, &named("Doe")).unwrap(), 1);
    assert_eq!(service.create(TableKind::Genre, &named("SciFi")).unwrap(), 1);
    assert_eq!(
        service
            .create(TableKind::Book, &book("X", Some(1), Some(1)))
            .unwrap(),
        1
    );

    let pairs: Vec<(Book, Author)> = service
        .inner_join_books_authors()
        .map(|(book, author)| (book.clone(), author.clone()))
        .collect();
    assert_eq!(
        pairs,
        vec![(
            Book {
                id: 1,
                title: "X".to_string(),
                author_id: Some(1),
                genre_id: Some(1),
            },
            Author {
                id: 1,
                name: "Doe".to_string(),
            }
        )]
    );

    let report = service.delete(TableKind::Author, 1).unwrap();
    assert_eq!(report.cascaded, vec![(TableKind::Book, 1)]);
    assert_eq!(service.read(TableKind::Book).count(), 0);
    assert_eq!(service.inner_join_books_authors().count(), 0);
}

#[test]
fn inner_join_emits_one_pair_per_book_with_resolved_author() {
    let mut service = CatalogService::new();
    service.create(TableKind::Author, &named("Doe")).unwrap();
    service.create(TableKind::Author, &named("Roe")).unwrap();
    service
        .create(TableKind::Book, &book("with author", Some(2), None))
        .unwrap();
    service
        .create(TableKind::Book, &book("no author", None, None))
        .unwrap();
    service
        .create(TableKind::Book, &book("also with author", Some(1), None))
        .unwrap();

    let pairs: Vec<(u64, u64)> = service
        .inner_join_books_authors()
        .map(|(book, author)| (book.id, author.id))
        .collect();
    assert_eq!(pairs, vec![(1, 2), (3, 1)]);
}

#[test]
fn left_join_emits_exactly_one_pair_per_book() {
    let mut service = CatalogService::new();
    service.create(TableKind::Genre, &named("Mystery")).unwrap();
    service
        .create(TableKind::Book, &book("typed", None, Some(1)))
        .unwrap();
    service
        .create(TableKind::Book, &book("untyped", None, None))
        .unwrap();

    let rows: Vec<(String, Option<String>)> = service
        .left_join_books_genres()
        .map(|(book, genre)| (book.title.clone(), genre.map(|g| g.name.clone())))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("typed".to_string(), Some("Mystery".to_string())),
            ("untyped".to_string(), None),
        ]
    );
}

#[test]
fn left_join_marks_books_absent_after_genre_is_cleared() {
    let mut service = CatalogService::new();
    load_demo_data(&mut service).unwrap();

    service
        .update_field(TableKind::Book, 1, FIELD_GENRE_ID, FieldValue::null())
        .unwrap();

    let join: Vec<_> = service.left_join_books_genres().collect();
    assert_eq!(join.len(), service.stats().books);
    assert!(join[0].1.is_none());
    assert!(join[1..].iter().all(|(_, genre)| genre.is_some()));
}
