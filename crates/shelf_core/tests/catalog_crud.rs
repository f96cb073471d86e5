use shelf_core::{
    Author, CatalogError, CatalogService, ConstraintViolation, FieldValue, Fields, Record,
    TableKind, FIELD_AUTHOR_ID, FIELD_GENRE_ID, FIELD_NAME, FIELD_TITLE,
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
fn create_assigns_strictly_increasing_ids_per_table() {
    let mut service = CatalogService::new();

    let authors: Vec<u64> = ["A", "B", "C"]
        .iter()
        .map(|name| service.create(TableKind::Author, &named(name)).unwrap())
        .collect();
    assert_eq!(authors, vec![1, 2, 3]);

    // Counters are per table.
    assert_eq!(service.create(TableKind::Genre, &named("Poetry")).unwrap(), 1);

    service.delete(TableKind::Author, 3).unwrap();
    assert_eq!(service.create(TableKind::Author, &named("D")).unwrap(), 4);
}

#[test]
fn book_create_requires_existing_author() {
    let mut service = CatalogService::new();
    let author_id = service.create(TableKind::Author, &named("Doe")).unwrap();

    for missing in [0, 2, 99] {
        let err = service
            .create(TableKind::Book, &book("T", Some(missing), None))
            .unwrap_err();
        match err {
            CatalogError::ConstraintViolation(ConstraintViolation::UnresolvedReference {
                table,
                parent,
                id,
                ..
            }) => {
                assert_eq!(table, TableKind::Book);
                assert_eq!(parent, TableKind::Author);
                assert_eq!(id, missing);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(service.read(TableKind::Book).count(), 0);

    let id = service
        .create(TableKind::Book, &book("T", Some(author_id), None))
        .unwrap();
    assert_eq!(id, 1);
}

#[test]
fn create_rejects_blank_missing_and_unknown_fields() {
    let mut service = CatalogService::new();

    let blank = service.create(TableKind::Author, &named("   ")).unwrap_err();
    assert!(matches!(
        blank,
        CatalogError::ConstraintViolation(ConstraintViolation::EmptyField { .. })
    ));

    let missing = service
        .create(
            TableKind::Book,
            &Fields::new().with(FIELD_AUTHOR_ID, FieldValue::null()),
        )
        .unwrap_err();
    assert!(matches!(
        missing,
        CatalogError::ConstraintViolation(ConstraintViolation::MissingField {
            field: FIELD_TITLE,
            ..
        })
    ));

    let unknown = service
        .create(
            TableKind::Genre,
            &named("Horror").with("shelf", FieldValue::text("B2")),
        )
        .unwrap_err();
    assert!(matches!(
        unknown,
        CatalogError::ConstraintViolation(ConstraintViolation::UnknownField { .. })
    ));

    assert_eq!(service.stats().total(), 0);
}

#[test]
fn read_returns_rows_in_insertion_order() {
    let mut service = CatalogService::new();
    service.create(TableKind::Author, &named("John Doe")).unwrap();
    service.create(TableKind::Author, &named("Jane Smith")).unwrap();

    let rows: Vec<Record> = service.read(TableKind::Author).collect();
    assert_eq!(
        rows,
        vec![
            Record::Author(Author {
                id: 1,
                name: "John Doe".to_string(),
            }),
            Record::Author(Author {
                id: 2,
                name: "Jane Smith".to_string(),
            }),
        ]
    );
    // A second read starts over.
    assert_eq!(service.read(TableKind::Author).count(), 2);
}

#[test]
fn update_author_name_and_not_found() {
    let mut service = CatalogService::new();
    let id = service.create(TableKind::Author, &named("Doe")).unwrap();

    service.update_author_name(id, "  Roe ").unwrap();
    assert_eq!(service.authors().next().unwrap().name, "Roe");

    let err = service.update_author_name(42, "Nobody").unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            table: TableKind::Author,
            id: 42,
        }
    ));

    let err = service.update_author_name(id, "").unwrap_err();
    assert!(matches!(err, CatalogError::ConstraintViolation(_)));
    assert_eq!(service.authors().next().unwrap().name, "Roe");
}

#[test]
fn update_field_checks_new_foreign_key() {
    let mut service = CatalogService::new();
    let genre = service.create(TableKind::Genre, &named("Mystery")).unwrap();
    let book_id = service
        .create(TableKind::Book, &book("Mystery Novel", None, None))
        .unwrap();

    let err = service
        .update_field(TableKind::Book, book_id, FIELD_GENRE_ID, FieldValue::reference(9))
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::ConstraintViolation(ConstraintViolation::UnresolvedReference { .. })
    ));

    service
        .update_field(
            TableKind::Book,
            book_id,
            FIELD_GENRE_ID,
            FieldValue::reference(genre),
        )
        .unwrap();
    service
        .update_field(TableKind::Book, book_id, FIELD_TITLE, FieldValue::text("Renamed"))
        .unwrap();

    let stored = service.books().next().unwrap();
    assert_eq!(stored.genre_id, Some(genre));
    assert_eq!(stored.title, "Renamed");

    service
        .update_field(TableKind::Book, book_id, FIELD_GENRE_ID, FieldValue::null())
        .unwrap();
    assert_eq!(service.books().next().unwrap().genre_id, None);
}

#[test]
fn unknown_table_code_maps_to_invalid_table_kind() {
    let err: CatalogError = TableKind::from_code(10).unwrap_err().into();
    assert!(matches!(err, CatalogError::InvalidTableKind(ref code) if code == "10"));
    assert_eq!(err.code(), "invalid_table_kind");
}

#[test]
fn get_returns_record_or_not_found() {
    let mut service = CatalogService::new();
    let id = service.create(TableKind::Genre, &named("Romance")).unwrap();

    let record = service.get(TableKind::Genre, id).unwrap();
    assert_eq!(record.kind(), TableKind::Genre);
    assert_eq!(record.id(), id);

    assert!(matches!(
        service.get(TableKind::Book, id),
        Err(CatalogError::NotFound { .. })
    ));
}
