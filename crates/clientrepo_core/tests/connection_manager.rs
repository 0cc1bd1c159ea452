use clientrepo_core::{
    ConnectionManager, FieldSpec, FieldValue, RecordKind, StorageError, WriteOutcome,
};

fn client_table(db: &ConnectionManager) {
    db.ensure_table(&RecordKind::client()).unwrap();
}

#[test]
fn insert_returns_new_id_and_other_writes_do_not() {
    let db = ConnectionManager::open_in_memory().unwrap();
    client_table(&db);

    let inserted = db
        .execute_write(
            "INSERT INTO client (name, email, phone) VALUES (?, ?, ?);",
            &["A".into(), "a@x.com".into(), "1".into()],
        )
        .unwrap();
    assert_eq!(
        inserted,
        WriteOutcome {
            rows_affected: 1,
            inserted_id: Some(1),
        }
    );

    let updated = db
        .execute_write(
            "UPDATE client SET name = ? WHERE id = ?;",
            &["B".into(), FieldValue::Integer(1)],
        )
        .unwrap();
    assert_eq!(
        updated,
        WriteOutcome {
            rows_affected: 1,
            inserted_id: None,
        }
    );

    let deleted = db
        .execute_write("DELETE FROM client WHERE id = ?;", &[FieldValue::Integer(9)])
        .unwrap();
    assert_eq!(deleted.rows_affected, 0);
    assert_eq!(deleted.inserted_id, None);
}

#[test]
fn query_returns_rows_keyed_by_column_name() {
    let db = ConnectionManager::open_in_memory().unwrap();
    client_table(&db);
    db.execute_write(
        "INSERT INTO client (name, email, phone) VALUES (?, ?, NULL);",
        &["A".into(), "a@x.com".into()],
    )
    .unwrap();

    let rows = db
        .execute_query(
            "SELECT id, name, phone FROM client WHERE name = ?;",
            &["A".into()],
        )
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id(), Some(1));
    assert_eq!(rows[0].get("name"), Some(&FieldValue::from("A")));
    assert_eq!(rows[0].get("phone"), Some(&FieldValue::Null));
    assert!(!rows[0].contains("email"));
}

#[test]
fn malformed_statement_is_a_storage_error() {
    let db = ConnectionManager::open_in_memory().unwrap();

    let err = db.execute_query("SELEC nothing", &[]).unwrap_err();
    assert!(matches!(err, StorageError::Sqlite(_)));

    let err = db
        .execute_write("INSERT INTO missing_table (a) VALUES (?);", &[1.into()])
        .unwrap_err();
    assert!(matches!(err, StorageError::Sqlite(_)));
}

#[test]
fn close_is_idempotent_and_blocks_further_use() {
    let db = ConnectionManager::open_in_memory().unwrap();
    assert!(db.is_open());
    assert_eq!(db.mode(), "memory");

    db.close().unwrap();
    db.close().unwrap();
    assert!(!db.is_open());

    let err = db.execute_query("SELECT 1;", &[]).unwrap_err();
    assert!(matches!(err, StorageError::Closed));
}

#[test]
fn writes_are_committed_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commit.sqlite3");

    let writer = ConnectionManager::open(&path).unwrap();
    client_table(&writer);
    writer
        .execute_write(
            "INSERT INTO client (name, email, phone) VALUES (?, ?, ?);",
            &["A".into(), "a@x.com".into(), "1".into()],
        )
        .unwrap();

    let reader = ConnectionManager::open(&path).unwrap();
    let rows = reader
        .execute_query("SELECT COUNT(*) AS count FROM client;", &[])
        .unwrap();
    assert_eq!(rows[0].get("count"), Some(&FieldValue::Integer(1)));
}

#[test]
fn ensure_table_adds_missing_columns_only() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let legacy = RecordKind::new("clients")
        .field(FieldSpec::text("fio").required())
        .field(FieldSpec::text("phone").required());
    assert!(db.ensure_table(&legacy).unwrap().is_empty());

    db.execute_write(
        "INSERT INTO clients (fio, phone) VALUES (?, ?);",
        &["Old Row".into(), "1".into()],
    )
    .unwrap();

    let added = db.ensure_table(&RecordKind::pawnshop_client()).unwrap();
    assert_eq!(
        added,
        vec!["address", "inn", "birth_date", "item", "value", "term"]
    );
    assert!(db
        .ensure_table(&RecordKind::pawnshop_client())
        .unwrap()
        .is_empty());

    let rows = db
        .execute_query("SELECT fio, term FROM clients;", &[])
        .unwrap();
    assert_eq!(rows[0].get("fio"), Some(&FieldValue::from("Old Row")));
    assert_eq!(rows[0].get("term"), Some(&FieldValue::Null));
}

#[test]
fn manager_can_be_shared_across_threads() {
    let db = ConnectionManager::open_in_memory().unwrap();
    client_table(&db);

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let db = &db;
            scope.spawn(move || {
                for n in 0..10 {
                    db.execute_write(
                        "INSERT INTO client (name, email, phone) VALUES (?, ?, ?);",
                        &[
                            format!("w{worker}-{n}").into(),
                            "w@x.com".into(),
                            "1".into(),
                        ],
                    )
                    .unwrap();
                }
            });
        }
    });

    let rows = db
        .execute_query("SELECT COUNT(*) AS count FROM client;", &[])
        .unwrap();
    assert_eq!(rows[0].get("count"), Some(&FieldValue::Integer(40)));
}
