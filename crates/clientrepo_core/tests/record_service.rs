mod common;

use clientrepo_core::{
    ChangeEvent, ConnectionManager, FieldValue, JsonFileRepository, ListQuery, PredicateSet,
    Projection, Record, RecordKind, RecordService, RepoError, Repository, SqliteRepository,
    ValidationError,
};
use common::{client, page};
use std::cell::RefCell;
use std::rc::Rc;

type EventLog = Rc<RefCell<Vec<ChangeEvent>>>;

fn recording<R: Repository>(service: &mut RecordService<R>) -> EventLog {
    let log: EventLog = Rc::default();
    let sink = Rc::clone(&log);
    service.subscribe(Box::new(move |event: &ChangeEvent| {
        sink.borrow_mut().push(*event);
    }));
    log
}

#[test]
fn listeners_see_successful_mutations_in_order() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let mut service =
        RecordService::new(SqliteRepository::try_new(&db, RecordKind::client()).unwrap());
    let log = recording(&mut service);

    let id = service.add(&client("A", "a@x.com", "1")).unwrap();
    service.update(id, &client("B", "b@x.com", "2")).unwrap();
    service.delete(id).unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            ChangeEvent::Added(id),
            ChangeEvent::Updated(id),
            ChangeEvent::Deleted(id),
        ]
    );
}

#[test]
fn failed_mutations_do_not_notify() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let mut service =
        RecordService::new(SqliteRepository::try_new(&db, RecordKind::client()).unwrap());
    let log = recording(&mut service);

    let err = service.add(&client("A", "broken", "1")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    db.close().unwrap();
    let err = service.delete(1).unwrap_err();
    assert!(matches!(err, RepoError::Storage(_)));

    assert!(log.borrow().is_empty());
}

#[test]
fn no_op_update_and_delete_do_not_notify() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let mut service =
        RecordService::new(SqliteRepository::try_new(&db, RecordKind::client()).unwrap());
    let log = recording(&mut service);

    let id = service.add(&client("A", "a@x.com", "1")).unwrap();
    assert!(!service.update(id + 1, &client("B", "b@x.com", "2")).unwrap());
    assert!(!service.delete(id + 1).unwrap());
    assert!(service.delete(id).unwrap());
    assert!(!service.delete(id).unwrap());

    assert_eq!(
        *log.borrow(),
        vec![ChangeEvent::Added(id), ChangeEvent::Deleted(id)]
    );
}

#[test]
fn file_backed_no_ops_do_not_notify() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = RecordService::new(JsonFileRepository::new(
        dir.path().join("clients.json"),
        RecordKind::client(),
    ));
    let log = recording(&mut service);

    assert!(!service.update(1, &client("A", "a@x.com", "1")).unwrap());
    assert!(!service.delete(1).unwrap());
    assert!(log.borrow().is_empty());
}

#[test]
fn every_subscriber_is_called() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = RecordService::new(JsonFileRepository::new(
        dir.path().join("clients.json"),
        RecordKind::client(),
    ));
    let first = recording(&mut service);
    let second = recording(&mut service);

    service.add(&client("A", "a@x.com", "1")).unwrap();

    assert_eq!(*first.borrow(), vec![ChangeEvent::Added(1)]);
    assert_eq!(*second.borrow(), vec![ChangeEvent::Added(1)]);
}

#[test]
fn require_reports_missing_records() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let service =
        RecordService::new(SqliteRepository::try_new(&db, RecordKind::client()).unwrap());

    let id = service.add(&client("A", "a@x.com", "1")).unwrap();
    assert_eq!(service.require(id).unwrap().id(), Some(id));
    assert!(service.get(id + 1).unwrap().is_none());

    let err = service.require(id + 1).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id + 1));
}

#[test]
fn projected_pages_keep_id_and_selected_fields() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let service =
        RecordService::new(SqliteRepository::try_new(&db, RecordKind::client()).unwrap());
    service.add(&client("Bob", "b@x.com", "2")).unwrap();
    service.add(&client("Alice", "a@x.com", "1")).unwrap();

    let brief = service
        .page_projected(page(1, 10), &ListQuery::new().sort_by("name"), &Projection::brief())
        .unwrap();
    assert_eq!(
        brief,
        vec![
            Record::new().with("id", 2).with("name", "Alice"),
            Record::new().with("id", 1).with("name", "Bob"),
        ]
    );

    let short = service
        .page_projected(
            page(1, 1),
            &ListQuery::new().filter("name", "Bob"),
            &Projection::short(),
        )
        .unwrap();
    assert_eq!(short.len(), 1);
    assert_eq!(
        short[0].field_names().collect::<Vec<_>>(),
        vec!["id", "name", "phone"]
    );
    assert_eq!(short[0].get("phone"), Some(&FieldValue::from("2")));
}

#[test]
fn page_count_rounds_up_and_rejects_zero_size() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let service =
        RecordService::new(SqliteRepository::try_new(&db, RecordKind::client()).unwrap());
    let all = PredicateSet::new();

    assert_eq!(service.page_count(10, &all).unwrap(), 0);

    for n in 0..5 {
        service
            .add(&client(&format!("c{n}"), "c@x.com", "1"))
            .unwrap();
    }
    assert_eq!(service.page_count(2, &all).unwrap(), 3);
    assert_eq!(service.page_count(5, &all).unwrap(), 1);
    assert_eq!(
        service
            .page_count(1, &PredicateSet::new().eq("name", "c3"))
            .unwrap(),
        1
    );

    let err = service.page_count(0, &all).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::InvalidPage { size: 0, .. })
    ));
}

#[test]
fn service_runs_over_boxed_repositories() {
    let db = ConnectionManager::open_in_memory().unwrap();
    let boxed: Box<dyn Repository + '_> =
        Box::new(SqliteRepository::try_new(&db, RecordKind::client()).unwrap());
    let service = RecordService::new(boxed);

    service.add(&client("A", "a@x.com", "1")).unwrap();
    assert_eq!(service.count(&PredicateSet::new()).unwrap(), 1);
    assert_eq!(service.repository().kind().name(), "client");
    assert_eq!(
        service
            .page(page(1, 5), &ListQuery::new())
            .unwrap()
            .len(),
        1
    );
}
