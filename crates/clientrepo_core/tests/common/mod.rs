//! Contract checks shared by every backend's integration tests.

#![allow(dead_code)]

use clientrepo_core::{
    FieldValue, ListQuery, PageRequest, PredicateSet, Record, RecordId, Repository,
};

pub fn client(name: &str, email: &str, phone: &str) -> Record {
    Record::new()
        .with("name", name)
        .with("email", email)
        .with("phone", phone)
}

pub fn page(k: u32, n: u32) -> PageRequest {
    PageRequest::new(k, n).unwrap()
}

pub fn ids(records: &[Record]) -> Vec<RecordId> {
    records.iter().filter_map(Record::id).collect()
}

/// Empty collection → two adds → pages → filter → delete.
pub fn assert_basic_scenario(repo: &dyn Repository) {
    assert_eq!(repo.count(&PredicateSet::new()).unwrap(), 0);

    let first = client("A", "a@x.com", "123");
    let second = client("B", "b@x.com", "456");
    assert_eq!(repo.add(&first).unwrap(), 1);
    assert_eq!(repo.add(&second).unwrap(), 2);
    assert_eq!(repo.count(&PredicateSet::new()).unwrap(), 2);

    let page_one = repo.get_page(page(1, 1), &ListQuery::new()).unwrap();
    assert_eq!(ids(&page_one), vec![1]);
    assert_eq!(page_one[0].without_id(), first);

    let page_two = repo.get_page(page(2, 1), &ListQuery::new()).unwrap();
    assert_eq!(ids(&page_two), vec![2]);

    let filtered = repo
        .get_page(page(1, 10), &ListQuery::new().filter("name", "B"))
        .unwrap();
    assert_eq!(ids(&filtered), vec![2]);
    assert_eq!(filtered[0].without_id(), second);

    repo.delete(1).unwrap();
    assert_eq!(repo.count(&PredicateSet::new()).unwrap(), 1);
    assert!(repo.get_by_id(1).unwrap().is_none());
}

/// Pages of every size concatenate to the full filtered, sorted collection.
pub fn assert_pagination_covers_collection(repo: &dyn Repository) {
    let names = ["delta", "alpha", "echo", "bravo", "charlie", "alpha", "foxtrot"];
    for (index, name) in names.iter().enumerate() {
        let phone = if index % 2 == 0 { "even" } else { "odd" };
        repo.add(&client(name, &format!("{name}{index}@x.com"), phone))
            .unwrap();
    }

    let query = ListQuery::new().sort_by("name");
    let total = repo.count(&query.predicates).unwrap();
    assert_eq!(total, names.len() as u64);

    let expected = repo
        .get_page(page(1, names.len() as u32), &query)
        .unwrap();
    let expected_names: Vec<_> = expected
        .iter()
        .map(|record| record.value_or_null("name"))
        .collect();
    let mut sorted_names: Vec<FieldValue> =
        names.iter().map(|name| FieldValue::from(*name)).collect();
    sorted_names.sort_by(FieldValue::storage_cmp);
    assert_eq!(expected_names, sorted_names);

    for size in 1..=4u32 {
        let pages = total.div_ceil(u64::from(size)) as u32;
        let mut collected = Vec::new();
        for k in 1..=pages {
            let chunk = repo.get_page(page(k, size), &query).unwrap();
            assert!(chunk.len() <= size as usize);
            collected.extend(chunk);
        }
        assert_eq!(ids(&collected), ids(&expected), "page size {size}");

        let beyond = repo.get_page(page(pages + 1, size), &query).unwrap();
        assert!(beyond.is_empty());
    }

    let odd = PredicateSet::new().eq("phone", "odd");
    assert_eq!(repo.count(&odd).unwrap(), 3);
    let odd_page = repo
        .get_page(page(1, 10), &ListQuery::new().with_predicates(odd).sort_by("name"))
        .unwrap();
    let odd_names: Vec<_> = odd_page
        .iter()
        .filter_map(|record| record.get("name").and_then(FieldValue::as_text))
        .collect();
    assert_eq!(odd_names, vec!["alpha", "alpha", "bravo"]);
}

/// Full-overwrite update, unknown-id no-ops and idempotent delete.
pub fn assert_update_and_delete_semantics(repo: &dyn Repository) {
    let id = repo.add(&client("Jane Doe", "jane@example.com", "555-1234")).unwrap();

    let replacement = client("Jane Smith", "smith@example.com", "555-5678");
    assert!(repo.update(id, &replacement).unwrap());
    let loaded = repo.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded.id(), Some(id));
    assert_eq!(loaded.without_id(), replacement);

    assert!(!repo.update(id + 100, &replacement).unwrap());
    assert_eq!(repo.count(&PredicateSet::new()).unwrap(), 1);

    assert!(repo.delete(id).unwrap());
    assert!(!repo.delete(id).unwrap());
    assert!(!repo.delete(id + 100).unwrap());
    assert!(repo.get_by_id(id).unwrap().is_none());
    assert_eq!(repo.count(&PredicateSet::new()).unwrap(), 0);
}
