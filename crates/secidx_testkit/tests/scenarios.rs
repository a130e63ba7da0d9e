//! End-to-end index scenarios.

use secidx_core::{Config, IndexDefinition};
use secidx_testkit::{
    age_index, check_membership, index_snapshot, standard_config, standard_expectations,
    test_store, GoldenTest, Person,
};

fn first_names(people: &[Person]) -> Vec<&str> {
    people.iter().map(|p| p.first_name.as_str()).collect()
}

#[test]
fn lookup_returns_matches_in_insertion_order() {
    let store = test_store(Config::new().index(age_index()));
    store.set(1, &Person::new("Ivan", "Ivanov", 30)).unwrap();
    store.set(2, &Person::new("Anna", "Lukova", 59)).unwrap();
    store.set(3, &Person::new("Petr", "Lukov", 17)).unwrap();

    assert_eq!(first_names(&store.get_by_index("age", 59).unwrap()), vec!["Anna"]);

    store.set(4, &Person::new("Olga", "Korchagina", 59)).unwrap();
    assert_eq!(
        first_names(&store.get_by_index("age", 59).unwrap()),
        vec!["Anna", "Olga"]
    );
}

#[test]
fn filtered_index_excludes_non_matching_records() {
    let config = Config::new().index(
        IndexDefinition::new("age")
            .field("age")
            .filter(|p: &Person| p.age > 30),
    );
    let store = test_store(config);
    store.set(1, &Person::new("Ivan", "Ivanov", 30)).unwrap();
    store.set(2, &Person::new("Anna", "Lukova", 59)).unwrap();

    assert!(store.get_by_index("age", 30).unwrap().is_empty());
    assert_eq!(store.index_members("age", 30).unwrap(), None);
    assert_eq!(first_names(&store.get_by_index("age", 59).unwrap()), vec!["Anna"]);
}

#[test]
fn update_moves_membership_and_keeps_emptied_entry() {
    let store = test_store(Config::new().index(age_index()));
    store.set(1, &Person::new("Ivan", "Ivanov", 30)).unwrap();
    store.set(2, &Person::new("Anna", "Lukova", 59)).unwrap();
    store.set(3, &Person::new("Petr", "Lukov", 17)).unwrap();

    store.set(2, &Person::new("Anna", "Lukova", 40)).unwrap();

    assert_eq!(store.index_members("age", 59).unwrap(), Some(vec![]));
    assert_eq!(first_names(&store.get_by_index("age", 40).unwrap()), vec!["Anna"]);
    GoldenTest::with_default_dir("scenario").assert_json("update", &index_snapshot(&store));
}

#[test]
fn delete_many_ignores_absent_keys() {
    let store = test_store(standard_config());
    store.set("a", &Person::new("Anna", "Lukova", 59).in_city("Kazan")).unwrap();
    store.set("c", &Person::new("Olga", "Lukova", 59)).unwrap();
    store.set("d", &Person::new("Petr", "Lukov", 17)).unwrap();

    assert!(store.delete_many(["a", "b", "c"]).unwrap());

    for (index, value) in [("age", "59"), ("senior", "59"), ("lastName", "Lukova"), ("city", "Kazan")] {
        assert_eq!(
            store.index_members(index, value).unwrap(),
            Some(vec![]),
            "{index}:{value} should be emptied"
        );
    }
    assert_eq!(
        store.index_members("initial", "L").unwrap(),
        Some(vec!["d".to_string()])
    );
    assert_eq!(store.has_many(["a", "b", "c", "d"]).unwrap(), vec![false, false, false, true]);
    assert_eq!(check_membership(&store, &standard_expectations()), Ok(()));
}

#[test]
fn delete_many_of_only_absent_keys_reports_nothing_removed() {
    let store = test_store(standard_config());
    assert!(!store.delete_many(["x", "y"]).unwrap());
}

#[test]
fn nested_field_and_derived_indexes() {
    let store = test_store(standard_config());
    store.set(1, &Person::new("Ivan", "Ivanov", 30).in_city("Minsk")).unwrap();
    store.set(2, &Person::new("Anna", "Ivanova", 59)).unwrap();

    assert_eq!(first_names(&store.get_by_index("city", "Minsk").unwrap()), vec!["Ivan"]);
    assert_eq!(first_names(&store.get_by_index("city", None::<&str>).unwrap()), vec!["Anna"]);
    assert_eq!(
        first_names(&store.get_by_index("initial", "I").unwrap()),
        vec!["Ivan", "Anna"]
    );
}
