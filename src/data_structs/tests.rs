use std::sync::Arc;
use std::thread;

use rstest::rstest;

use super::*;
use crate::error::EnrichError;

fn gene_db() -> SharedDatabase {
    EntityDatabase::with_identifiers(["TP53", "BRCA1", "EGFR", "MYC", "KRAS", "PTEN"])
}

// --- EntityDatabase Tests ---

#[test]
fn test_intern_is_idempotent() {
    let db = EntityDatabase::new();
    let a = db.intern("TP53");
    let b = db.intern("BRCA1");
    assert_eq!(db.intern("TP53"), a);
    assert_ne!(a, b);
    assert_eq!(db.len(), 2);
    assert_eq!(db.name_of(b).unwrap(), "BRCA1");
    assert_eq!(db.index_of("TP53").unwrap(), a);
}

#[test]
fn test_lookup_errors() {
    let db = gene_db();
    assert!(matches!(db.index_of("NOPE"), Err(EnrichError::Lookup(_))));
    assert!(matches!(db.name_of(100), Err(EnrichError::Lookup(_))));
}

#[test]
fn test_concurrent_interning_yields_dense_indices() {
    let db = EntityDatabase::new();
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                (0..150)
                    .map(|i| db.intern(&format!("gene{}", (i + t * 37) % 150)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(db.len(), 150);
    for i in 0..150 {
        let name = format!("gene{i}");
        let index = db.index_of(&name).unwrap();
        assert_eq!(db.name_of(index).unwrap(), name);
    }
}

// --- Category Tests ---

#[test]
fn test_category_uniqueness() {
    let db = gene_db();
    let cat = Category::from_identifiers("dup", &db, ["TP53", "TP53", "MYC"]);
    assert_eq!(cat.len(), 2);
    assert!(cat.contains_identifier("MYC"));
    assert!(!cat.contains_identifier("EGFR"));
    assert!(!cat.contains_identifier("UNKNOWN"));
    assert_eq!(cat.identifiers().unwrap(), vec!["TP53", "MYC"]);
}

#[test]
fn test_category_from_invalid_indices() {
    let db = gene_db();
    let res = Category::from_indices("bad", &db, [0, 1, 42]);
    assert!(matches!(res, Err(EnrichError::Input(_))));
}

#[test]
fn test_category_set_operations() {
    let db = gene_db();
    let a = Category::from_identifiers("a", &db, ["TP53", "BRCA1", "EGFR"]);
    let b = Category::from_identifiers("b", &db, ["EGFR", "MYC", "TP53"]);
    let small = Category::from_identifiers("s", &db, ["EGFR"]);

    assert_eq!(a.intersection_size(&b).unwrap(), 2);
    let both = a.intersect(&b, "a&b").unwrap();
    assert_eq!(both.name(), "a&b");
    assert_eq!(both.identifiers().unwrap(), vec!["TP53", "EGFR"]);
    assert!(small.is_subset_of(&a).unwrap());
    assert!(!a.is_subset_of(&small).unwrap());
}

#[test]
fn test_cross_database_operations_fail() {
    let db_a = gene_db();
    let db_b = gene_db();
    let a = Category::from_identifiers("a", &db_a, ["TP53"]);
    let b = Category::from_identifiers("b", &db_b, ["TP53"]);
    assert!(matches!(
        a.intersection_size(&b),
        Err(EnrichError::Consistency(_))
    ));

    let scores = Scores::from_identifiers(&db_b, [("TP53", 1.0)]);
    assert!(matches!(
        a.restrict_to_scores(&scores),
        Err(EnrichError::Consistency(_))
    ));
    assert!(matches!(scores.subset(&a), Err(EnrichError::Consistency(_))));
}

#[test]
fn test_category_reference() {
    let db = gene_db();
    let cat = Category::from_identifiers("kegg", &db, ["KRAS"])
        .with_reference("https://www.kegg.jp/pathway/hsa05210");
    assert_eq!(cat.reference(), Some("https://www.kegg.jp/pathway/hsa05210"));
}

// --- Scores Tests ---

fn toy_scores(db: &SharedDatabase) -> Scores {
    Scores::from_identifiers(
        db,
        [
            ("TP53", -2.0),
            ("BRCA1", 1.0),
            ("EGFR", 3.5),
            ("MYC", 1.0),
            ("KRAS", -0.5),
        ],
    )
}

#[rstest]
#[case(Order::Increasing, vec!["TP53", "KRAS", "BRCA1", "MYC", "EGFR"])]
#[case(Order::Decreasing, vec!["EGFR", "BRCA1", "MYC", "KRAS", "TP53"])]
fn test_scores_sorted_is_stable(
    #[case] order: Order,
    #[case] expected: Vec<&str>,
) {
    let db = gene_db();
    let scores = toy_scores(&db);
    let sorted = scores.sorted(order);
    let names: Vec<String> = sorted
        .iter()
        .map(|s| db.name_of(s.index).unwrap())
        .collect();
    assert_eq!(names, expected);
    // the source collection is left untouched
    assert_eq!(scores.get(0).unwrap().score, -2.0);
}

#[test]
fn test_scores_in_place_transforms() {
    let db = gene_db();
    let mut scores = toy_scores(&db);
    scores.abs_in_place();
    scores.sort(Order::Decreasing);
    assert_eq!(scores.values(), vec![3.5, 2.0, 1.0, 1.0, 0.5]);
    scores.sort_by(|a, b| a.index.cmp(&b.index));
    assert_eq!(scores.indices(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_scores_subset_and_lookup() {
    let db = gene_db();
    let scores = toy_scores(&db);
    let cat = Category::from_identifiers("c", &db, ["EGFR", "KRAS", "PTEN"]);
    let sub = scores.subset(&cat).unwrap();
    assert_eq!(sub.values(), vec![3.5, -0.5]);
    assert_eq!(scores.score_of(db.index_of("MYC").unwrap()), Some(1.0));
    assert_eq!(scores.score_of(db.index_of("PTEN").unwrap()), None);

    let restricted = cat.restrict_to_scores(&scores).unwrap();
    assert_eq!(restricted.len(), 2);
    assert_eq!(scores.position_map()[&db.index_of("EGFR").unwrap()], 2);
    assert_eq!(scores.mean(), Some(0.6));
}

#[test]
fn test_scores_from_invalid_entries() {
    let db = gene_db();
    let res = Scores::from_entries(&db, vec![Score::new(0, 1.0), Score::new(99, 2.0)]);
    assert!(matches!(res, Err(EnrichError::Input(_))));
}

// --- ContingencyTable Tests ---

#[test]
fn test_contingency_from_categories() {
    let db = EntityDatabase::new();
    let reference =
        Category::from_identifiers("ref", &db, (0..20).map(|i| format!("g{i}")));
    let test = Category::from_identifiers("test", &db, (0..8).map(|i| format!("g{i}")));
    let cat = Category::from_identifiers("cat", &db, (5..12).map(|i| format!("g{i}")));

    let table = ContingencyTable::from_categories(&reference, &test, &cat).unwrap();
    assert_eq!(table, ContingencyTable::new(3, 4, 5, 8));
    assert_eq!(table.total(), 20);
    assert_eq!(table.category_size(), 7);
    assert_eq!(table.test_size(), 8);
    assert!((table.expected_hits() - 2.8).abs() < 1e-12);
}

#[test]
fn test_contingency_rejects_non_subsets() {
    let db = EntityDatabase::new();
    let reference = Category::from_identifiers("ref", &db, ["a", "b", "c"]);
    let test = Category::from_identifiers("test", &db, ["a", "z"]);
    let cat = Category::from_identifiers("cat", &db, ["b"]);
    let empty = Category::from_identifiers("empty", &db, Vec::<String>::new());

    assert!(matches!(
        ContingencyTable::from_categories(&reference, &test, &cat),
        Err(EnrichError::InvalidInput(_))
    ));
    assert!(matches!(
        ContingencyTable::from_categories(&empty, &cat, &cat),
        Err(EnrichError::InvalidInput(_))
    ));
}
