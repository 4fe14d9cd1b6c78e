use ionstream::search::{
    binary_search,
    index_range,
    DefaultTo,
};

const MZS: [f64; 6] = [100.0, 100.5, 101.0, 101.0, 102.0, 250.0];

#[test]
fn test_default_to_policies() {
    assert_eq!(binary_search(&MZS, 100.5, DefaultTo::ClosestValue).unwrap(), 1);
    assert_eq!(binary_search(&MZS, 101.9, DefaultTo::ClosestValue).unwrap(), 4);
    assert_eq!(binary_search(&MZS, 100.7, DefaultTo::MinusInsertionPoint).unwrap(), -3);
    assert_eq!(binary_search(&MZS, 101.0, DefaultTo::GreaterEquals).unwrap(), 2);
    assert_eq!(binary_search(&MZS, 101.0, DefaultTo::LessEquals).unwrap(), 3);
    assert_eq!(binary_search(&MZS, 300.0, DefaultTo::GreaterEquals).unwrap(), -1);
    assert_eq!(binary_search(&MZS, 50.0, DefaultTo::LessEquals).unwrap(), -1);
    assert!(binary_search(&[], 1.0, DefaultTo::ClosestValue).is_err());
}

#[test]
fn test_index_range_selects_window() {
    let range = index_range(&MZS, 100.2, 101.5);
    assert_eq!(range.min(), Some(1));
    assert_eq!(range.max_inclusive(), Some(3));
    assert_eq!(range.slice(&MZS), &[100.5, 101.0, 101.0]);

    let range = index_range(&MZS, 150.0, 200.0);
    assert!(range.is_empty());
    assert_eq!(range.len(), 0);
}
