//! Unit tests for partial record merging and record sets.

use rowseed::record::{merge_add, PartialRecord, PartialRecords, Record, Records};
use rowseed::schema::{ColumnId, ColumnType, Identifier, Table, TableId};

fn partial(pairs: &[(u16, &str)]) -> PartialRecord {
    PartialRecord::from_pairs(
        pairs
            .iter()
            .map(|(c, v)| (ColumnId(*c), Some(v.to_string()))),
    )
}

#[test]
fn test_disjoint_records_merge_into_one() {
    let mut partials = PartialRecords::new();
    merge_add(&mut partials, partial(&[(3, "c")]));
    merge_add(&mut partials, partial(&[(1, "a"), (5, "e")]));

    assert_eq!(partials.len(), 1);
    let merged = partials.iter().next().unwrap();
    assert_eq!(merged.columns(), &[ColumnId(1), ColumnId(3), ColumnId(5)]);
    assert_eq!(
        merged.values(),
        &[Some("a".into()), Some("c".into()), Some("e".into())]
    );
}

#[test]
fn test_overlapping_records_stay_apart() {
    let mut partials = PartialRecords::new();
    partials.merge_add(partial(&[(0, "x")]));
    partials.merge_add(partial(&[(0, "y")]));

    let entries = partials.into_vec();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].get(ColumnId(0)), Some(&Some("x".to_string())));
    assert_eq!(entries[1].get(ColumnId(0)), Some(&Some("y".to_string())));
}

#[test]
fn test_first_fit() {
    let mut partials = PartialRecords::new();
    partials.merge_add(partial(&[(0, "a1")]));
    partials.merge_add(partial(&[(0, "a2")]));
    partials.merge_add(partial(&[(1, "b1")]));
    partials.merge_add(partial(&[(1, "b2")]));
    partials.merge_add(partial(&[(0, "a3"), (2, "c1")]));

    let entries = partials.into_vec();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].columns(), &[ColumnId(0), ColumnId(1)]);
    assert_eq!(entries[1].columns(), &[ColumnId(0), ColumnId(1)]);
    assert_eq!(entries[2].columns(), &[ColumnId(0), ColumnId(2)]);
}

#[test]
fn test_columns_stay_strictly_ascending() {
    let mut partials = PartialRecords::new();
    for (c, v) in [(4, "d"), (2, "b"), (9, "i"), (0, "z"), (2, "b2")] {
        partials.merge_add(partial(&[(c, v)]));
    }
    for entry in &partials {
        assert!(entry.columns().windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_null_values_are_kept() {
    let mut partials = PartialRecords::new();
    partials.merge_add(PartialRecord::new().with(ColumnId(2), None::<String>));
    partials.merge_add(PartialRecord::new().with(ColumnId(1), "v".to_string()));

    let entry = partials.iter().next().unwrap();
    assert_eq!(entry.get(ColumnId(2)), Some(&None));
    assert_eq!(entry.get(ColumnId(1)), Some(&Some("v".to_string())));
}

#[test]
fn test_empty_record_is_ignored() {
    let mut partials = PartialRecords::new();
    partials.merge_add(PartialRecord::new());
    assert!(partials.is_empty());
}

#[test]
fn test_records_values_in_column_order() {
    let mut table = Table::new(Identifier::parse("public.t"), TableId(0));
    table.add_column("a", ColumnType::base("int4"));
    table.add_column("b", ColumnType::base("text"));
    table.add_column("c", ColumnType::base("text"));

    let mut records = Records::new(&table, &[ColumnId(0), ColumnId(2)]);
    records.push(Record::from_pairs(vec![
        (ColumnId(2), Some("z".into())),
        (ColumnId(0), Some("1".into())),
    ]));

    let names: Vec<&str> = records.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"]);
    let row = &records.rows()[0];
    let values: Vec<_> = records.row_values(row).cloned().collect();
    assert_eq!(values, vec![Some("1".to_string()), Some("z".to_string())]);
}
