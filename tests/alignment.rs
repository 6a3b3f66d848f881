mod common;

use common::{grid, keyed_left, keyed_right};
use xldiff::diff::compare_sheets;
use xldiff::{
    align_grids, materialize, CellValue, CompareMode, GridRow, Key, KeyColumns, KeyPart, MatchRecord,
    Options, Sheet, Side,
};

fn rows_of(records: &[MatchRecord]) -> Vec<(Option<usize>, Option<usize>)> {
    records.iter().map(|r| (r.left_row, r.right_row)).collect()
}

fn text_key(parts: &[&str]) -> Key {
    Key::new(parts.iter().map(|p| KeyPart::Text(p.to_string())).collect())
}

#[test]
fn single_key_fixture_aligns_like_a_merge_join() {
    let records = align_grids(&keyed_left(), &keyed_right(), &KeyColumns::Single(1), true);

    assert_eq!(
        rows_of(&records),
        vec![
            (Some(2), Some(2)),
            (Some(3), Some(3)),
            (Some(5), None),
            (Some(4), Some(4)),
        ]
    );
    let keys: Vec<String> = records.iter().map(|r| r.key.to_string()).collect();
    assert_eq!(keys, vec!["Row 1", "Row 2", "Row 3", "Row 4"]);
}

#[test]
fn one_element_column_list_matches_the_single_key() {
    let single = align_grids(&keyed_left(), &keyed_right(), &KeyColumns::Single(1), true);
    let list = align_grids(&keyed_left(), &keyed_right(), &KeyColumns::Composite(vec![1]), true);
    assert_eq!(rows_of(&single), rows_of(&list));
}

#[test]
fn composite_key_compares_each_position_on_its_own_type() {
    let records = align_grids(
        &keyed_left(),
        &keyed_right(),
        &KeyColumns::Composite(vec![1, 2]),
        true,
    );

    // Column 2 holds "z", so every value at that position is compared as text and
    // the right-hand date-time no longer matches "1/1/2019".
    assert_eq!(
        rows_of(&records),
        vec![
            (Some(2), Some(2)),
            (Some(3), Some(3)),
            (Some(5), None),
            (Some(4), None),
            (None, Some(4)),
        ]
    );
    assert_eq!(records[0].key, text_key(&["Row 1", "1"]));
    assert_eq!(records[3].key, text_key(&["Row 4", "1/1/2019"]));
    assert_eq!(records[4].key, text_key(&["Row 4", "2019-01-01 00:00:00"]));
}

#[test]
fn numeric_keys_sort_as_numbers() {
    let left = grid(&[&["id"], &["10"], &["9"], &["100"]]);
    let right = grid(&[&["id"], &["9"], &["100"]]);
    let records = align_grids(&left, &right, &KeyColumns::Single(1), true);

    assert_eq!(
        rows_of(&records),
        vec![(Some(3), Some(2)), (Some(2), None), (Some(4), Some(3))]
    );
    assert_eq!(records[0].key.as_scalar(), Some(&KeyPart::Number(9.0)));
}

#[test]
fn one_text_value_turns_the_whole_key_column_to_text() {
    let left = grid(&[&["id"], &["10"], &["9"]]);
    let right = grid(&[&["id"], &["x"]]);
    let records = align_grids(&left, &right, &KeyColumns::Single(1), true);

    // lexicographic: "10" < "9" < "x"
    assert_eq!(
        rows_of(&records),
        vec![(Some(2), None), (Some(3), None), (None, Some(2))]
    );
}

#[test]
fn without_header_the_first_row_is_keyed() {
    let left = grid(&[&["b"], &["a"]]);
    let right = grid(&[&["a"]]);
    let records = align_grids(&left, &right, &KeyColumns::Single(1), false);
    assert_eq!(rows_of(&records), vec![(Some(2), Some(1)), (Some(1), None)]);
}

#[test]
fn materialized_sides_line_up_row_by_row() {
    let records = align_grids(&keyed_left(), &keyed_right(), &KeyColumns::Single(1), true);
    let left = materialize(&keyed_left(), &records, Side::Left, true);
    let right = materialize(&keyed_right(), &records, Side::Right, true);

    assert_eq!(left.max_row(), right.max_row());
    let first_col: Vec<String> = (1..=left.max_row()).map(|r| left.cell(r, 1).to_string()).collect();
    assert_eq!(first_col, vec!["Header", "Row 1", "Row 2", "Row 3", "Row 4"]);
    assert_eq!(right.row(4), Some(&GridRow::Missing));
    assert_eq!(right.cell(5, 1), &CellValue::Text("Row 4".into()));
}

#[test]
fn sorted_comparison_of_the_fixture() {
    let opts = Options {
        compare_mode: CompareMode::Sorted,
        key_columns: Some(KeyColumns::Single(1)),
        ..Options::default()
    };
    let section = compare_sheets(
        &Sheet::new("Sheet1", keyed_left()),
        &Sheet::new("Sheet1", keyed_right()),
        "Sheet1",
        &opts,
    )
    .unwrap();

    let different: Vec<(usize, usize)> = section
        .block
        .rows
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, c)| c.diff.is_different(opts.threshold))
                .map(move |(c, _)| (r + 1, c + 1))
        })
        .collect();

    // Only the unmatched "Row 3" differs; "1/1/2019" and the date-time agree as dates.
    assert_eq!(different, vec![(4, 1), (4, 2)]);
}
