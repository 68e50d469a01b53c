use brikksd::clock::SystemClock;
use brikksd::error::SheetsError;
use brikksd::sheets::{parse_table, Grid, SheetsTransport, TabularStore};
use std::collections::BTreeMap;
use std::sync::Arc;

fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

struct FixedGrid(Grid);

impl SheetsTransport for FixedGrid {
    fn read_range(&self, _range: &str) -> Result<Grid, SheetsError> {
        Ok(self.0.clone())
    }
}

#[test]
fn header_only_and_empty_grids_yield_no_rows() {
    assert!(parse_table(&[]).is_empty());
    assert!(parse_table(&grid(&[&["id", "nom"]])).is_empty());
}

#[test]
fn one_mapping_per_data_row_with_normalized_headers() {
    let g = grid(&[
        &["  ID ", "Nom", "CLASSE"],
        &["e1", "Dupont", "6A"],
        &["e2", "Martin", "5B"],
        &["e3", "Durand", "4C"],
    ]);
    let rows = parse_table(&g);
    assert_eq!(rows.len(), g.len() - 1);
    for row in &rows {
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["classe", "id", "nom"]);
    }
    assert_eq!(rows[1]["nom"], "Martin");
    assert_eq!(rows[2]["classe"], "4C");
}

#[test]
fn short_rows_fill_missing_cells_with_empty_strings() {
    let g = grid(&[&["id", "nom", "email"], &["p1"], &["p2", "Leroy"]]);
    let rows = parse_table(&g);
    assert_eq!(rows[0]["nom"], "");
    assert_eq!(rows[0]["email"], "");
    assert_eq!(rows[1]["nom"], "Leroy");
    assert_eq!(rows[1]["email"], "");
}

#[test]
fn duplicate_headers_keep_the_last_column() {
    let g = grid(&[&["id", "Nom", " nom "], &["d1", "premier", "dernier"]]);
    let rows = parse_table(&g);
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[0]["nom"], "dernier");
}

#[test]
fn extra_cells_beyond_headers_are_ignored() {
    let g = grid(&[&["id"], &["x1", "stray"]]);
    let rows = parse_table(&g);
    assert_eq!(rows[0].len(), 1);
    assert_eq!(rows[0]["id"], "x1");
}

#[test]
fn fetch_and_parse_disciplines() {
    let transport = FixedGrid(grid(&[
        &["id", "nom"],
        &["d1", "Histoire"],
        &["d2", "Géographie"],
    ]));
    let store = TabularStore::new(transport, Arc::new(SystemClock));

    let rows = store.fetch_and_parse("DISCIPLINES").expect("fetch disciplines");

    let expected: Vec<BTreeMap<String, String>> = vec![
        [("id", "d1"), ("nom", "Histoire")],
        [("id", "d2"), ("nom", "Géographie")],
    ]
    .into_iter()
    .map(|pairs| {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    })
    .collect();
    assert_eq!(rows, expected);
}
