use std::collections::BTreeMap;

pub type Grid = Vec<Vec<String>>;

/// One data row keyed by normalized header.
pub type RowMap = BTreeMap<String, String>;

/// Turns a header-first grid into row mappings.
///
/// Headers are trimmed and lowercased. When two columns share a header the
/// later column wins. Short rows fill the missing cells with "".
pub fn parse_table(grid: &[Vec<String>]) -> Vec<RowMap> {
    if grid.len() < 2 {
        return Vec::new();
    }
    let headers: Vec<String> = grid[0].iter().map(|h| h.trim().to_lowercase()).collect();

    grid[1..]
        .iter()
        .map(|row| {
            let mut out = RowMap::new();
            for (i, header) in headers.iter().enumerate() {
                let cell = row.get(i).cloned().unwrap_or_default();
                out.insert(header.clone(), cell);
            }
            out
        })
        .collect()
}

/// Cell as the spreadsheet API reports it, flattened to text.
pub(crate) fn cell_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
