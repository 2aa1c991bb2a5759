// src/table/mod.rs
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

pub mod utils;

pub use utils::{clean_cell, coerce_int, format_thousands};

/// An in-memory, header-bearing table parsed from CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Column names, in the order the header row declares them.
    pub columns: Vec<String>,
    /// One entry per data row, one cell per column. `None` is a missing cell.
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Position of `name` in the header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the values of one column; yields nothing if the column is absent.
    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = Option<&'a str>> + 'a {
        let idx = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| idx.map(|i| row.get(i).and_then(|c| c.as_deref())))
    }

    /// Same header, only the rows `keep` accepts, in original order.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Option<String>]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

/// Name every header cell uniquely, keeping order.
///
/// A blank cell at position `i` becomes `Unnamed: i`; the second and later
/// occurrences of a name become `name.1`, `name.2`, ... skipping any
/// suffix already taken.
pub fn unique_column_names<'a, I>(header: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::new();
    for (i, raw) in header.into_iter().enumerate() {
        let mut name = if raw.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw.to_string()
        };
        let mut cur = counts.get(&name).copied().unwrap_or(0);
        while cur > 0 {
            counts.insert(name.clone(), cur + 1);
            name = format!("{}.{}", name, cur);
            cur = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), cur + 1);
        out.push(name);
    }
    out
}

/// Parse a CSV document whose first record is the header row.
///
/// Short rows are padded with missing cells; long rows are rejected.
/// Blank and repeated header names are renamed, see [`unique_column_names`].
pub fn parse_csv(data: &[u8]) -> Result<Table> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records = rdr.records();
    let header = match records.next() {
        Some(rec) => rec.context("CSV parse error in header row")?,
        None => bail!("CSV document is empty; expected a header row"),
    };
    let columns = unique_column_names(header.iter());

    let mut rows = Vec::new();
    for (idx, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV parse error after record {}", idx))?;
        // header is line 1
        let line = record.position().map_or(idx as u64 + 2, |p| p.line());
        if record.len() > columns.len() {
            bail!(
                "line {}: expected {} fields, saw {}",
                line,
                columns.len(),
                record.len()
            );
        }
        let mut row: Vec<Option<String>> = record.iter().map(clean_cell).collect();
        row.resize(columns.len(), None);
        rows.push(row);
    }

    debug!(columns = columns.len(), rows = rows.len(), "parsed CSV");
    Ok(Table { columns, rows })
}
