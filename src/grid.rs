//! Tabular input: rows, records and the sources that produce them

use std::collections::HashMap;

use crate::error::{Location, TransformResult};

/// One row of optional cell values, indexed by column position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        Self { cells }
    }

    /// Build a row from plain strings; empty strings become blank cells
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = values
            .into_iter()
            .map(Into::into)
            .map(|value: String| (!value.is_empty()).then_some(value))
            .collect();
        Self { cells }
    }

    /// Cell value at `index`, `None` when absent or blank
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells
            .get(index)
            .and_then(|cell| cell.as_deref())
            .filter(|value| !value.trim().is_empty())
    }

    pub fn is_blank(&self, index: usize) -> bool {
        self.cell(index).is_none()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A row together with its position in the table
#[derive(Debug, Clone, Copy)]
pub struct IndexedRow<'a> {
    pub index: usize,
    pub row: &'a Row,
}

/// Consecutive rows grouped under the key cell of the first one
#[derive(Debug, Clone)]
pub struct Record<'a> {
    pub start: usize,
    pub rows: Vec<IndexedRow<'a>>,
}

impl Record<'_> {
    pub fn end(&self) -> usize {
        self.start + self.rows.len()
    }
}

/// What a single visit covers
#[derive(Debug, Clone, Copy)]
pub enum Scope<'s> {
    Row(&'s IndexedRow<'s>),
    Record(&'s Record<'s>),
}

impl<'s> Scope<'s> {
    pub fn rows(&self) -> &'s [IndexedRow<'s>] {
        match *self {
            Scope::Row(row) => std::slice::from_ref(row),
            Scope::Record(record) => &record.rows,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            Scope::Row(row) => Location::Row(row.index),
            Scope::Record(record) => Location::Record(record.start),
        }
    }
}

pub type RowIter<'a> = Box<dyn Iterator<Item = IndexedRow<'a>> + 'a>;
pub type RecordIter<'a> = Box<dyn Iterator<Item = Record<'a>> + 'a>;

/// Lazy, unsorted access to the rows or records that pass the active filter.
///
/// Iterators are finite and release whatever they hold when dropped.
pub trait RowSource {
    fn column_index(&self, name: &str) -> Option<usize>;

    /// Whether the data is organized into multi-row records
    fn has_records(&self) -> bool;

    fn matching_rows(&self) -> TransformResult<RowIter<'_>>;

    fn matching_records(&self) -> TransformResult<RecordIter<'_>>;
}

pub type RowFilter = Box<dyn Fn(&Row) -> bool + Send + Sync>;

/// In-memory table.
///
/// Records follow the usual grid convention: a record starts at a row whose
/// first column is non-blank and extends over the following rows whose first
/// column is blank.
pub struct Table {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    rows: Vec<Row>,
    filter: Option<RowFilter>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            columns,
            column_index,
            rows: Vec::new(),
            filter: None,
        }
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Only rows accepted by `filter` are visited; a record is visited when
    /// any of its rows is accepted
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn accepts(&self, row: &Row) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(row))
    }
}

impl RowSource for Table {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    fn has_records(&self) -> bool {
        self.rows.iter().skip(1).any(|row| row.is_blank(0))
    }

    fn matching_rows(&self) -> TransformResult<RowIter<'_>> {
        Ok(Box::new(
            self.rows
                .iter()
                .enumerate()
                .map(|(index, row)| IndexedRow { index, row })
                .filter(move |indexed| self.accepts(indexed.row)),
        ))
    }

    fn matching_records(&self) -> TransformResult<RecordIter<'_>> {
        let records = Records {
            rows: self.rows.iter().enumerate().peekable(),
        };
        Ok(Box::new(records.filter(move |record| {
            record.rows.iter().any(|indexed| self.accepts(indexed.row))
        })))
    }
}

struct Records<'a> {
    rows: std::iter::Peekable<std::iter::Enumerate<std::slice::Iter<'a, Row>>>,
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, first) = self.rows.next()?;
        let mut rows = vec![IndexedRow {
            index: start,
            row: first,
        }];
        while let Some((index, row)) = self.rows.next_if(|(_, row)| row.is_blank(0)) {
            rows.push(IndexedRow { index, row });
        }
        Some(Record { start, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::new(["id", "name", "phone"]).with_rows([
            Row::from_values(["1", "Alice", "555-1"]),
            Row::from_values(["", "", "555-2"]),
            Row::from_values(["2", "Bob", ""]),
            Row::from_values(["3", "Carol", "555-3"]),
            Row::from_values(["", "", "555-4"]),
            Row::from_values(["", "", "555-5"]),
        ])
    }

    #[test]
    fn test_blank_cells() {
        let row = Row::from_values(["a", "", "  "]);
        assert_eq!(row.cell(0), Some("a"));
        assert!(row.is_blank(1));
        assert!(row.is_blank(2));
        assert!(row.is_blank(7));
    }

    #[test]
    fn test_record_grouping() {
        let table = people();
        assert!(table.has_records());

        let records: Vec<_> = table.matching_records().unwrap().collect();
        let spans: Vec<_> = records.iter().map(|r| (r.start, r.end())).collect();
        assert_eq!(spans, vec![(0, 2), (2, 3), (3, 6)]);
    }

    #[test]
    fn test_flat_table_has_no_records() {
        let table =
            Table::new(["id"]).with_rows([Row::from_values(["1"]), Row::from_values(["2"])]);
        assert!(!table.has_records());
        assert_eq!(table.matching_rows().unwrap().count(), 2);
    }

    #[test]
    fn test_row_filter() {
        let table = people().with_filter(|row| row.cell(2).is_some_and(|p| p.ends_with('5')));
        let rows: Vec<_> = table.matching_rows().unwrap().map(|r| r.index).collect();
        assert_eq!(rows, vec![5]);

        let records: Vec<_> = table.matching_records().unwrap().map(|r| r.start).collect();
        assert_eq!(records, vec![3]);
    }

    #[test]
    fn test_column_lookup() {
        let table = people();
        assert_eq!(table.column_index("name"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }
}
