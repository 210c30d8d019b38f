//! In-memory view of the published workbook.
//!
//! The workbook is parsed once per session and every read after that is a
//! synchronous lookup. Two read views are exposed over any named sheet:
//! positional rows (for sheets addressed by column index) and header-keyed
//! records (for sheets addressed by column name).

use crate::coerce::{clean_text, Cell};
use crate::Result;
use anyhow::Context;
use calamine::{Data, Reader, Xlsx};
use std::collections::HashMap;
use std::io::Cursor;

/// All sheets of the workbook, with blank rows dropped and cell positions
/// preserved as absolute column indexes.
#[derive(Debug, Default, Clone)]
pub struct Workbook {
    sheets: HashMap<String, Vec<Vec<Cell>>>,
}

impl Workbook {
    /// Parses a downloaded XLSX byte buffer.
    pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Self> {
        let mut xlsx: Xlsx<_> =
            Xlsx::new(Cursor::new(bytes)).context("Unable to parse workbook bytes as XLSX")?;
        let names = xlsx.sheet_names().to_owned();
        let mut sheets = HashMap::new();
        for name in names {
            let range = xlsx
                .worksheet_range(&name)
                .with_context(|| format!("Unable to read sheet '{name}'"))?;
            // The used range can start anywhere; pad the leading columns so
            // positional access matches the sheet's real column letters.
            let col_offset = range.start().map(|(_, c)| c as usize).unwrap_or(0);
            let rows = range
                .rows()
                .map(|row| {
                    let mut cells = vec![Cell::Empty; col_offset];
                    cells.extend(row.iter().map(convert_cell));
                    cells
                })
                .filter(|row| row.iter().any(|c| !c.is_blank()))
                .collect();
            sheets.insert(name, rows);
        }
        Ok(Self { sheets })
    }

    /// Builds a workbook directly from rows. Used by tests and by anything
    /// that already has tabular data in hand.
    pub fn from_sheets<N, R>(sheets: impl IntoIterator<Item = (N, R)>) -> Self
    where
        N: Into<String>,
        R: IntoIterator<Item = Vec<Cell>>,
    {
        let sheets = sheets
            .into_iter()
            .map(|(name, rows)| {
                let rows = rows
                    .into_iter()
                    .filter(|row| row.iter().any(|c| !c.is_blank()))
                    .collect();
                (name.into(), rows)
            })
            .collect();
        Self { sheets }
    }

    /// All non-blank rows of a sheet as positional arrays. A missing sheet is
    /// an empty-data condition, not an error.
    pub fn rows(&self, sheet_name: &str) -> &[Vec<Cell>] {
        self.sheets
            .get(sheet_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Header-keyed records built from the row at `header_row`. Header names
    /// are cleaned of non-breaking spaces and trimmed; blank header cells are
    /// dropped as keys.
    pub fn records(&self, sheet_name: &str, header_row: usize) -> Vec<Record> {
        let rows = self.rows(sheet_name);
        let Some(header_cells) = rows.get(header_row) else {
            return Vec::new();
        };
        let headers: Vec<String> = header_cells.iter().map(|c| clean_text(&c.text())).collect();
        rows[header_row + 1..]
            .iter()
            .map(|row| {
                let fields = headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, c)| (h.clone(), c.clone()))
                    .collect();
                Record { fields }
            })
            .collect()
    }
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => crate::coerce::datetime_from_serial(dt.as_f64())
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

/// One sheet row keyed by header name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Record {
    fields: HashMap<String, Cell>,
}

impl Record {
    pub fn new(fields: impl IntoIterator<Item = (String, Cell)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.fields.get(name)
    }

    /// Resolves a logical field against a fixed, ordered list of known column
    /// name variants. The first alias with a non-blank cell wins. The sheets
    /// were renamed more than once over the years and old column spellings
    /// survive in some tabs.
    pub fn first_of(&self, aliases: &[&str]) -> Option<&Cell> {
        aliases
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .find(|cell| !cell.is_blank())
    }
}
