//! Upload feed: an optional table of alternative product/industry pairs,
//! typically exported from a CRM and dropped next to the catalogue.

use std::io::Read;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const FEED_PRODUCT_COLUMNS: &[&str] = &["Base Name", "Product"];
pub const FEED_INDUSTRY_COLUMN: &str = "Industry";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("could not parse upload feed: {0}")]
    Csv(#[from] csv::Error),
    #[error("upload feed row {index} does not exist ({len} rows loaded)")]
    RowOutOfRange { index: usize, len: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedRow {
    pub index: usize,
    pub product: String,
    pub industry: String,
    #[serde(skip)]
    cells: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadFeed {
    headers: Vec<String>,
    rows: Vec<FeedRow>,
}

impl UploadFeed {
    pub fn parse<R: Read>(reader: R) -> Result<Self, FeedError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.iter().map(str::to_string).collect::<Vec<_>>();

        let product_columns = FEED_PRODUCT_COLUMNS
            .iter()
            .filter_map(|column| headers.iter().position(|header| header == column))
            .collect::<Vec<_>>();
        let industry_column = headers.iter().position(|header| header == FEED_INDUSTRY_COLUMN);

        let mut rows = Vec::new();
        for (index, result) in rdr.records().enumerate() {
            let record = result?;
            let cells = record.iter().map(str::to_string).collect::<Vec<_>>();
            // An empty cell falls through to the next candidate column.
            let product = product_columns
                .iter()
                .filter_map(|idx| cells.get(*idx))
                .find(|value| !value.is_empty())
                .cloned()
                .unwrap_or_default();
            let industry =
                industry_column.and_then(|idx| cells.get(idx)).cloned().unwrap_or_default();

            rows.push(FeedRow { index, product, industry, cells });
        }

        Ok(Self { headers, rows })
    }

    pub fn rows(&self) -> &[FeedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Result<&FeedRow, FeedError> {
        self.rows.get(index).ok_or(FeedError::RowOutOfRange { index, len: self.rows.len() })
    }

    /// First `limit` rows with every original column, keyed by header.
    pub fn preview(&self, limit: usize) -> Vec<Value> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                let mut object = Map::new();
                object.insert("index".to_string(), Value::from(row.index));
                for (header, cell) in self.headers.iter().zip(row.cells.iter()) {
                    object.insert(header.clone(), Value::String(cell.clone()));
                }
                Value::Object(object)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedError, UploadFeed, DEFAULT_PREVIEW_ROWS};

    #[test]
    fn base_name_column_is_preferred() {
        let csv = "Account,Base Name,Product,Industry\nAcme,Widget,Gadget,Apparel\n";
        let feed = UploadFeed::parse(csv.as_bytes()).expect("feed parses");

        let row = feed.row(0).expect("row 0");
        assert_eq!(row.product, "Widget");
        assert_eq!(row.industry, "Apparel");
    }

    #[test]
    fn empty_base_name_falls_back_to_product() {
        let csv = "Base Name,Product,Industry\n,Gadget,Energy\n";
        let feed = UploadFeed::parse(csv.as_bytes()).expect("feed parses");

        assert_eq!(feed.row(0).expect("row 0").product, "Gadget");
    }

    #[test]
    fn missing_columns_yield_empty_values() {
        let csv = "Account,Region\nAcme,West\n";
        let feed = UploadFeed::parse(csv.as_bytes()).expect("feed parses");

        let row = feed.row(0).expect("row 0");
        assert_eq!(row.product, "");
        assert_eq!(row.industry, "");
    }

    #[test]
    fn out_of_range_row_is_reported() {
        let csv = "Product,Industry\nWidget,Apparel\n";
        let feed = UploadFeed::parse(csv.as_bytes()).expect("feed parses");

        assert!(matches!(feed.row(3), Err(FeedError::RowOutOfRange { index: 3, len: 1 })));
    }

    #[test]
    fn preview_is_limited_and_keeps_columns() {
        let mut csv = String::from("Product,Industry\n");
        for idx in 0..8 {
            csv.push_str(&format!("Widget-{idx},Energy\n"));
        }
        let feed = UploadFeed::parse(csv.as_bytes()).expect("feed parses");

        let preview = feed.preview(DEFAULT_PREVIEW_ROWS);
        assert_eq!(feed.len(), 8);
        assert_eq!(preview.len(), 5);
        assert_eq!(preview[4]["index"], 4);
        assert_eq!(preview[4]["Product"], "Widget-4");
        assert_eq!(preview[4]["Industry"], "Energy");
    }
}
