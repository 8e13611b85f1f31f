pub mod loader;

use crate::domain::product::{BaseRecord, IndustryRecord};

pub use loader::{load_catalog, read_base_table, read_industry_table, CatalogError};

/// One industry pricing sheet, rows kept in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndustryTable {
    pub label: String,
    pub records: Vec<IndustryRecord>,
}

impl IndustryTable {
    pub fn new(label: impl Into<String>, records: Vec<IndustryRecord>) -> Self {
        Self { label: label.into(), records }
    }

    /// First row in table order whose name starts with `product_name`.
    pub fn first_match(&self, product_name: &str) -> Option<&IndustryRecord> {
        self.records.iter().find(|record| record.matches_product(product_name))
    }
}

/// The base catalogue plus every industry sheet. Built once and only read afterwards.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    base: Vec<BaseRecord>,
    industries: Vec<IndustryTable>,
}

impl Catalog {
    pub fn new(base: Vec<BaseRecord>, industries: Vec<IndustryTable>) -> Self {
        Self { base, industries }
    }

    /// Exact name lookup; on duplicate names the first row wins.
    pub fn base_record(&self, name: &str) -> Option<&BaseRecord> {
        self.base.iter().find(|record| record.name == name)
    }

    pub fn industry(&self, label: &str) -> Option<&IndustryTable> {
        self.industries.iter().find(|table| table.label == label)
    }

    pub fn industry_labels(&self) -> Vec<&str> {
        self.industries.iter().map(|table| table.label.as_str()).collect()
    }

    /// Distinct base product names in first-seen order.
    pub fn product_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.base.len());
        for record in &self.base {
            if !names.contains(&record.name.as_str()) {
                names.push(record.name.as_str());
            }
        }
        names
    }

    pub fn base_len(&self) -> usize {
        self.base.len()
    }

    pub fn industry_len(&self) -> usize {
        self.industries.len()
    }
}
