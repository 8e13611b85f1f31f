use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::{debug, info};

use super::{Catalog, IndustryTable};
use crate::config::CatalogConfig;
use crate::domain::product::{BaseRecord, IndustryRecord, RawQuantity};

pub const BASE_NAME_COLUMNS: &[&str] = &["Base Name", "Name"];
pub const BASE_CODE_COLUMNS: &[&str] = &["Base Code", "Code"];
pub const MOQ_COLUMN: &str = "Minimum Order Quantity";
pub const TERMS_COLUMN: &str = "Payment Terms";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not open catalogue table `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not read catalogue table `{table}`: {source}")]
    Csv { table: String, source: csv::Error },
    #[error("catalogue table `{table}` is missing column `{column}`")]
    MissingColumn { table: String, column: String },
}

/// Reads the base table and every configured industry table, in configured order.
pub fn load_catalog(config: &CatalogConfig) -> Result<Catalog, CatalogError> {
    let base_path = config.dir.join(&config.base_file);
    let base = read_base_table(&config.base_file, open_table(&base_path)?)?;
    debug!(
        event_name = "catalog.load.base_table",
        path = %base_path.display(),
        rows = base.len(),
        "base table loaded"
    );

    let mut industries = Vec::with_capacity(config.industries.len());
    for source in &config.industries {
        let path = config.dir.join(&source.file);
        let table = read_industry_table(&source.label, open_table(&path)?)?;
        debug!(
            event_name = "catalog.load.industry_table",
            industry = %source.label,
            path = %path.display(),
            rows = table.records.len(),
            "industry table loaded"
        );
        industries.push(table);
    }

    let catalog = Catalog::new(base, industries);
    info!(
        event_name = "catalog.load.completed",
        base_rows = catalog.base_len(),
        industry_tables = catalog.industry_len(),
        "catalogue loaded"
    );
    Ok(catalog)
}

fn open_table(path: &Path) -> Result<File, CatalogError> {
    File::open(path).map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })
}

/// Base columns are located by header name.
pub fn read_base_table<R: Read>(table: &str, reader: R) -> Result<Vec<BaseRecord>, CatalogError> {
    let mut rdr = table_reader(reader);
    let headers = read_headers(table, &mut rdr)?;

    let name_idx = find_any_column(table, &headers, BASE_NAME_COLUMNS)?;
    let code_idx = find_any_column(table, &headers, BASE_CODE_COLUMNS)?;
    let moq_idx = find_column(table, &headers, MOQ_COLUMN)?;
    let terms_idx = find_column(table, &headers, TERMS_COLUMN)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|source| CatalogError::Csv { table: table.to_string(), source })?;
        records.push(BaseRecord {
            name: cell(&row, name_idx),
            code: cell(&row, code_idx),
            min_order_qty: RawQuantity::new(cell(&row, moq_idx)),
            payment_terms: cell(&row, terms_idx),
        });
    }

    Ok(records)
}

/// Industry sheets carry name and code in the first two columns whatever their headers say.
pub fn read_industry_table<R: Read>(
    label: &str,
    reader: R,
) -> Result<IndustryTable, CatalogError> {
    let mut rdr = table_reader(reader);
    let headers = read_headers(label, &mut rdr)?;

    if headers.len() < 2 {
        return Err(CatalogError::MissingColumn {
            table: label.to_string(),
            column: if headers.is_empty() { "column 0" } else { "column 1" }.to_string(),
        });
    }
    let moq_idx = find_column(label, &headers, MOQ_COLUMN)?;
    let terms_idx = find_column(label, &headers, TERMS_COLUMN)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|source| CatalogError::Csv { table: label.to_string(), source })?;
        records.push(IndustryRecord {
            name: cell(&row, 0),
            code: cell(&row, 1),
            min_order_qty: RawQuantity::new(cell(&row, moq_idx)),
            payment_terms: cell(&row, terms_idx),
        });
    }

    Ok(IndustryTable::new(label, records))
}

fn table_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new().has_headers(true).flexible(true).trim(Trim::All).from_reader(reader)
}

fn read_headers<R: Read>(
    table: &str,
    rdr: &mut csv::Reader<R>,
) -> Result<Vec<String>, CatalogError> {
    let headers = rdr
        .headers()
        .map_err(|source| CatalogError::Csv { table: table.to_string(), source })?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();
    Ok(headers)
}

fn find_column(table: &str, headers: &[String], column: &str) -> Result<usize, CatalogError> {
    headers.iter().position(|header| header == column).ok_or_else(|| CatalogError::MissingColumn {
        table: table.to_string(),
        column: column.to_string(),
    })
}

fn find_any_column(
    table: &str,
    headers: &[String],
    columns: &[&str],
) -> Result<usize, CatalogError> {
    columns
        .iter()
        .find_map(|column| headers.iter().position(|header| header == column))
        .ok_or_else(|| CatalogError::MissingColumn {
            table: table.to_string(),
            column: columns.join("` or `"),
        })
}

fn cell(row: &StringRecord, idx: usize) -> String {
    row.get(idx).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{load_catalog, read_base_table, read_industry_table, CatalogError};
    use crate::config::{CatalogConfig, IndustrySource};

    #[test]
    fn base_table_accepts_prefixed_headers() {
        let csv = "Base Name,Base Code,Minimum Order Quantity,Payment Terms\nWidget,W1,10,Net 15\n";
        let records = read_base_table("Base.csv", csv.as_bytes()).expect("base table should parse");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Widget");
        assert_eq!(records[0].code, "W1");
        assert_eq!(records[0].min_order_qty.as_str(), "10");
        assert_eq!(records[0].payment_terms, "Net 15");
    }

    #[test]
    fn base_table_accepts_plain_headers_and_trims_cells() {
        let csv = "Name, Code ,Payment Terms,Minimum Order Quantity\n Gadget , G1 ,Net 45, 5 \n";
        let records = read_base_table("Base.csv", csv.as_bytes()).expect("base table should parse");

        assert_eq!(records[0].name, "Gadget");
        assert_eq!(records[0].code, "G1");
        assert_eq!(records[0].min_order_qty.as_str(), "5");
        assert_eq!(records[0].payment_terms, "Net 45");
    }

    #[test]
    fn base_table_without_terms_column_is_rejected() {
        let csv = "Base Name,Base Code,Minimum Order Quantity\nWidget,W1,10\n";
        let error = read_base_table("Base.csv", csv.as_bytes()).expect_err("missing column");

        assert!(matches!(
            error,
            CatalogError::MissingColumn { ref column, .. } if column == "Payment Terms"
        ));
    }

    #[test]
    fn industry_table_reads_name_and_code_positionally() {
        let csv = "Apparel Product,Apparel SKU,Payment Terms,Minimum Order Quantity\n\
                   Widget-A,WA1,Net 30,50\n\
                   Widget-B,WB1,Net 60,75\n";
        let table = read_industry_table("Apparel", csv.as_bytes()).expect("industry table");

        assert_eq!(table.label, "Apparel");
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].name, "Widget-A");
        assert_eq!(table.records[0].code, "WA1");
        assert_eq!(table.records[0].min_order_qty.as_str(), "50");
        assert_eq!(table.records[1].payment_terms, "Net 60");
    }

    #[test]
    fn non_numeric_quantity_survives_loading() {
        let csv = "Product,Code,Minimum Order Quantity,Payment Terms\nWidget-A,WA1,lots,Net 30\n";
        let table = read_industry_table("Energy", csv.as_bytes()).expect("industry table");

        assert_eq!(table.records[0].min_order_qty.as_str(), "lots");
        assert_eq!(table.records[0].min_order_qty.coerce(), None);
    }

    #[test]
    fn load_catalog_reads_configured_files_in_order() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(
            dir.path().join("Base.csv"),
            "Base Name,Base Code,Minimum Order Quantity,Payment Terms\nWidget,W1,10,Net 15\n",
        )
        .expect("write base");
        fs::write(
            dir.path().join("Energy.csv"),
            "Name,Code,Minimum Order Quantity,Payment Terms\nWidget-E,WE1,20,Net 20\n",
        )
        .expect("write energy");
        fs::write(
            dir.path().join("Apparel.csv"),
            "Name,Code,Minimum Order Quantity,Payment Terms\nWidget-A,WA1,50,Net 30\n",
        )
        .expect("write apparel");

        let config = CatalogConfig {
            dir: dir.path().to_path_buf(),
            base_file: "Base.csv".to_string(),
            industries: vec![
                IndustrySource { label: "Energy".to_string(), file: "Energy.csv".to_string() },
                IndustrySource { label: "Apparel".to_string(), file: "Apparel.csv".to_string() },
            ],
        };

        let catalog = load_catalog(&config).expect("catalogue should load");
        assert_eq!(catalog.base_len(), 1);
        assert_eq!(catalog.industry_labels(), vec!["Energy", "Apparel"]);
    }

    #[test]
    fn load_catalog_names_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let config = CatalogConfig {
            dir: dir.path().to_path_buf(),
            base_file: "Base.csv".to_string(),
            industries: Vec::new(),
        };

        let error = load_catalog(&config).expect_err("base table is absent");
        assert!(matches!(error, CatalogError::ReadFile { .. }));
        assert!(error.to_string().contains("Base.csv"));
    }
}
