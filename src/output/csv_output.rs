//! Spreadsheet (CSV) import and export
//!
//! Scraped records are written with the fixed [`ProductRecord::COLUMNS`]
//! header; merged rows keep the union of their columns in first-seen order.

use crate::model::{MergedRow, PriceListingRow, ProductRecord};
use crate::output::{OutputError, OutputResult};
use crate::reconcile::to_camel_case;
use crate::url::{host_label, parse_site_url};
use std::io::{Read, Write};
use std::path::Path;
use url::Url;

/// Deterministic export file name: `<host-label>_<suffix>.csv`
///
/// ```
/// use furnish_scout::output::export_file_name;
/// use url::Url;
///
/// let site = Url::parse("https://www.acme-living.com/it/").unwrap();
/// assert_eq!(export_file_name(&site, "products"), "acme-living_products.csv");
/// ```
pub fn export_file_name(site: &Url, suffix: &str) -> String {
    let label = host_label(site).unwrap_or_else(|| "site".to_string());
    format!("{}_{}.csv", label, suffix)
}

/// Writes product records to any writer
pub fn write_products_to<W: Write>(writer: W, records: &[ProductRecord]) -> OutputResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(ProductRecord::COLUMNS)?;

    for record in records {
        let values: Vec<String> = record.to_columns().into_iter().map(|(_, v)| v).collect();
        csv_writer.write_record(&values)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes product records to a CSV file
pub fn write_products(path: &Path, records: &[ProductRecord]) -> OutputResult<()> {
    let file = std::fs::File::create(path)?;
    write_products_to(file, records)?;
    tracing::info!("Wrote {} products to {}", records.len(), path.display());
    Ok(())
}

/// Writes merged rows to any writer
pub fn write_merged_to<W: Write>(writer: W, rows: &[MergedRow]) -> OutputResult<()> {
    let mut header: Vec<&str> = Vec::new();
    for row in rows {
        for (name, _) in &row.columns {
            if !header.contains(&name.as_str()) {
                header.push(name);
            }
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    if !header.is_empty() {
        csv_writer.write_record(&header)?;
    }

    for row in rows {
        let values: Vec<&str> = header
            .iter()
            .map(|column| row.get(column).unwrap_or(""))
            .collect();
        csv_writer.write_record(&values)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes merged rows to a CSV file
pub fn write_merged(path: &Path, rows: &[MergedRow]) -> OutputResult<()> {
    let file = std::fs::File::create(path)?;
    write_merged_to(file, rows)?;
    tracing::info!("Wrote {} merged rows to {}", rows.len(), path.display());
    Ok(())
}

fn read_table<R: Read>(reader: R) -> OutputResult<(Vec<String>, Vec<Vec<String>>)> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(OutputError::UnsupportedShape(
            "file has no header row".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(|v| v.trim().to_string()).collect());
    }

    Ok((headers, rows))
}

/// Reads a price listing, keeping header order
pub fn read_price_listing_from<R: Read>(reader: R) -> OutputResult<Vec<PriceListingRow>> {
    let (headers, rows) = read_table(reader)?;

    Ok(rows
        .into_iter()
        .filter(|values| values.iter().any(|v| !v.is_empty()))
        .map(|values| {
            let columns = headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), values.get(i).cloned().unwrap_or_default()))
                .collect();
            PriceListingRow::new(columns)
        })
        .collect())
}

pub fn read_price_listing(path: &Path) -> OutputResult<Vec<PriceListingRow>> {
    read_price_listing_from(std::fs::File::open(path)?)
}

/// Parses an image cell: a JSON array or a comma/whitespace separated list
fn parse_image_cell(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Vec::new();
    }
    if cell.starts_with('[') {
        if let Ok(urls) = serde_json::from_str::<Vec<String>>(cell) {
            return urls;
        }
    }
    cell.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads previously exported product records
///
/// Headers are matched after camelCase normalization, so `Product Name` and
/// `product_name` both fill `productName`, ignoring case. A file without a
/// name column is rejected.
pub fn read_products_from<R: Read>(reader: R) -> OutputResult<Vec<ProductRecord>> {
    let (headers, rows) = read_table(reader)?;
    let normalized: Vec<String> = headers.iter().map(|h| to_camel_case(h)).collect();
    let index = |name: &str| normalized.iter().position(|h| h.eq_ignore_ascii_case(name));

    let name_index = index("productName")
        .ok_or_else(|| OutputError::MissingColumn("productName".to_string()))?;
    let description = index("description");
    let product_url = index("productUrl");
    let designer = index("designerName");
    let images = index("imageUrls");
    let furniture_type = index("furnitureType");

    let cell = |values: &Vec<String>, i: Option<usize>| -> String {
        i.and_then(|i| values.get(i)).cloned().unwrap_or_default()
    };

    Ok(rows
        .iter()
        .filter(|values| values.get(name_index).is_some_and(|v| !v.is_empty()))
        .map(|values| ProductRecord {
            product_name: cell(values, Some(name_index)),
            description: cell(values, description),
            product_url: cell(values, product_url),
            designer_name: cell(values, designer),
            image_urls: parse_image_cell(&cell(values, images)),
            furniture_type: cell(values, furniture_type),
        })
        .collect())
}

pub fn read_products(path: &Path) -> OutputResult<Vec<ProductRecord>> {
    read_products_from(std::fs::File::open(path)?)
}

/// Reads the distinct site URLs of a batch file with a `url` column
///
/// The header match ignores case. Cells that are not http(s) URLs are
/// skipped with a warning.
pub fn read_site_list_from<R: Read>(reader: R) -> OutputResult<Vec<Url>> {
    let (headers, rows) = read_table(reader)?;
    let url_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("url"))
        .ok_or_else(|| OutputError::MissingColumn("url".to_string()))?;

    let mut sites: Vec<Url> = Vec::new();
    for values in rows {
        let Some(cell) = values.get(url_index).filter(|v| !v.is_empty()) else {
            continue;
        };
        match parse_site_url(cell) {
            Ok(url) if !sites.contains(&url) => sites.push(url),
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping batch entry '{}': {}", cell, e),
        }
    }

    Ok(sites)
}

pub fn read_site_list(path: &Path) -> OutputResult<Vec<Url>> {
    read_site_list_from(std::fs::File::open(path)?)
}
