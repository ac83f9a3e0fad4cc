#![cfg(not(tarpaulin_include))]

use crate::store::Table;

/// Convert a table to CSV
///
/// The first line holds the column names. Fields containing commas, quotes or
/// line breaks are quoted, with embedded quotes doubled.
///
/// # Examples
/// ```
/// use ams::store::Table;
/// use ams::downloader::to_csv;
///
/// let table = Table::with_rows(&["NAME", "DATE"], vec![vec!["Ana".into(), "01/02/2024\n(ONLINE)".into()]]);
/// assert_eq!(to_csv(&table), "NAME,DATE\nAna,\"01/02/2024\n(ONLINE)\"\n");
/// ```
pub fn to_csv(table: &Table) -> String {
    let mut csv_content = String::new();
    push_record(&mut csv_content, &table.columns);
    for row in &table.rows {
        push_record(&mut csv_content, row);
    }
    csv_content
}

fn push_record(out: &mut String, fields: &[String]) {
    for (i, value) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
            let escaped = value.replace('"', "\"\"");
            out.push_str(&format!("\"{}\"", escaped));
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
}

/// Convert a table to XLSX
///
/// Column names go in the first row. Cells that read as integers are written
/// as numbers so the sheet can sum ages; everything else stays text.
#[cfg(feature = "web")]
pub fn to_xlsx(table: &Table, sheet_name: &str) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (c, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, name, &header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            match value.parse::<i64>() {
                Ok(n) => worksheet.write_number(r, c as u16, n as f64)?,
                Err(_) => worksheet.write_string(r, c as u16, value)?,
            };
        }
    }

    workbook.save_to_buffer()
}
