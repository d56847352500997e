//! Workbook (xls/xlsx) extraction: one `Sheet: <name>` header per sheet,
//! then one tab-joined line per non-blank row

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::run_blocking;
use super::types::ExtractionResult;

pub async fn extract_spreadsheet(data: Vec<u8>) -> ExtractionResult {
    run_blocking("Excel", move || workbook_text(data)).await
}

fn workbook_text(data: Vec<u8>) -> Result<String, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| format!("could not open workbook: {}", e))?;

    let mut lines = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| format!("could not read sheet '{}': {}", name, e))?;

        lines.push(format!("Sheet: {}", name));
        for row in range.rows() {
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }
            let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
            lines.push(cells.join("\t"));
        }
    }

    Ok(lines.join("\n"))
}
