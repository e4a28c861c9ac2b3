use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook, Worksheet};

use super::{Cell, Table};
use crate::core::{PipelineError, Result};

/// Read the first worksheet of an `.xlsx`/`.xls` workbook. The first row
/// becomes the header row.
pub fn read_first_sheet(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| PipelineError::EmptyWorkbook(path.to_path_buf()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| convert_cell(cell).to_text().unwrap_or_default())
            .collect(),
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(convert_cell).collect());
    }
    Ok(table)
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Cell::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Write a single table to a one-sheet workbook.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<()> {
    write_sheets(path, &[("Sheet1", table)])
}

/// Write several named sheets into one workbook.
///
/// Document properties carry a fixed creation date, so writing the same
/// tables twice yields identical files.
pub fn write_sheets(path: impl AsRef<Path>, sheets: &[(&str, &Table)]) -> Result<()> {
    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    for (name, table) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        write_worksheet(worksheet, table)?;
    }

    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    workbook.save(path.as_ref())?;
    Ok(())
}

fn write_worksheet(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header.as_str())?;
    }
    for (row_index, row) in table.rows.iter().enumerate() {
        let excel_row = row_index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) if s.is_empty() => {}
                Cell::Text(s) => {
                    worksheet.write_string(excel_row, col, s.as_str())?;
                }
                Cell::Int(i) => {
                    worksheet.write_number(excel_row, col, *i as f64)?;
                }
                Cell::Float(f) if f.is_nan() => {}
                Cell::Float(f) => {
                    worksheet.write_number(excel_row, col, *f)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(excel_row, col, *b)?;
                }
            }
        }
    }
    Ok(())
}
