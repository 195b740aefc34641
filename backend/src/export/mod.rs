//! Serialization of ranked day tables.
//!
//! - [`write_workbook`] / [`save_workbook`]: one `.xlsx` sheet per day, named
//!   by its `DD_MM` label
//! - [`day_table_to_csv`]: a single day back to CSV (dates in `MM/DD/YY`,
//!   so the output can be fed to the transformer again)

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

use crate::error::{ExportError, ExportResult};
use crate::models::{CampaignRecord, DayTable};
use crate::transform::fields::START_DATE_FORMAT;
use crate::transform::OUTPUT_COLUMNS;

/// File name offered for the three-day workbook.
pub const DEFAULT_WORKBOOK_NAME: &str = "Campaigns_3_days.xlsx";

/// MIME type of `.xlsx` files.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build the workbook in memory.
pub fn build_workbook(sheets: &[(String, &DayTable)]) -> ExportResult<Workbook> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for (label, table) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(label.as_str())?;

        for (col, name) in OUTPUT_COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *name, &header)?;
        }
        for (idx, record) in table.iter().enumerate() {
            write_record(worksheet, idx as u32 + 1, record)?;
        }
    }

    Ok(workbook)
}

/// Workbook bytes, ready to be sent as a download.
pub fn write_workbook(sheets: &[(String, &DayTable)]) -> ExportResult<Vec<u8>> {
    let mut workbook = build_workbook(sheets)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write the workbook to `path`.
pub fn save_workbook(sheets: &[(String, &DayTable)], path: &Path) -> ExportResult<()> {
    let mut workbook = build_workbook(sheets)?;
    workbook.save(path)?;
    Ok(())
}

fn write_record(
    worksheet: &mut Worksheet,
    row: u32,
    record: &CampaignRecord,
) -> ExportResult<()> {
    worksheet.write_string(row, 0, record.campaign.as_str())?;
    worksheet.write_string(row, 1, record.status.as_str())?;
    worksheet.write_string(row, 2, record.start_date.format("%Y-%m-%d").to_string())?;
    if !record.portfolio.is_empty() {
        worksheet.write_string(row, 3, record.portfolio.as_str())?;
    }
    worksheet.write_number(row, 4, record.budget_usd)?;
    worksheet.write_number(row, 5, record.impressions as f64)?;
    worksheet.write_number(row, 6, record.clicks as f64)?;
    worksheet.write_number(row, 7, record.spend_usd)?;
    worksheet.write_number(row, 8, record.cpc_usd)?;
    worksheet.write_number(row, 9, record.orders as f64)?;
    if let Some(acos) = record.acos {
        worksheet.write_number(row, 10, acos)?;
    }
    worksheet.write_number(row, 11, record.viewable_impressions as f64)?;
    worksheet.write_string(row, 12, record.category.label())?;
    if !record.note.is_empty() {
        worksheet.write_string(row, 13, record.note.as_str())?;
    }
    if !record.action.is_empty() {
        worksheet.write_string(row, 14, record.action.as_str())?;
    }
    Ok(())
}

/// One day table as CSV text with the full output header.
pub fn day_table_to_csv(table: &DayTable) -> ExportResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(OUTPUT_COLUMNS)?;

    for record in table {
        writer.write_record([
            record.campaign.clone(),
            record.status.clone(),
            record.start_date.format(START_DATE_FORMAT).to_string(),
            record.portfolio.clone(),
            record.budget_usd.to_string(),
            record.impressions.to_string(),
            record.clicks.to_string(),
            record.spend_usd.to_string(),
            record.cpc_usd.to_string(),
            record.orders.to_string(),
            record.acos.map(|a| a.to_string()).unwrap_or_default(),
            record.viewable_impressions.to_string(),
            record.category.label().to_string(),
            record.note.clone(),
            record.action.clone(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AggregatorSession;
    use crate::test_support::three_days;
    use calamine::{open_workbook_from_rs, Reader, Xlsx};
    use std::io::Cursor;

    #[test]
    fn test_workbook_has_one_sheet_per_day() {
        let session = AggregatorSession::ingest(three_days()).unwrap();
        let bytes = write_workbook(&session.export()).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["03_06", "04_06", "05_06"]);

        let range = workbook.worksheet_range("05_06").unwrap();
        // header + 5 records, 15 columns
        assert_eq!(range.get_size(), (6, 15));
        assert_eq!(range.get_value((0, 0)).map(|c| c.to_string()), Some("Campaigns".to_string()));
        assert_eq!(range.get_value((0, 12)).map(|c| c.to_string()), Some("Category".to_string()));
        assert_eq!(range.get_value((1, 0)).map(|c| c.to_string()), Some("Hats - exact".to_string()));
    }

    #[test]
    fn test_save_workbook_to_disk() {
        let session = AggregatorSession::ingest(three_days()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_WORKBOOK_NAME);

        save_workbook(&session.export(), &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_invalid_sheet_name_is_export_error() {
        let table = DayTable::default();
        let err = write_workbook(&[("bad/name".to_string(), &table)]).unwrap_err();
        assert!(matches!(err, ExportError::Workbook(_)));
    }

    #[test]
    fn test_day_table_to_csv() {
        let days = three_days();
        let csv = day_table_to_csv(&days[0].1).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next().unwrap(), OUTPUT_COLUMNS.join(","));
        assert_eq!(
            lines.next().unwrap(),
            "Hats - exact,Enabled,05/20/24,Main,25,75,7,1.5,0.75,2,0.18,37,1-99,,"
        );
        assert_eq!(csv.lines().count(), 6);
    }
}
