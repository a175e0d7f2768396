use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use super::sheet_name;
use crate::db::ContactRecord;
use crate::error::ExportError;

/// Header row, in column order.
pub const COLUMNS: [&str; 11] = [
    "id",
    "name",
    "address",
    "postcode",
    "skills",
    "other",
    "email_sender",
    "email_subject",
    "email_date",
    "message_id",
    "created_at",
];

fn cells(record: &ContactRecord) -> [String; 11] {
    let c = &record.contact;
    [
        record.id.to_string(),
        c.name.clone(),
        c.address.clone(),
        c.postcode.clone(),
        c.skills.clone(),
        c.other.clone(),
        c.email_sender.clone(),
        c.email_subject.clone(),
        c.email_date.clone(),
        c.message_id.clone(),
        record.created_at.clone(),
    ]
}

/// Renders contacts into an in-memory `.xlsx` workbook.
///
/// One sheet, a styled and frozen header row with an autofilter, and each
/// column sized to its longest value plus two, capped at `max_column_width`.
pub fn contacts_workbook(
    records: &[ContactRecord],
    search: Option<&str>,
    max_column_width: u16,
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(search))?;

    let header_format = Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color(Color::RGB(0xD7E4BC))
        .set_border(FormatBorder::Thin);

    let mut widths: Vec<usize> = COLUMNS.iter().map(|h| h.chars().count()).collect();

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, value) in cells(record).iter().enumerate() {
            widths[col] = widths[col].max(value.chars().count());
            if !value.is_empty() {
                worksheet.write_string(row, col as u16, value)?;
            }
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = (*width + 2).min(usize::from(max_column_width));
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofilter(0, 0, records.len() as u32, (COLUMNS.len() - 1) as u16)?;

    Ok(workbook.save_to_buffer()?)
}
