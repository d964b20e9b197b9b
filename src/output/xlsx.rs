//! xlsx report writer
//!
//! The workbook is assembled in memory and written once through a temporary
//! file in the destination directory, so an interrupted or failed export
//! leaves any previous file at `path` untouched.

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{
    format_review_timestamp, ExportSummary, OutputError, OutputResult, COLUMN_WIDTHS, FORMATTED_SHEET,
    HEADER, PLACE_COLUMNS, UNFORMATTED_SHEET,
};
use crate::shutdown::ShutdownCoordinator;
use crate::EnrichedPlace;

/// Rows a place occupies on the formatted sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceBlock {
    /// Index into the exported place list
    pub index: usize,
    /// 1-based position in the exported place list, written to the `No.` column.
    /// Places skipped for lack of reviews keep their number, leaving a gap.
    pub number: usize,
    /// First data row (0-based, header is row 0)
    pub first_row: u32,
    /// Last data row, inclusive
    pub last_row: u32,
}

impl PlaceBlock {
    /// Number of review rows in the block
    pub fn rows(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    /// Whether the place columns are merged
    pub fn is_merged(&self) -> bool {
        self.rows() > 1
    }

    /// Compute the blocks of `places`; places without reviews get none
    pub fn layout(places: &[EnrichedPlace]) -> Vec<PlaceBlock> {
        let mut blocks = Vec::with_capacity(places.len());
        let mut next_row = 1u32;

        for (index, place) in places.iter().enumerate() {
            let reviews = place.reviews.len() as u32;
            if reviews == 0 {
                continue;
            }
            blocks.push(PlaceBlock {
                index,
                number: index + 1,
                first_row: next_row,
                last_row: next_row + reviews - 1,
            });
            next_row += reviews;
        }

        blocks
    }
}

/// Place column values of one place, in header order
struct PlaceCells<'a> {
    number: f64,
    lat: f64,
    lng: f64,
    name: &'a str,
    place_id: &'a str,
    types: String,
}

impl<'a> PlaceCells<'a> {
    fn new(number: usize, place: &'a EnrichedPlace) -> Self {
        Self {
            number: number as f64,
            lat: place.candidate.latitude,
            lng: place.candidate.longitude,
            name: &place.candidate.name,
            place_id: &place.candidate.place_id,
            types: place.candidate.types_joined(),
        }
    }

    fn write_row(&self, sheet: &mut Worksheet, row: u32) -> OutputResult<()> {
        sheet.write_number(row, 0, self.number)?;
        sheet.write_number(row, 1, self.lat)?;
        sheet.write_number(row, 2, self.lng)?;
        sheet.write_string(row, 3, self.name)?;
        sheet.write_string(row, 4, self.place_id)?;
        sheet.write_string(row, 5, &self.types)?;
        Ok(())
    }

    fn write_merged(&self, sheet: &mut Worksheet, first: u32, last: u32, format: &Format) -> OutputResult<()> {
        // merge_range takes a string; numeric cells are rewritten afterwards.
        for col in 0..PLACE_COLUMNS {
            sheet.merge_range(first, col, last, col, "", format)?;
        }
        sheet.write_number_with_format(first, 0, self.number, format)?;
        sheet.write_number_with_format(first, 1, self.lat, format)?;
        sheet.write_number_with_format(first, 2, self.lng, format)?;
        sheet.write_string_with_format(first, 3, self.name, format)?;
        sheet.write_string_with_format(first, 4, self.place_id, format)?;
        sheet.write_string_with_format(first, 5, &self.types, format)?;
        Ok(())
    }
}

fn new_sheet(name: &str, bold: &Format) -> OutputResult<Worksheet> {
    let mut sheet = Worksheet::new();
    sheet.set_name(name)?;
    for (col, title) in HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, bold)?;
    }
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    Ok(sheet)
}

fn write_review(sheet: &mut Worksheet, row: u32, author: &str, text: &str, time: &str) -> OutputResult<()> {
    sheet.write_string(row, PLACE_COLUMNS, author)?;
    sheet.write_string(row, PLACE_COLUMNS + 1, text)?;
    sheet.write_string(row, PLACE_COLUMNS + 2, time)?;
    Ok(())
}

/// Assemble the two-sheet workbook for `places`
///
/// Cancellation is checked before each place block on either sheet;
/// `Ok(None)` means the export was cancelled.
pub fn build_workbook(
    places: &[EnrichedPlace],
    shutdown: &ShutdownCoordinator,
) -> OutputResult<Option<(Workbook, ExportSummary)>> {
    let bold = Format::new().set_bold();
    let merged = Format::new().set_align(FormatAlign::Top);
    let blocks = PlaceBlock::layout(places);
    let mut summary = ExportSummary {
        places: blocks.len(),
        ..ExportSummary::default()
    };

    let mut formatted = new_sheet(FORMATTED_SHEET, &bold)?;
    for block in &blocks {
        if shutdown.is_shutdown_requested() {
            debug!(place = block.number, "Export cancelled on formatted sheet");
            return Ok(None);
        }
        let place = &places[block.index];
        let cells = PlaceCells::new(block.number, place);

        if block.is_merged() {
            cells.write_merged(&mut formatted, block.first_row, block.last_row, &merged)?;
            summary.merged_blocks += 1;
        } else {
            cells.write_row(&mut formatted, block.first_row)?;
        }

        for (offset, review) in place.reviews.iter().enumerate() {
            let time = format_review_timestamp(review.unix_timestamp)?;
            write_review(
                &mut formatted,
                block.first_row + offset as u32,
                &review.author_name,
                &review.text,
                &time,
            )?;
            summary.formatted_rows += 1;
        }
    }

    let mut unformatted = new_sheet(UNFORMATTED_SHEET, &bold)?;
    let mut row = 1u32;
    for block in &blocks {
        if shutdown.is_shutdown_requested() {
            debug!(place = block.number, "Export cancelled on unformatted sheet");
            return Ok(None);
        }
        let place = &places[block.index];
        let cells = PlaceCells::new(block.number, place);

        for review in &place.reviews {
            let time = format_review_timestamp(review.unix_timestamp)?;
            cells.write_row(&mut unformatted, row)?;
            write_review(&mut unformatted, row, &review.author_name, &review.text, &time)?;
            summary.unformatted_rows += 1;
            row += 1;
        }
    }

    let mut workbook = Workbook::new();
    workbook.push_worksheet(formatted);
    workbook.push_worksheet(unformatted);

    Ok(Some((workbook, summary)))
}

/// Export `places` to `path`
///
/// Returns `Ok(None)` when cancelled; nothing is written in that case.
pub fn export_workbook(
    path: &Path,
    places: &[EnrichedPlace],
    shutdown: &ShutdownCoordinator,
) -> OutputResult<Option<ExportSummary>> {
    info!("Writing workbook: path={}", path.display());

    let Some((mut workbook, summary)) = build_workbook(places, shutdown)? else {
        return Ok(None);
    };
    let buffer = workbook.save_to_buffer()?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|e| OutputError::IoError(format!("Failed to create temp file: {e}")))?;
    tmp.write_all(&buffer)
        .map_err(|e| OutputError::IoError(format!("Failed to write workbook: {e}")))?;
    tmp.flush()
        .map_err(|e| OutputError::IoError(format!("Failed to flush workbook: {e}")))?;
    tmp.persist(path)
        .map_err(|e| OutputError::IoError(format!("Failed to persist workbook: {}", e.error)))?;

    debug!(
        places = summary.places,
        rows = summary.unformatted_rows,
        merged = summary.merged_blocks,
        "Workbook written"
    );
    Ok(Some(summary))
}
