//! Workbook export read back with calamine

use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

use places_downloader::output::{export_workbook, FORMATTED_SHEET, HEADER, UNFORMATTED_SHEET};
use places_downloader::shutdown::ShutdownCoordinator;
use places_downloader::EnrichedPlace;

use crate::support::{candidate, review};

fn place(id: &str, reviews: usize) -> EnrichedPlace {
    EnrichedPlace {
        candidate: candidate(id),
        reviews: (0..reviews).map(review).collect(),
        photos: vec![],
    }
}

fn read_sheet(path: &Path, name: &str) -> calamine::Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opens");
    workbook.worksheet_range(name).expect("sheet exists")
}

/// Merged ranges of `sheet` as ((first_row, first_col), (last_row, last_col)), sorted
fn merged_regions(path: &Path, sheet: &str) -> Vec<((u32, u32), (u32, u32))> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opens");
    workbook.load_merged_regions().expect("merged regions load");
    let mut regions: Vec<_> = workbook
        .merged_regions_by_sheet(sheet)
        .into_iter()
        .map(|(_, _, dims)| (dims.start, dims.end))
        .collect();
    regions.sort();
    regions
}

fn block_regions(first: u32, last: u32) -> Vec<((u32, u32), (u32, u32))> {
    (0..6u32).map(|col| ((first, col), (last, col))).collect()
}

fn is_blank(cell: Option<&Data>) -> bool {
    matches!(cell, None | Some(Data::Empty))
}

#[test]
fn test_sheets_and_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.xlsx");

    export_workbook(&path, &[place("a", 1)], &ShutdownCoordinator::new())
        .unwrap()
        .unwrap();

    let workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec![FORMATTED_SHEET.to_string(), UNFORMATTED_SHEET.to_string()]
    );

    for sheet in [FORMATTED_SHEET, UNFORMATTED_SHEET] {
        let range = read_sheet(&path, sheet);
        for (col, title) in HEADER.iter().enumerate() {
            assert_eq!(
                range.get_value((0, col as u32)),
                Some(&Data::String(title.to_string()))
            );
        }
    }
}

#[test]
fn test_three_places_two_reviews_each() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("reviews.xlsx");
    let places = vec![place("a", 2), place("b", 2), place("c", 2)];

    let summary = export_workbook(&path, &places, &ShutdownCoordinator::new())
        .unwrap()
        .unwrap();

    assert_eq!(summary.places, 3);
    assert_eq!(summary.formatted_rows, 6);
    assert_eq!(summary.unformatted_rows, 6);
    assert_eq!(summary.merged_blocks, 3);

    let flat = read_sheet(&path, UNFORMATTED_SHEET);
    assert_eq!(flat.height(), 7);
    for row in 1..=6u32 {
        let number = ((row - 1) / 2 + 1) as f64;
        assert_eq!(flat.get_value((row, 0)), Some(&Data::Float(number)));
        assert_eq!(flat.get_value((row, 1)), Some(&Data::Float(12.97)));
        assert_eq!(flat.get_value((row, 5)), Some(&Data::String("cafe, food".to_string())));
    }
    assert_eq!(flat.get_value((2, 6)), Some(&Data::String("Author 1".to_string())));
    assert_eq!(
        flat.get_value((1, 8)),
        Some(&Data::String("Tuesday, 14 November, 2023".to_string()))
    );

    let formatted = read_sheet(&path, FORMATTED_SHEET);
    for (first, id) in [(1u32, "a"), (3, "b"), (5, "c")] {
        assert_eq!(formatted.get_value((first, 4)), Some(&Data::String(id.to_string())));
        for col in 0..6u32 {
            assert!(is_blank(formatted.get_value((first + 1, col))));
        }
        assert_eq!(
            formatted.get_value((first + 1, 7)),
            Some(&Data::String("Review text 1".to_string()))
        );
    }
}

#[test]
fn test_place_without_reviews_keeps_numbering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.xlsx");
    let places = vec![place("a", 1), place("b", 0), place("c", 1)];

    let summary = export_workbook(&path, &places, &ShutdownCoordinator::new())
        .unwrap()
        .unwrap();

    assert_eq!(summary.places, 2);
    assert_eq!(summary.merged_blocks, 0);

    let flat = read_sheet(&path, UNFORMATTED_SHEET);
    assert_eq!(flat.get_value((1, 0)), Some(&Data::Float(1.0)));
    assert_eq!(flat.get_value((2, 0)), Some(&Data::Float(3.0)));
    assert_eq!(flat.get_value((2, 4)), Some(&Data::String("c".to_string())));
}

#[test]
fn test_empty_export_has_headers_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.xlsx");

    let summary = export_workbook(&path, &[], &ShutdownCoordinator::new())
        .unwrap()
        .unwrap();

    assert_eq!(summary.unformatted_rows, 0);
    assert_eq!(read_sheet(&path, UNFORMATTED_SHEET).height(), 1);
}

#[test]
fn test_cancelled_export_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.xlsx");
    let shutdown = ShutdownCoordinator::new();
    shutdown.request_shutdown();

    let result = export_workbook(&path, &[place("a", 2)], &shutdown).unwrap();

    assert!(result.is_none());
    assert!(!path.exists());
}

#[test]
fn test_unwritable_destination_fails() {
    let dir = tempfile::tempdir().unwrap();
    // Destination is an existing directory
    let result = export_workbook(dir.path(), &[place("a", 1)], &ShutdownCoordinator::new());

    assert!(result.is_err());
}

#[test]
fn test_merged_regions_follow_review_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reviews.xlsx");
    let places = vec![place("a", 2), place("b", 1), place("c", 3)];

    export_workbook(&path, &places, &ShutdownCoordinator::new())
        .unwrap()
        .unwrap();

    let mut expected = block_regions(1, 2);
    expected.extend(block_regions(4, 6));
    expected.sort();
    assert_eq!(merged_regions(&path, FORMATTED_SHEET), expected);

    // The single-review place on row 3 is written plainly
    let formatted = read_sheet(&path, FORMATTED_SHEET);
    assert_eq!(formatted.get_value((3, 4)), Some(&Data::String("b".to_string())));

    assert!(merged_regions(&path, UNFORMATTED_SHEET).is_empty());
}
