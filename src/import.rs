//! Base vocabulary import from spreadsheet files (Excel and CSV)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use tracing::info;

use crate::db::{SqliteStore, WordPair};
use crate::error::{BotError, Result};

const WORD_HEADER: &str = "word";
const TRANSLATION_HEADER: &str = "translation";

/// Parse a vocabulary file and load its pairs into `base_words`
pub fn import_file(store: &SqliteStore, path: &Path) -> Result<usize> {
    let pairs = parse_file(path)?;
    let inserted = store.insert_base_words(&pairs)?;
    info!(path = %path.display(), parsed = pairs.len(), inserted, "base vocabulary imported");
    Ok(inserted)
}

/// Parse a file into word pairs, picking the parser by extension
pub fn parse_file(path: &Path) -> Result<Vec<WordPair>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" => parse_excel(path),
        "csv" => parse_csv(path),
        _ => Err(BotError::Import(format!("unsupported file format: .{}", extension))),
    }
}

/// Column positions of the word and its translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMapping {
    word: usize,
    translation: usize,
}

/// Map a header cell onto the canonical column name, if it is one we know
fn canonical_header(header: &str) -> Option<&'static str> {
    match header.trim().to_lowercase().as_str() {
        "word" | "words" | "слово" | "russian" => Some(WORD_HEADER),
        "translation" | "translations" | "перевод" | "english" => Some(TRANSLATION_HEADER),
        _ => None,
    }
}

/// First column carrying each known header wins
fn detect_columns(headers: &[String]) -> Result<ColumnMapping> {
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| canonical_header(h) == Some(name))
    };

    let word = position(WORD_HEADER)
        .ok_or_else(|| BotError::Import("missing required 'word' column in header".to_string()))?;
    let translation = position(TRANSLATION_HEADER).ok_or_else(|| {
        BotError::Import("missing required 'translation' column in header".to_string())
    })?;

    Ok(ColumnMapping { word, translation })
}

/// Missing or blank fields drop the row
fn keep_pair(word: Option<String>, translation: Option<String>) -> Option<WordPair> {
    let word = word.unwrap_or_default();
    let translation = translation.unwrap_or_default();
    let word = word.trim();
    let translation = translation.trim();
    if word.is_empty() || translation.is_empty() {
        return None;
    }
    Some(WordPair::new(word, translation))
}

/// Parse the first sheet of an `.xlsx` or legacy `.xls` workbook
pub fn parse_excel(path: &Path) -> Result<Vec<WordPair>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| BotError::Import(format!("failed to open Excel file: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| BotError::Import("no sheets found in Excel file".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| BotError::Import(format!("failed to read sheet: {}", e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| BotError::Import("empty file - no header row".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(cell_string).collect();
    let mapping = detect_columns(&headers)?;

    let pairs = rows
        .filter_map(|row| {
            keep_pair(
                row.get(mapping.word).map(cell_string),
                row.get(mapping.translation).map(cell_string),
            )
        })
        .collect();
    Ok(pairs)
}

pub fn parse_csv(path: &Path) -> Result<Vec<WordPair>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| BotError::Import(format!("failed to open CSV file: {}", e)))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| BotError::Import(format!("failed to read CSV headers: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();
    let mapping = detect_columns(&headers)?;

    let mut pairs = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| BotError::Import(format!("failed to read CSV row: {}", e)))?;
        let field = |i: usize| record.get(i).map(str::to_string);
        if let Some(pair) = keep_pair(field(mapping.word), field(mapping.translation)) {
            pairs.push(pair);
        }
    }
    Ok(pairs)
}

fn cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}
