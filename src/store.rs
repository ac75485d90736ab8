//! Durable annotation table backed by a delimited text file.
//!
//! The store owns an in-memory table of label assignments keyed by
//! `(audio name, segment number)` and the file that persists it. Every
//! mutation rewrites the whole file through a temp-file rename, so on return
//! from `upsert` the file always matches the in-memory table exactly. The
//! table is small (one row per labeled segment), which keeps the full
//! rewrite cheap; a larger deployment would want an append log instead.
//!
//! The backing file is a comma-delimited table with a fixed header row.
//! Cells containing commas, quotes, or newlines are double-quoted with `""`
//! escaping. The `Class ID` and `Class Name` cells each hold a comma-joined
//! list of equal length; list items themselves must not contain commas.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::STORE_COLUMNS;
use crate::error::StoreError;

/// One persisted label assignment for a single audio segment.
///
/// `segment_time` is a derived display string (whole seconds, `"5-10"`); the
/// authoritative identity of a row is `(audio_name, segment_number)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub audio_name: String,
    pub file_location: String,
    pub segment_number: u32,
    pub segment_time: String,
    pub class_ids: Vec<u32>,
    pub class_names: Vec<String>,
}

/// In-memory annotation table plus its backing file.
///
/// One instance per process exclusively owns the file; nothing else writes
/// it. Concurrent processes sharing a path are undefined (no locking).
#[derive(Debug)]
pub struct AnnotationStore {
    path: PathBuf,
    records: Vec<AnnotationRecord>,
}

impl AnnotationStore {
    /// Load the table from `path`, or start empty if the file is missing.
    ///
    /// A file that exists but does not parse under the fixed schema fails
    /// with [`StoreError::Corrupt`]; nothing is repaired or discarded.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                records: Vec::new(),
            });
        }

        let contents = fs::read_to_string(path)?;
        let records = parse_table(&contents).map_err(|(line, reason)| StoreError::Corrupt {
            path: path.to_path_buf(),
            line,
            reason,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Empty table on the same path, for recovering from a corrupt file the
    /// user has chosen to abandon. The file on disk is left untouched until
    /// the next `upsert` rewrites it.
    pub fn reinitialize(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert or replace the row for `(record.audio_name,
    /// record.segment_number)`, then rewrite the backing file.
    ///
    /// A record with empty class lists is stored as an explicit empty-label
    /// row; rows are never deleted. If the rewrite fails, the in-memory
    /// table is rolled back to its pre-call state.
    pub fn upsert(&mut self, record: AnnotationRecord) -> Result<(), StoreError> {
        match self.position(&record.audio_name, record.segment_number) {
            Some(index) => {
                let previous = std::mem::replace(&mut self.records[index], record);
                if let Err(e) = self.persist() {
                    self.records[index] = previous;
                    return Err(StoreError::Io(e));
                }
            }
            None => {
                self.records.push(record);
                if let Err(e) = self.persist() {
                    self.records.pop();
                    return Err(StoreError::Io(e));
                }
            }
        }
        Ok(())
    }

    /// The row for `(audio_name, segment_number)`, if any.
    pub fn get(&self, audio_name: &str, segment_number: u32) -> Option<&AnnotationRecord> {
        self.position(audio_name, segment_number)
            .map(|index| &self.records[index])
    }

    /// Every row, in insertion/file order.
    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    /// True iff at least one row exists for `audio_name`, including rows
    /// with empty class lists.
    pub fn is_audio_annotated(&self, audio_name: &str) -> bool {
        self.records.iter().any(|r| r.audio_name == audio_name)
    }

    /// The whole table serialized in the backing-file format. Used by the
    /// export command.
    pub fn to_table_string(&self) -> String {
        render_table(&self.records)
    }

    fn position(&self, audio_name: &str, segment_number: u32) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.audio_name == audio_name && r.segment_number == segment_number)
    }

    // Full rewrite through a temp file in the same directory; the rename
    // makes the new table visible only once it is completely on disk.
    fn persist(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, render_table(&self.records))?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn render_table(records: &[AnnotationRecord]) -> String {
    let mut out = String::new();
    write_row(&mut out, &STORE_COLUMNS);

    for record in records {
        let segment_number = record.segment_number.to_string();
        let class_ids = record
            .class_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let class_names = record.class_names.join(",");

        write_row(
            &mut out,
            &[
                record.audio_name.as_str(),
                record.file_location.as_str(),
                segment_number.as_str(),
                record.segment_time.as_str(),
                class_ids.as_str(),
                class_names.as_str(),
            ],
        );
    }

    out
}

fn write_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, field);
    }
    out.push('\n');
}

fn write_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        for ch in field.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

type ParseFailure = (usize, String);

fn parse_table(contents: &str) -> Result<Vec<AnnotationRecord>, ParseFailure> {
    let mut rows = parse_rows(contents)?.into_iter();

    let Some((header_line, header)) = rows.next() else {
        return Err((1, "missing header row".to_string()));
    };
    if header.len() != STORE_COLUMNS.len()
        || header
            .iter()
            .zip(STORE_COLUMNS.iter())
            .any(|(got, want)| got.as_str() != *want)
    {
        return Err((
            header_line,
            format!("unexpected header, expected columns {STORE_COLUMNS:?}"),
        ));
    }

    let mut records = Vec::new();
    for (line, row) in rows {
        let found = row.len();
        let [audio_name, file_location, segment_number, segment_time, class_ids, class_names]: [String; 6] =
            row.try_into().map_err(|_| {
                (
                    line,
                    format!("expected {} columns, found {found}", STORE_COLUMNS.len()),
                )
            })?;

        let segment_number: u32 = segment_number
            .parse()
            .map_err(|_| (line, format!("invalid segment number '{segment_number}'")))?;

        let class_ids = parse_id_list(&class_ids).map_err(|bad| (line, format!("invalid class id '{bad}'")))?;
        let class_names = parse_name_list(&class_names);
        if class_ids.len() != class_names.len() {
            return Err((
                line,
                format!(
                    "class id and class name lists differ in length ({} vs {})",
                    class_ids.len(),
                    class_names.len()
                ),
            ));
        }

        records.push(AnnotationRecord {
            audio_name,
            file_location,
            segment_number,
            segment_time,
            class_ids,
            class_names,
        });
    }

    Ok(records)
}

// Reads the full text because quoted cells may span lines. Returns each row
// with the line number it started on.
fn parse_rows(contents: &str) -> Result<Vec<(usize, Vec<String>)>, ParseFailure> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted_field = false;
    let mut line = 1;
    let mut row_line = 1;

    let mut chars = contents.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() && !quoted_field => {
                in_quotes = true;
                quoted_field = true;
            }
            '"' => return Err((line, "unexpected quote inside cell".to_string())),
            ',' => {
                row.push(std::mem::take(&mut field));
                quoted_field = false;
            }
            '\r' => {}
            '\n' => {
                line += 1;
                row.push(std::mem::take(&mut field));
                rows.push((row_line, std::mem::take(&mut row)));
                quoted_field = false;
                row_line = line;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err((row_line, "unterminated quoted cell".to_string()));
    }
    if !field.is_empty() || !row.is_empty() || quoted_field {
        row.push(field);
        rows.push((row_line, row));
    }

    Ok(rows)
}

fn parse_id_list(cell: &str) -> Result<Vec<u32>, String> {
    if cell.is_empty() {
        return Ok(Vec::new());
    }
    cell.split(',')
        .map(|item| item.trim().parse::<u32>().map_err(|_| item.to_string()))
        .collect()
}

fn parse_name_list(cell: &str) -> Vec<String> {
    if cell.is_empty() {
        return Vec::new();
    }
    cell.split(',').map(|item| item.to_string()).collect()
}
