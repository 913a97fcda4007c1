use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::mem::take;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::StoreError;
use crate::store::{DrawStore, select_new};
use crate::types::{AppendResult, DrawRecord};
use crate::utils::{format_scraped_at, parse_scraped_at};

pub const HEADER: [&str; 4] = ["Game ID", "Timestamp", "Numbers", "Scraped At"];

/// Draw store kept as a comma-separated file with a header row.
///
/// Existing bytes are never rewritten: new draws are appended after them.
/// The file is created on the first write that admits a draw.
#[derive(Debug, Clone)]
pub struct CsvDrawStore {
    path: PathBuf,
}

enum Stored {
    Missing,
    /// Present but holding no text at all.
    Blank,
    Rows {
        records: Vec<DrawRecord>,
        ends_with_newline: bool,
    },
}

impl CsvDrawStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_stored(&self) -> Result<Stored, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Stored::Missing),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let text = String::from_utf8(bytes)
            .map_err(|_| StoreError::corrupt(&self.path, None, "file is not valid UTF-8"))?;
        let body = text.strip_prefix('\u{feff}').unwrap_or(&text);
        if body.trim().is_empty() {
            return Ok(Stored::Blank);
        }

        let mut rows = parse_rows(body, ',')
            .map_err(|line| StoreError::corrupt(&self.path, Some(line), "unterminated quoted field"))?
            .into_iter();

        match rows.next() {
            Some((line, header)) if !is_header(&header) => {
                return Err(StoreError::corrupt(
                    &self.path,
                    Some(line),
                    format!("expected header {:?}, found {:?}", HEADER, header),
                ));
            }
            _ => {}
        }

        let mut records = Vec::new();
        for (line, fields) in rows {
            records.push(self.record_from_fields(line, fields)?);
        }

        Ok(Stored::Rows {
            records,
            ends_with_newline: text.ends_with('\n'),
        })
    }

    fn record_from_fields(&self, line: usize, fields: Vec<String>) -> Result<DrawRecord, StoreError> {
        let [game_id, draw_timestamp, numbers, scraped_at]: [String; 4] = fields
            .try_into()
            .map_err(|f: Vec<String>| {
                StoreError::corrupt(&self.path, Some(line), format!("expected 4 fields, found {}", f.len()))
            })?;

        let game_id = game_id.trim().to_string();
        if game_id.is_empty() {
            return Err(StoreError::corrupt(&self.path, Some(line), "empty Game ID"));
        }

        let scraped_at = parse_scraped_at(&scraped_at).map_err(|e| {
            StoreError::corrupt(&self.path, Some(line), format!("bad Scraped At {:?}: {}", scraped_at, e))
        })?;

        Ok(DrawRecord {
            game_id,
            draw_timestamp,
            numbers,
            scraped_at,
        })
    }

    fn write_fresh(&self, records: &[DrawRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }

        let mut buf = Vec::new();
        let header: Vec<String> = HEADER.iter().map(|h| h.to_string()).collect();
        write_row(&mut buf, &header, ',').map_err(|e| StoreError::io(&self.path, e))?;
        write_records(&mut buf, records).map_err(|e| StoreError::io(&self.path, e))?;

        // Build the whole file beside the target, then swap it in.
        let tmp = tmp_path(&self.path);
        let written = fs::File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(&buf)?;
                f.sync_all()
            })
            .and_then(|_| fs::rename(&tmp, &self.path));

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(StoreError::io(&self.path, e));
        }
        Ok(())
    }

    fn append(&self, records: &[DrawRecord], ends_with_newline: bool) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        if !ends_with_newline {
            buf.push(b'\n');
        }
        write_records(&mut buf, records).map_err(|e| StoreError::io(&self.path, e))?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        file.write_all(&buf)
            .and_then(|_| file.sync_all())
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

impl DrawStore for CsvDrawStore {
    fn load_all(&self) -> Result<Vec<DrawRecord>, StoreError> {
        match self.read_stored()? {
            Stored::Missing | Stored::Blank => Ok(Vec::new()),
            Stored::Rows { records, .. } => Ok(records),
        }
    }

    fn merge_and_append(&mut self, batch: &[DrawRecord]) -> Result<AppendResult, StoreError> {
        let stored = self.read_stored()?;
        let existing = match &stored {
            Stored::Rows { records, .. } => records.as_slice(),
            Stored::Missing | Stored::Blank => &[],
        };

        let fresh = select_new(existing, batch);
        let result = AppendResult {
            added_count: fresh.len(),
            total_count: existing.len() + fresh.len(),
        };

        if fresh.is_empty() {
            info!("No new draws found. Data is up to date.");
            return Ok(result);
        }

        match stored {
            Stored::Missing => {
                self.write_fresh(&fresh)?;
                info!("📁 Created {} with {} draws.", self.path.display(), fresh.len());
            }
            Stored::Blank => {
                self.write_fresh(&fresh)?;
                info!("File {} was empty. Wrote {} draws.", self.path.display(), fresh.len());
            }
            Stored::Rows { ends_with_newline, .. } => {
                self.append(&fresh, ends_with_newline)?;
                info!("Added {} new draws to {}.", fresh.len(), self.path.display());
            }
        }

        Ok(result)
    }
}

fn is_header(fields: &[String]) -> bool {
    fields.len() == HEADER.len() && fields.iter().zip(HEADER).all(|(f, h)| f.trim() == h)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_records<W: Write>(mut w: W, records: &[DrawRecord]) -> io::Result<()> {
    for record in records {
        let row = [
            record.game_id.clone(),
            record.draw_timestamp.clone(),
            record.numbers.clone(),
            format_scraped_at(&record.scraped_at),
        ];
        write_row(&mut w, &row, ',')?;
    }
    Ok(())
}

/// Parse delimited text into rows tagged with their starting line number.
/// Blank lines are skipped. An unterminated quote is an error carrying the
/// line on which the quoted field began.
fn parse_rows(text: &str, sep: char) -> Result<Vec<(usize, Vec<String>)>, usize> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut quote_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => {
                in_quotes = true;
                quote_line = line;
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push((row_line, take(&mut row)));
                } else {
                    row.clear();
                }
                line += 1;
                row_line = line;
            }
            c => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        }
    }

    if in_quotes {
        return Err(quote_line);
    }

    row.push(field);
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push((row_line, row));
    }

    Ok(rows)
}

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, "{}", sep)?;
        } else {
            first = false;
        }
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}
