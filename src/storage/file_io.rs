//! JSON file primitives
//!
//! Two layouts are used on disk. Entity and settings files are whole JSON
//! documents replaced atomically on every change. The audit log is JSON
//! lines, only ever appended to.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::AuditError;

/// Read JSON from a file, returning a default value if the file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, AuditError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| AuditError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, sync, then rename)
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AuditError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Temp file must live in the same directory for the rename to be atomic
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| AuditError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| AuditError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| AuditError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| AuditError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        AuditError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Append one value as a single JSON line and flush it
///
/// The value is serialized before the file is touched, so a serialization
/// failure never leaves a partial line behind.
pub fn append_json_line<T, P>(path: P, value: &T) -> Result<(), AuditError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let mut line = serde_json::to_string(value)
        .map_err(|e| AuditError::Json(format!("Failed to serialize line: {}", e)))?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    file.write_all(line.as_bytes())
        .map_err(|e| AuditError::Io(format!("Failed to append to {}: {}", path.display(), e)))?;

    file.flush()
        .map_err(|e| AuditError::Io(format!("Failed to flush {}: {}", path.display(), e)))
}

/// Read every non-blank line of a JSON lines file, in file order
///
/// A missing file reads as empty.
pub fn read_json_lines<T, P>(path: P) -> Result<Vec<T>, AuditError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut values = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            AuditError::Io(format!("Failed to read {} line {}: {}", path.display(), index + 1, e))
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let value = serde_json::from_str(&line).map_err(|e| {
            AuditError::Json(format!(
                "Failed to parse {} line {}: {}",
                path.display(),
                index + 1,
                e
            ))
        })?;
        values.push(value);
    }

    Ok(values)
}

/// Count the non-blank lines of a JSON lines file without parsing them
pub fn count_json_lines<P: AsRef<Path>>(path: P) -> Result<usize, AuditError> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(0);
    }

    let file = File::open(path)
        .map_err(|e| AuditError::Io(format!("Failed to open {}: {}", path.display(), e)))?;

    Ok(BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|line| !line.trim().is_empty())
        .count())
}
