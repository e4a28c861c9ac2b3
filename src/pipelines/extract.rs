//! Stage 1: pull comments out of every export in a folder and union them.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::{PipelineError, Result};
use crate::record::{columns, parse_date, raw_table, CommentRecord};
use crate::table::{read_first_sheet, write_table, Table};
use crate::utils::is_hex_id;

/// Label marking a reply in the comment-type column.
pub const CHILD_COMMENT_LABEL: &str = "子评论";

const SPREADSHEET_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Which thread column an export carries. Resolved once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadColumn {
    ParentId,
    CommentType,
}

impl ThreadColumn {
    /// Pick the column set an export matches. The parent-id set wins when
    /// a file carries both.
    pub fn resolve(table: &Table) -> Option<Self> {
        [ThreadColumn::ParentId, ThreadColumn::CommentType]
            .into_iter()
            .find(|candidate| table.has_columns(&candidate.required_columns()))
    }

    pub fn column_name(self) -> &'static str {
        match self {
            ThreadColumn::ParentId => columns::PARENT_ID,
            ThreadColumn::CommentType => columns::COMMENT_TYPE,
        }
    }

    fn required_columns(self) -> [&'static str; 4] {
        [
            columns::TEXT,
            self.column_name(),
            columns::COMMENT_TIME,
            columns::IP_LOCATION,
        ]
    }

    pub fn marker(self, value: Option<String>) -> ThreadMarker {
        match self {
            ThreadColumn::ParentId => ThreadMarker::ParentId(value),
            ThreadColumn::CommentType => ThreadMarker::CommentType(value),
        }
    }
}

/// The thread discriminator of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadMarker {
    ParentId(Option<String>),
    CommentType(Option<String>),
}

impl ThreadMarker {
    /// Replies carry a hexadecimal parent ID or the child-comment label.
    pub fn is_top_level(&self) -> bool {
        match self {
            ThreadMarker::ParentId(Some(id)) => !is_hex_id(id),
            ThreadMarker::CommentType(Some(kind)) => kind != CHILD_COMMENT_LABEL,
            ThreadMarker::ParentId(None) | ThreadMarker::CommentType(None) => true,
        }
    }
}

/// Campaign-content label of an export: its file name without directory
/// or extension.
pub fn campaign_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extract the comments of a single export.
pub fn extract_comments(path: impl AsRef<Path>) -> Result<Vec<CommentRecord>> {
    let path = path.as_ref();
    let table = read_first_sheet(path)?;
    let thread = ThreadColumn::resolve(&table).ok_or_else(|| PipelineError::MissingColumns {
        file: path.to_path_buf(),
    })?;

    let text = table.require_column(columns::TEXT)?;
    let time = table.require_column(columns::COMMENT_TIME)?;
    let ip = table.require_column(columns::IP_LOCATION)?;
    let discriminator = table.require_column(thread.column_name())?;
    let label = campaign_label(path);

    let records = table
        .rows
        .iter()
        .filter_map(|row| {
            let comment = row[text].to_text()?;
            let marker = thread.marker(row[discriminator].to_text());
            Some(CommentRecord::new(
                comment,
                parse_date(&row[time]),
                row[ip].to_text(),
                label.clone(),
                marker.is_top_level(),
            ))
        })
        .collect();
    Ok(records)
}

/// Spreadsheet files of a folder, sorted by name so repeated runs see the
/// same order.
pub fn spreadsheet_files(folder: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy())
                .is_some_and(|name| SPREADSHEET_EXTENSIONS.iter().any(|ext| name.ends_with(ext)))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Extract every export in `folder` and concatenate the results in file
/// order. Files that fail are logged and skipped; the call only fails when
/// no file could be extracted.
pub fn process_folder(folder: impl AsRef<Path>) -> Result<Vec<CommentRecord>> {
    let folder = folder.as_ref();
    let files = spreadsheet_files(folder)?;
    info!("found {} spreadsheet files in {}", files.len(), folder.display());

    let mut combined = Vec::new();
    let mut extracted_files = 0usize;
    for file in &files {
        info!("processing {}", file.display());
        match extract_comments(file) {
            Ok(records) => {
                info!("extracted {} comments", records.len());
                combined.extend(records);
                extracted_files += 1;
            }
            Err(e) => warn!("skipping {}: {e}", file.display()),
        }
    }

    if extracted_files == 0 {
        return Err(PipelineError::NoInputFiles(folder.to_path_buf()));
    }
    info!(
        "extracted {} comments from {extracted_files} of {} files",
        combined.len(),
        files.len()
    );
    Ok(combined)
}

/// Run stage 1 and persist the unioned sheet to `output`.
pub fn extract_to_file(
    folder: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<Vec<CommentRecord>> {
    let records = process_folder(folder)?;
    write_table(output.as_ref(), &raw_table(&records))?;
    info!("raw comments saved to {}", output.as_ref().display());
    Ok(records)
}
