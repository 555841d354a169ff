use super::batch::batch_sizes;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("No files selected")]
    Empty,

    #[error("Invalid relative path '{0}'")]
    InvalidPath(String),

    #[error("Path '{0}' appears more than once in the selection")]
    DuplicatePath(String),

    #[error("Selection exceeds configured limits: {0}")]
    LimitsExceeded(String),
}

/// Non-blocking notice about an unusually large selection.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionWarning {
    TooManyFiles { count: usize, limit: usize },
    TooLarge { total_bytes: u64, limit: u64 },
}

impl std::fmt::Display for SelectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionWarning::TooManyFiles { count, limit } => {
                write!(f, "{} files selected (recommended max {})", count, limit)
            }
            SelectionWarning::TooLarge { total_bytes, limit } => write!(
                f,
                "{} MB selected (recommended max {} MB)",
                total_bytes / 1024 / 1024,
                limit / 1024 / 1024
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SelectionLimits {
    pub max_files: usize,
    pub max_total_bytes: u64,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SelectionSummary {
    pub file_count: usize,
    pub total_bytes: u64,
    pub is_folder: bool,
    pub suggested_title: Option<String>,
    pub warnings: Vec<SelectionWarning>,
    /// Sizes of the upload batches this selection splits into
    pub batch_sizes: Vec<usize>,
}

impl SelectionSummary {
    /// Turns warnings into a blocking error when the caller asked for strict mode.
    pub fn enforce(&self, strict: bool) -> Result<(), SelectionError> {
        if strict && !self.warnings.is_empty() {
            let reasons: Vec<String> = self.warnings.iter().map(|w| w.to_string()).collect();
            return Err(SelectionError::LimitsExceeded(reasons.join("; ")));
        }
        Ok(())
    }
}

/// A file picked for upload, keyed by its path relative to the selection root.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub relative_path: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Validated set of files, either a single file or a directory tree.
#[derive(Debug, Clone)]
pub struct Selection {
    files: Vec<SelectedFile>,
}

impl Selection {
    pub fn new(files: Vec<SelectedFile>) -> Result<Self, SelectionError> {
        if files.is_empty() {
            return Err(SelectionError::Empty);
        }

        let mut seen = HashSet::with_capacity(files.len());
        let mut normalized = Vec::with_capacity(files.len());
        for mut file in files {
            file.relative_path = normalize_relative_path(&file.relative_path)?;
            if !seen.insert(file.relative_path.clone()) {
                return Err(SelectionError::DuplicatePath(file.relative_path));
            }
            normalized.push(file);
        }

        Ok(Self { files: normalized })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(SelectedFile::size).sum()
    }

    pub fn summary(&self, limits: &SelectionLimits) -> SelectionSummary {
        summarize(
            self.files
                .iter()
                .map(|f| (f.relative_path.as_str(), f.size())),
            limits,
        )
    }

    pub fn into_files(self) -> Vec<SelectedFile> {
        self.files
    }
}

/// Computes count, size, warnings and the batch plan for `(relative_path, size)` pairs.
/// Paths are expected to be normalized already.
pub fn summarize<'a>(
    entries: impl Iterator<Item = (&'a str, u64)>,
    limits: &SelectionLimits,
) -> SelectionSummary {
    let mut file_count = 0usize;
    let mut total_bytes = 0u64;
    let mut roots: HashSet<&str> = HashSet::new();
    let mut nested = false;

    for (path, size) in entries {
        file_count += 1;
        total_bytes += size;
        match path.split_once('/') {
            Some((root, _)) => {
                nested = true;
                roots.insert(root);
            }
            None => {
                roots.insert(path);
            }
        }
    }

    let mut warnings = Vec::new();
    if file_count > limits.max_files {
        warnings.push(SelectionWarning::TooManyFiles {
            count: file_count,
            limit: limits.max_files,
        });
    }
    if total_bytes > limits.max_total_bytes {
        warnings.push(SelectionWarning::TooLarge {
            total_bytes,
            limit: limits.max_total_bytes,
        });
    }

    // A directory pick arrives as paths sharing one top-level directory.
    let suggested_title = if nested && roots.len() == 1 {
        roots.into_iter().next().map(str::to_string)
    } else {
        None
    };

    SelectionSummary {
        file_count,
        total_bytes,
        is_folder: nested || file_count > 1,
        suggested_title,
        warnings,
        batch_sizes: batch_sizes(file_count, limits.batch_size),
    }
}

/// Normalizes a browser-supplied relative path into a storage-safe key suffix.
pub fn normalize_relative_path(raw: &str) -> Result<String, SelectionError> {
    let unified = raw.replace('\\', "/");
    let mut parts = Vec::new();

    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(SelectionError::InvalidPath(raw.to_string())),
            p if p.chars().any(|c| c.is_control()) => {
                return Err(SelectionError::InvalidPath(raw.to_string()));
            }
            p => parts.push(p),
        }
    }

    if parts.is_empty() {
        return Err(SelectionError::InvalidPath(raw.to_string()));
    }
    Ok(parts.join("/"))
}
