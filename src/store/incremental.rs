use crate::error::{HarvestError, Result};
use crate::store::dataset::{Dataset, dedup_keep_last, merge};
use crate::store::record::{Record, Schema};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// When duplicate rows are collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Every page is merged into the artifact with duplicates collapsed
    #[default]
    Merge,
    /// Pages are appended as-is; a separate dedup pass runs after the run
    PostPass,
}

/// What happened to one page's records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The artifact was rewritten and now holds `total` rows
    Written { rows: usize, total: usize },
    /// The page had no records; nothing was written
    Skipped,
    /// Persisting failed; the page's rows went to a backup file instead
    Backup { path: PathBuf, rows: usize },
}

/// Row counts from a standalone dedup pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupReport {
    pub input_rows: usize,
    pub output_rows: usize,
}

impl DedupReport {
    pub fn removed(&self) -> usize {
        self.input_rows - self.output_rows
    }
}

/// The run's single output artifact, rewritten in full after every page
#[derive(Debug, Clone)]
pub struct IncrementalStore {
    path: PathBuf,
    schema: Schema,
    mode: DedupMode,
}

impl IncrementalStore {
    pub fn new(path: impl Into<PathBuf>, schema: Schema, mode: DedupMode) -> Self {
        Self { path: path.into(), schema, mode }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read the persisted dataset; a missing artifact is an empty dataset
    pub fn load(&self) -> Result<Dataset> {
        let records = self.load_rows()?;
        Ok(match self.mode {
            DedupMode::Merge => Dataset::from_records(self.schema.clone(), records),
            DedupMode::PostPass => Dataset::from_raw(self.schema.clone(), records),
        })
    }

    /// Persist one page's records.
    ///
    /// Any failure to read or write the artifact is recovered by writing the
    /// page to [`Self::backup_path`]; only a failed backup is returned as an error.
    pub fn merge_page(&self, page: usize, records: &[Record]) -> Result<MergeOutcome> {
        if records.is_empty() {
            log::info!("Page {} produced no records, nothing to save", page);
            return Ok(MergeOutcome::Skipped);
        }

        match self.persist(records) {
            Ok(total) => {
                log::info!("Saved {} rows from page {} to {} ({} total)", records.len(), page, self.path.display(), total);
                Ok(MergeOutcome::Written { rows: records.len(), total })
            }
            Err(e) => {
                log::error!("Failed to save page {}: {}", page, e);
                let backup = self.backup_path(page);
                write_atomic(&backup, &self.schema, records)?;
                log::warn!("Saved page {} to backup file {}", page, backup.display());
                Ok(MergeOutcome::Backup { path: backup, rows: records.len() })
            }
        }
    }

    /// `<output>_page_<n>_backup.csv`, next to the artifact
    pub fn backup_path(&self, page: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!("_page_{}_backup.csv", page));
        PathBuf::from(name)
    }

    fn persist(&self, records: &[Record]) -> Result<usize> {
        if let Some(record) = records.iter().find(|r| r.schema() != &self.schema) {
            return Err(HarvestError::SchemaMismatch {
                path: self.path.clone(),
                expected: self.schema.columns().to_vec(),
                found: record.schema().columns().to_vec(),
            });
        }

        let existing = self.load()?;
        let updated = match self.mode {
            DedupMode::Merge => merge(&existing, records),
            DedupMode::PostPass => merge_without_dedup(existing, records.to_vec()),
        };

        write_atomic(&self.path, &self.schema, updated.records())?;
        Ok(updated.len())
    }

    fn load_rows(&self) -> Result<Vec<Record>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let (header, rows) = read_csv(&self.path)?;
        if header.as_slice() != self.schema.columns() {
            return Err(HarvestError::SchemaMismatch {
                path: self.path.clone(),
                expected: self.schema.columns().to_vec(),
                found: header,
            });
        }
        rows.into_iter().map(|values| self.schema.record(values)).collect()
    }
}

fn merge_without_dedup(existing: Dataset, records: Vec<Record>) -> Dataset {
    let schema = existing.schema().clone();
    let mut all = existing.into_records();
    all.extend(records);
    Dataset::from_raw(schema, all)
}

/// Collapse exact duplicate rows of `input` into a new artifact at `output`.
///
/// The input is left untouched and the output is always written, even when no
/// row was removed.
pub fn deduplicate(input: &Path, output: &Path) -> Result<DedupReport> {
    if same_file(input, output) {
        return Err(HarvestError::Config(format!(
            "dedup output {} must differ from its input",
            output.display()
        )));
    }

    let (header, rows) = read_csv(input)?;
    let schema = Schema::new(header);
    let records: Vec<Record> = rows.into_iter().map(|values| schema.record(values)).collect::<Result<_>>()?;

    let input_rows = records.len();
    let unique = dedup_keep_last(records);
    write_atomic(output, &schema, &unique)?;

    let report = DedupReport { input_rows, output_rows: unique.len() };
    log::info!(
        "Deduplicated {} -> {}: {} rows in, {} out ({} removed)",
        input.display(),
        output.display(),
        report.input_rows,
        report.output_rows,
        report.removed()
    );
    Ok(report)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|row| row.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<std::result::Result<_, csv::Error>>()?;
    Ok((header, rows))
}

/// Write to a sibling temp file, then rename over `path`
fn write_atomic(path: &Path, schema: &Schema, records: &[Record]) -> Result<()> {
    let persistence = |reason: String| HarvestError::Persistence { path: path.to_path_buf(), reason };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| persistence(e.to_string()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let written = (|| -> Result<()> {
        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(schema.columns())?;
        for record in records {
            writer.write_record(record.values())?;
        }
        writer.flush()?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(persistence(e.to_string()));
    }

    fs::rename(&tmp, path).map_err(|e| persistence(e.to_string()))
}
