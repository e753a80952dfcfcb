use async_trait::async_trait;
use engine_processing::upsert::EntityUpserter;
use model::{
    core::resource::ResourceType,
    filter::ImportOptions,
    records::{
        outcome::{UpsertOutcome, UpsertReport},
        record::Record,
    },
};
use std::{
    collections::HashSet,
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
    sync::Mutex,
};
use tracing::debug;

/// Upsert collaborator for the CLI: appends each record as one JSON line to
/// `<dir>/<resource>.jsonl`, keyed by the record's stable id.
///
/// A record whose id was already written in this process is classified as
/// `updated` (or `skipped` under `only_new`); records without an id fail.
pub struct FileExportUpserter {
    dir: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl FileExportUpserter {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileExportUpserter {
            dir,
            seen: Mutex::new(HashSet::new()),
        })
    }

    fn append(&self, resource: ResourceType, record: &Record) -> std::io::Result<()> {
        let path = self.dir.join(format!("{resource}.jsonl"));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", record.0)?;
        Ok(())
    }
}

#[async_trait]
impl EntityUpserter for FileExportUpserter {
    async fn upsert(
        &self,
        resource: ResourceType,
        record: &Record,
        options: &ImportOptions,
    ) -> UpsertReport {
        let Some(id) = record.id() else {
            return UpsertReport::failed("record has no id");
        };

        let already_seen = !self.seen.lock().unwrap().insert(id.to_string());
        if already_seen && options.filters.only_new {
            return UpsertReport::skipped("already exported");
        }

        match self.append(resource, record) {
            Ok(()) => {
                debug!(resource = %resource, id, "Exported record");
                let outcome = if already_seen {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Imported
                };
                UpsertReport::new(outcome)
            }
            Err(e) => UpsertReport::failed(format!("write failed: {e}")),
        }
    }
}
