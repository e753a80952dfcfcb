use async_trait::async_trait;
use model::{
    core::resource::ResourceType,
    filter::ImportOptions,
    records::{outcome::UpsertReport, record::Record},
};

/// External transform/upsert collaborator boundary.
///
/// The batch processor calls this once per record that survives post-filtering.
/// The collaborator owns field mapping and target-system writes, including the
/// new-vs-existing decision when `options.filters.only_new` is set; it reports
/// failures through the returned classification rather than an error, so one
/// bad record never aborts the page.
#[async_trait]
pub trait EntityUpserter: Send + Sync {
    async fn upsert(
        &self,
        resource: ResourceType,
        record: &Record,
        options: &ImportOptions,
    ) -> UpsertReport;
}
