use async_trait::async_trait;
use connectors::{
    error::FetchError,
    graphql::client::GraphQlClient,
    transport::Transport,
};
use model::{
    core::resource::ResourceType,
    filter::ImportFilters,
    pagination::cursor::Cursor,
    records::page::{CountResult, PageResult},
};

/// Read side of an import source.
///
/// The engine only ever pulls one page at a time so a failed batch can
/// resume from the persisted cursor. Tests swap in scripted sources.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_page(
        &self,
        resource: ResourceType,
        filters: &ImportFilters,
        page_size: u32,
        after: &Cursor,
    ) -> Result<PageResult, FetchError>;

    async fn count(
        &self,
        resource: ResourceType,
        filters: &ImportFilters,
    ) -> Result<CountResult, FetchError>;
}

#[async_trait]
impl<T: Transport> RecordSource for GraphQlClient<T> {
    async fn fetch_page(
        &self,
        resource: ResourceType,
        filters: &ImportFilters,
        page_size: u32,
        after: &Cursor,
    ) -> Result<PageResult, FetchError> {
        GraphQlClient::fetch_page(self, resource, filters, page_size, after).await
    }

    async fn count(
        &self,
        resource: ResourceType,
        filters: &ImportFilters,
    ) -> Result<CountResult, FetchError> {
        GraphQlClient::count(self, resource, filters).await
    }
}
