use crate::{
    error::FetchError,
    graphql::{normalize, query, search},
    transport::{Transport, TransportRequest},
};
use model::{
    core::resource::ResourceType,
    filter::ImportFilters,
    pagination::cursor::Cursor,
    records::{
        page::{CountResult, PageResult},
        record::Record,
    },
};
use serde_json::Value;
use tracing::debug;

/// Hard ceiling the source API puts on a single page.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Default page size for the `count` probe.
pub const DEFAULT_COUNT_PAGE_SIZE: u32 = 250;

#[derive(Debug, Clone)]
pub struct ShopCredentials {
    pub shop_domain: String,
    pub access_token: String,
}

impl ShopCredentials {
    pub fn new(shop_domain: impl Into<String>, access_token: impl Into<String>) -> Self {
        ShopCredentials {
            shop_domain: shop_domain.into(),
            access_token: access_token.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.shop_domain,
            query::API_VERSION
        )
    }
}

/// Paginated GraphQL access to one source store.
///
/// The client is stateless between calls: the resume position lives in the
/// cursor store, not here. Failures are typed and never retried internally;
/// a half-consumed page must not be refetched blindly.
pub struct GraphQlClient<T: Transport> {
    transport: T,
    credentials: ShopCredentials,
    count_page_size: u32,
}

impl<T: Transport> GraphQlClient<T> {
    pub fn new(transport: T, credentials: ShopCredentials) -> Self {
        GraphQlClient {
            transport,
            credentials,
            count_page_size: DEFAULT_COUNT_PAGE_SIZE,
        }
    }

    pub fn with_count_page_size(mut self, size: u32) -> Self {
        self.count_page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Fetch exactly one page of records.
    pub async fn fetch_page(
        &self,
        resource: ResourceType,
        filters: &ImportFilters,
        page_size: u32,
        after: &Cursor,
    ) -> Result<PageResult, FetchError> {
        self.fetch_with_document(
            query::document(resource),
            resource,
            filters,
            page_size,
            after,
        )
        .await
    }

    /// Fetch every remaining page into memory.
    ///
    /// Only for bounded operations; the import path never uses this because
    /// it defeats resumability.
    pub async fn fetch_all(
        &self,
        resource: ResourceType,
        filters: &ImportFilters,
        page_size: u32,
    ) -> Result<Vec<Record>, FetchError> {
        let mut records = Vec::new();
        let mut cursor = Cursor::Start;

        loop {
            let page = self.fetch_page(resource, filters, page_size, &cursor).await?;
            records.extend(page.records);

            if !page.has_next_page {
                return Ok(records);
            }
            let next = Cursor::from(page.end_cursor);
            if next == cursor {
                // The API handed back the same cursor; nothing left to page.
                return Ok(records);
            }
            cursor = next;
        }
    }

    /// Probe how many records match the filters.
    ///
    /// The source has no cheap total-count primitive for this resource
    /// family, so this fetches one id-only page and flags the result as
    /// partial when more records exist beyond it.
    pub async fn count(
        &self,
        resource: ResourceType,
        filters: &ImportFilters,
    ) -> Result<CountResult, FetchError> {
        let page = self
            .fetch_with_document(
                query::count_document(resource),
                resource,
                filters,
                self.count_page_size,
                &Cursor::Start,
            )
            .await?;

        Ok(CountResult {
            count: page.len() as u64,
            is_partial: page.has_next_page,
        })
    }

    async fn fetch_with_document(
        &self,
        document: &str,
        resource: ResourceType,
        filters: &ImportFilters,
        page_size: u32,
        after: &Cursor,
    ) -> Result<PageResult, FetchError> {
        let first = page_size.clamp(1, MAX_PAGE_SIZE);
        let compiled = search::compile(filters);
        let body = query::request_body(document, first, after.token(), compiled.as_deref());

        debug!(
            resource = %resource,
            first,
            after = ?after.token(),
            query = ?compiled,
            "Fetching page"
        );

        let data = self.execute(body).await?;
        let collection = data
            .get(query::root_field(resource))
            .ok_or_else(|| FetchError::malformed("missing root collection", &data.to_string()))?;

        let page_info = collection
            .get("pageInfo")
            .ok_or_else(|| FetchError::malformed("missing pageInfo", &collection.to_string()))?;
        let has_next_page = page_info
            .get("hasNextPage")
            .and_then(Value::as_bool)
            .ok_or_else(|| FetchError::malformed("missing hasNextPage", &page_info.to_string()))?;
        let end_cursor = page_info
            .get("endCursor")
            .and_then(Value::as_str)
            .map(str::to_string);

        let records = normalize::normalize_records(collection)
            .ok_or_else(|| FetchError::malformed("unrecognized collection shape", &collection.to_string()))?
            .into_iter()
            .map(Record::new)
            .collect();

        Ok(PageResult {
            records,
            has_next_page,
            end_cursor,
        })
    }

    /// Send one GraphQL request and classify every failure mode.
    async fn execute(&self, body: Value) -> Result<Value, FetchError> {
        let request = TransportRequest::post(self.credentials.endpoint(), body.to_string())
            .header("Content-Type", "application/json")
            .header("X-Shopify-Access-Token", self.credentials.access_token.clone());

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if response.status == 401 || response.status == 403 {
            return Err(FetchError::Auth {
                status: response.status,
            });
        }
        if !response.is_success() {
            return Err(FetchError::http(response.status, &response.body));
        }

        let parsed: Value = serde_json::from_str(&response.body)
            .map_err(|e| FetchError::malformed(format!("invalid JSON: {e}"), &response.body))?;

        if let Some(errors) = parsed.get("errors").and_then(Value::as_array)
            && !errors.is_empty()
        {
            let messages = errors
                .iter()
                .map(|e| {
                    let message = e
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error");
                    match e.pointer("/extensions/code").and_then(Value::as_str) {
                        Some(code) => format!("{code}: {message}"),
                        None => message.to_string(),
                    }
                })
                .collect();
            return Err(FetchError::GraphQl { messages });
        }

        parsed
            .get("data")
            .cloned()
            .ok_or_else(|| FetchError::malformed("missing data field", &response.body))
    }
}
