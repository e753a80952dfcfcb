use model::core::resource::ResourceType;
use serde_json::{Value, json};

/// Admin API version the importer pins to.
pub const API_VERSION: &str = "2024-04";

const PRODUCTS_QUERY: &str = r#"
query Products($first: Int!, $after: String, $query: String) {
  products(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id
      title
      handle
      status
      vendor
      productType
      tags
      totalInventory
      descriptionHtml
      createdAt
      updatedAt
      variants(first: 100) {
        nodes { id title sku price compareAtPrice inventoryQuantity }
      }
      images(first: 50) {
        nodes { id url altText }
      }
      collections(first: 25) {
        nodes { id title handle }
      }
    }
  }
}"#;

const CUSTOMERS_QUERY: &str = r#"
query Customers($first: Int!, $after: String, $query: String) {
  customers(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id
      firstName
      lastName
      email
      phone
      tags
      numberOfOrders
      createdAt
      updatedAt
      defaultAddress { address1 address2 city province country zip }
      addresses(first: 10) {
        nodes { address1 address2 city province country zip }
      }
    }
  }
}"#;

const ORDERS_QUERY: &str = r#"
query Orders($first: Int!, $after: String, $query: String) {
  orders(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id
      name
      email
      tags
      displayFinancialStatus
      displayFulfillmentStatus
      totalPriceSet { shopMoney { amount currencyCode } }
      customer { id email }
      createdAt
      updatedAt
      lineItems(first: 100) {
        nodes { id title quantity sku variant { id price } }
      }
    }
  }
}"#;

/// Minimal documents for the `count` probe: page cursors and ids only.
const PRODUCTS_COUNT_QUERY: &str = r#"
query ProductsCount($first: Int!, $after: String, $query: String) {
  products(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    nodes { id }
  }
}"#;

const CUSTOMERS_COUNT_QUERY: &str = r#"
query CustomersCount($first: Int!, $after: String, $query: String) {
  customers(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    nodes { id }
  }
}"#;

const ORDERS_COUNT_QUERY: &str = r#"
query OrdersCount($first: Int!, $after: String, $query: String) {
  orders(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    nodes { id }
  }
}"#;

pub fn document(resource: ResourceType) -> &'static str {
    match resource {
        ResourceType::Products => PRODUCTS_QUERY,
        ResourceType::Customers => CUSTOMERS_QUERY,
        ResourceType::Orders => ORDERS_QUERY,
    }
}

pub fn count_document(resource: ResourceType) -> &'static str {
    match resource {
        ResourceType::Products => PRODUCTS_COUNT_QUERY,
        ResourceType::Customers => CUSTOMERS_COUNT_QUERY,
        ResourceType::Orders => ORDERS_COUNT_QUERY,
    }
}

/// Name of the root collection field in each document's response.
pub fn root_field(resource: ResourceType) -> &'static str {
    resource.as_str()
}

/// Build the POST body. Filter text travels as the bound `$query` variable,
/// never spliced into the document itself.
pub fn request_body(
    document: &str,
    first: u32,
    after: Option<&str>,
    query: Option<&str>,
) -> Value {
    json!({
        "query": document,
        "variables": {
            "first": first,
            "after": after,
            "query": query,
        }
    })
}
