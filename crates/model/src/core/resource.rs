use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The resource families the importer can pull from the source store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Products,
    Customers,
    Orders,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Products,
        ResourceType::Customers,
        ResourceType::Orders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Products => "products",
            ResourceType::Customers => "customers",
            ResourceType::Orders => "orders",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Unknown resource type: {0}")]
pub struct UnknownResourceType(pub String);

impl FromStr for ResourceType {
    type Err = UnknownResourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products" => Ok(ResourceType::Products),
            "customers" => Ok(ResourceType::Customers),
            "orders" => Ok(ResourceType::Orders),
            other => Err(UnknownResourceType(other.to_string())),
        }
    }
}
