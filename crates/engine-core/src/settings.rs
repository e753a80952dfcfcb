use connectors::graphql::client::MAX_PAGE_SIZE;
use model::core::resource::ResourceType;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: u32 = 250;
pub const DEFAULT_COUNT_PAGE_SIZE: u32 = 250;
pub const DEFAULT_GUARD_TTL_SECS: u64 = 300;
pub const DEFAULT_STUCK_THRESHOLD_SECS: u64 = 3600;
pub const DEFAULT_RESCHEDULE_DELAY_SECS: u64 = 5;

/// Tunables for the import engine.
///
/// Page sizes resolve per resource first, then the global override, then the
/// default; everything gets clamped to the Shopify page-size ceiling.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    global_page_size: Option<u32>,
    per_resource_page_size: HashMap<ResourceType, u32>,
    pub count_page_size: u32,
    pub guard_ttl_secs: u64,
    pub stuck_threshold_secs: u64,
    pub reschedule_delay_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            global_page_size: None,
            per_resource_page_size: HashMap::new(),
            count_page_size: DEFAULT_COUNT_PAGE_SIZE,
            guard_ttl_secs: DEFAULT_GUARD_TTL_SECS,
            stuck_threshold_secs: DEFAULT_STUCK_THRESHOLD_SECS,
            reschedule_delay_secs: DEFAULT_RESCHEDULE_DELAY_SECS,
        }
    }
}

impl EngineSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_global_page_size(&mut self, size: u32) {
        self.global_page_size = Some(size);
    }

    pub fn set_page_size(&mut self, resource: ResourceType, size: u32) {
        self.per_resource_page_size.insert(resource, size);
    }

    pub fn page_size(&self, resource: ResourceType) -> u32 {
        let raw = self
            .per_resource_page_size
            .get(&resource)
            .copied()
            .or(self.global_page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        raw.clamp(1, MAX_PAGE_SIZE)
    }
}
