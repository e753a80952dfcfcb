use clap::{Args, Subcommand};
use model::{core::resource::ResourceType, filter::ImportFilters};

#[derive(Subcommand)]
pub enum Commands {
    /// Start (or resume) an import and drive it to a terminal state
    Run {
        #[command(flatten)]
        target: ImportTarget,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, help = "Records per page, capped by the source API limit")]
        page_size: Option<u32>,

        #[arg(long, help = "Directory the exported records are written to")]
        out: Option<String>,
    },
    /// Register an import session without driving it
    Start {
        #[command(flatten)]
        target: ImportTarget,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, help = "Records per page, capped by the source API limit")]
        page_size: Option<u32>,
    },
    /// Report the progress of one session
    Progress {
        #[arg(long, help = "Session ID to inspect")]
        session: String,

        #[arg(long, help = "If set, prints the progress as JSON instead of text")]
        json: bool,
    },
    /// Fail sessions stuck past the no-progress threshold
    Reap {
        #[arg(long, default_value_t = 3600, help = "Stuck threshold in seconds")]
        threshold_secs: u64,
    },
}

#[derive(Args)]
pub struct ImportTarget {
    #[arg(long, help = "Source store identifier")]
    pub store: String,

    #[arg(long, help = "Resource type: products, customers, or orders")]
    pub resource: ResourceType,

    #[arg(long, help = "Shop domain, e.g. my-shop.myshopify.com")]
    pub shop_domain: String,

    #[arg(
        long,
        help = "Admin API access token; falls back to SHOPSYNC_ACCESS_TOKEN"
    )]
    pub access_token: Option<String>,
}

#[derive(Args, Default)]
pub struct FilterArgs {
    #[arg(long, help = "Source-side status filter, e.g. active")]
    pub status: Option<String>,

    #[arg(long, help = "Only records created after this RFC 3339 timestamp")]
    pub created_after: Option<chrono::DateTime<chrono::Utc>>,

    #[arg(long, help = "Only records created before this RFC 3339 timestamp")]
    pub created_before: Option<chrono::DateTime<chrono::Utc>>,

    #[arg(long, help = "Source-side tag filter")]
    pub tag: Option<String>,

    #[arg(long, help = "Source-side vendor filter")]
    pub vendor: Option<String>,

    #[arg(long, help = "Free-text search term")]
    pub text: Option<String>,

    #[arg(long, help = "Drop records with no variant priced at or above this")]
    pub price_min: Option<f64>,

    #[arg(long, help = "Drop records with no variant priced at or below this")]
    pub price_max: Option<f64>,

    #[arg(long, help = "Drop records with total inventory below this")]
    pub inventory_min: Option<i64>,

    #[arg(long, help = "Drop records with total inventory above this")]
    pub inventory_max: Option<i64>,

    #[arg(long = "require-tag", help = "Keep only records carrying one of these tags")]
    pub require_tags: Vec<String>,

    #[arg(long, help = "Skip records that already exist in the target")]
    pub only_new: bool,
}

impl FilterArgs {
    pub fn into_filters(self) -> ImportFilters {
        ImportFilters {
            status: self.status,
            created_after: self.created_after,
            created_before: self.created_before,
            tag: self.tag,
            vendor: self.vendor,
            text: self.text,
            price_min: self.price_min,
            price_max: self.price_max,
            inventory_min: self.inventory_min,
            inventory_max: self.inventory_max,
            require_tags: self.require_tags,
            only_new: self.only_new,
        }
    }
}
