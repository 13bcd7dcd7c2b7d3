pub mod chart_feed;
pub mod config;
pub mod runtime;
pub mod sync_cache;

pub use chart_feed::ChartFeed;
pub use config::SyncConfig;
pub use runtime::Runtime;
pub use sync_cache::{ChartState, EntryStatus, Subscription, SyncCache, SyncCacheBuilder};
