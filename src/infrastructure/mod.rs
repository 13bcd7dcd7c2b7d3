pub mod http;
pub mod mock_api;
pub mod runtime;
pub mod services;

pub use http::{HttpMetricsSource, MetricsResponse};
pub use mock_api::SyntheticMetricsSource;
pub use runtime::{BrowserRuntime, ManualRuntime};
