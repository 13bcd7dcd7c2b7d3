use chrono::Utc;
use gloo::utils::format::JsValueSerdeExt;
use js_sys::Function;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::application::{ChartFeed, ChartState, Runtime, SyncCache, SyncConfig};
use crate::domain::chart::ChartScaleService;
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::metrics::{self, RangeToken, Series};
use crate::infrastructure::{BrowserRuntime, HttpMetricsSource, SyntheticMetricsSource, mock_api};

/// JS-facing shape of a chart state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartStateView<'a> {
    pub range: RangeToken,
    pub data: &'a Series,
    pub is_loading: bool,
    pub is_placeholder: bool,
    pub y_domain: Option<[f64; 2]>,
}

impl<'a> ChartStateView<'a> {
    pub fn new(range: RangeToken, state: &'a ChartState) -> Self {
        Self {
            range,
            data: &state.series,
            is_loading: state.is_loading,
            is_placeholder: state.is_placeholder,
            y_domain: ChartScaleService::y_axis_domain(&state.series).map(|d| [d.min, d.max]),
        }
    }
}

/// `{count, unit}` for a raw range selector
#[wasm_bindgen(js_name = resolveRange)]
pub fn resolve_range(token: &str) -> Result<JsValue, JsValue> {
    JsValue::from_serde(&metrics::resolve(token)).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Mock `/api/metrics` body for a query string
#[wasm_bindgen(js_name = mockMetricsJson)]
pub fn mock_metrics_json(query: &str) -> Result<String, JsValue> {
    let mut rng = SmallRng::from_entropy();
    mock_api::metrics_response_json(query, Default::default(), Utc::now(), &mut rng)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

enum FeedBackend {
    Http(ChartFeed<HttpMetricsSource>),
    Mock(ChartFeed<SyntheticMetricsSource>),
}

/// Polling chart feed driving a JS callback
#[wasm_bindgen]
pub struct MetricsFeed {
    backend: FeedBackend,
}

#[wasm_bindgen]
impl MetricsFeed {
    /// Without `base_url` the feed answers from the in-browser mock backend.
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: Option<String>, config_json: Option<String>, on_change: Function) -> Result<MetricsFeed, JsValue> {
        let config = match config_json {
            Some(raw) => SyncConfig::from_json(&raw).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => SyncConfig::default(),
        };
        let runtime: Rc<dyn Runtime> = Rc::new(BrowserRuntime);
        let notify = move |range: RangeToken, state: &ChartState| {
            let view = ChartStateView::new(range, state);
            let delivered = JsValue::from_serde(&view)
                .map_err(|e| JsValue::from_str(&e.to_string()))
                .and_then(|value| on_change.call1(&JsValue::NULL, &value));
            if let Err(err) = delivered {
                get_logger().error(
                    LogComponent::Presentation("MetricsFeed"),
                    &format!("❌ Chart callback failed: {:?}", err),
                );
            }
        };

        let backend = match base_url {
            Some(url) => {
                let cache = SyncCache::builder(HttpMetricsSource::new(url), runtime).config(config).build();
                FeedBackend::Http(ChartFeed::new(cache, notify))
            }
            None => {
                let source = SyntheticMetricsSource::new(Rc::clone(&runtime)).with_shape(config.shape);
                let cache = SyncCache::builder(source, runtime).config(config).build();
                FeedBackend::Mock(ChartFeed::new(cache, notify))
            }
        };
        Ok(MetricsFeed { backend })
    }

    /// Switch to `token`; unknown selectors fall back to the quarter.
    pub fn select(&mut self, token: &str) {
        let token = RangeToken::parse_lenient(token);
        match &mut self.backend {
            FeedBackend::Http(feed) => feed.select(token),
            FeedBackend::Mock(feed) => feed.select(token),
        }
    }

    pub fn focus(&self) {
        match &self.backend {
            FeedBackend::Http(feed) => feed.focus(),
            FeedBackend::Mock(feed) => feed.focus(),
        }
    }

    pub fn close(&mut self) {
        match &mut self.backend {
            FeedBackend::Http(feed) => feed.close(),
            FeedBackend::Mock(feed) => feed.close(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn range(&self) -> Option<String> {
        let range = match &self.backend {
            FeedBackend::Http(feed) => feed.range(),
            FeedBackend::Mock(feed) => feed.range(),
        };
        range.map(|token| token.to_string())
    }
}
