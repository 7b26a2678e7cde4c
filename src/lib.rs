//! Interactive OHLC candlestick chart for the browser.
//!
//! The chart engine (layout, scales, geometry, animation, hover interaction)
//! lives in `domain` and draws through the [`SceneGraph`](domain::chart::SceneGraph)
//! port. `infrastructure::rendering` provides the DOM backend used from JS and
//! an in-memory backend for headless rendering and tests.

use wasm_bindgen::prelude::*;

use crate::domain::logging::{LogComponent, get_logger};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod time_utils;

pub use application::CandlestickChart;
pub use domain::chart::{ChartConfig, Margin, RedrawPolicy};
pub use domain::errors::{ChartError, ChartResult};
pub use domain::market_data::{OhlcRecord, Timestamp};

/// Install the panic hook and the console logger.
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let console_logger = Box::new(if cfg!(debug_assertions) {
        infrastructure::services::ConsoleLogger::new_development()
    } else {
        infrastructure::services::ConsoleLogger::new_production()
    });
    domain::logging::init_logger(console_logger);

    let browser_time_provider = Box::new(infrastructure::services::BrowserTimeProvider::new());
    domain::logging::init_time_provider(browser_time_provider);

    get_logger().info(LogComponent::Presentation("Initialize"), "candlestick chart module ready");
}
