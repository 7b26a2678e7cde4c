pub mod dto;
pub mod wasm_api;

pub use wasm_api::CandlestickChartApi;
