use js_sys::{Array, Object, Reflect};
use wasm_bindgen::{JsCast, prelude::*};

use super::dto::{OhlcRecordDto, records_from_dtos};
use crate::application::CandlestickChart;
use crate::domain::{
    chart::ChartConfig,
    errors::{ChartError, ChartResult},
    logging::{LogComponent, get_logger},
    market_data::OhlcRecord,
};
use crate::infrastructure::rendering::DomScene;

/// Map a chart error onto a JS `Error` whose `name` is the error kind.
fn to_js_error(err: ChartError) -> JsValue {
    let js = js_sys::Error::new(&err.to_string());
    js.set_name(err.kind());
    js.into()
}

fn config_from_js(config: JsValue) -> ChartResult<ChartConfig> {
    serde_wasm_bindgen::from_value(config).map_err(|e| ChartError::configuration(format!("invalid config: {}", e)))
}

/// Shallow copy of `item` with a JS `Date` in `date` swapped for its epoch
/// milliseconds. Anything else is passed through untouched.
fn with_epoch_date(index: usize, item: JsValue) -> ChartResult<JsValue> {
    let Some(object) = item.dyn_ref::<Object>() else {
        return Ok(item);
    };
    let key = JsValue::from_str("date");
    let date = Reflect::get(object, &key).unwrap_or(JsValue::UNDEFINED);
    let Some(date) = date.dyn_ref::<js_sys::Date>() else {
        return Ok(item);
    };

    let copy = Object::assign(&Object::new(), object);
    Reflect::set(&copy, &key, &JsValue::from_f64(date.get_time()))
        .map_err(|e| ChartError::validation(index, format!("cannot read date: {:?}", e)))?;
    Ok(copy.into())
}

fn records_from_js(dataset: &JsValue) -> ChartResult<Vec<OhlcRecord>> {
    let items = dataset.dyn_ref::<Array>().ok_or_else(|| ChartError::data("dataset must be an array"))?;
    let dtos = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            serde_wasm_bindgen::from_value::<OhlcRecordDto>(with_epoch_date(index, item)?)
                .map_err(|e| ChartError::validation(index, format!("unreadable record: {}", e)))
        })
        .collect::<ChartResult<Vec<_>>>()?;
    records_from_dtos(dtos)
}

/// `new CandlestickChart({ bindto, margin?, redraw? })`
#[wasm_bindgen(js_name = CandlestickChart)]
pub struct CandlestickChartApi {
    chart: CandlestickChart<DomScene>,
}

#[wasm_bindgen(js_class = CandlestickChart)]
impl CandlestickChartApi {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<CandlestickChartApi, JsValue> {
        let build = || -> ChartResult<CandlestickChartApi> {
            let config = config_from_js(config)?;
            let chart = CandlestickChart::construct(DomScene::new()?, config)?;
            Ok(CandlestickChartApi { chart })
        };
        build().map_err(to_js_error)
    }

    /// Replace the dataset and redraw. Accepts an array of
    /// `{date, open, high, low, close}` where `date` is a `Date`, an ISO
    /// string or epoch milliseconds.
    #[wasm_bindgen(js_name = loadData)]
    pub fn load_data(&mut self, dataset: JsValue) -> Result<(), JsValue> {
        let records = records_from_js(&dataset).inspect_err(|e| {
            get_logger().error(LogComponent::Presentation("CandlestickChart"), &e.to_string());
        });
        records.and_then(|records| self.chart.load_data(records)).map_err(to_js_error)
    }
}
