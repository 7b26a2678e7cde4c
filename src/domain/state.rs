use super::chart::ScaleSet;
use super::market_data::Dataset;

/// Immutable result of one successful load.
#[derive(Clone, Debug)]
pub struct ChartState {
    /// Number of successful loads so far, this one included.
    pub generation: u64,
    pub dataset: Dataset,
    pub scales: ScaleSet,
}

impl ChartState {
    pub fn new(generation: u64, dataset: Dataset, scales: ScaleSet) -> Self {
        Self { generation, dataset, scales }
    }

    /// State for the next load, built from scratch.
    pub fn succeed(previous: Option<&ChartState>, dataset: Dataset, scales: ScaleSet) -> Self {
        let generation = previous.map_or(1, |s| s.generation + 1);
        Self::new(generation, dataset, scales)
    }
}
