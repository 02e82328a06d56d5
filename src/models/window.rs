use serde::{Deserialize, Serialize};

/// "N trading days before the latest point", labelled for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalWindow {
    pub offset: usize,
    pub label: String,
}

impl HistoricalWindow {
    pub fn new(offset: usize, label: impl Into<String>) -> Self {
        Self {
            offset,
            label: label.into(),
        }
    }

    /// A series covers this window only with strictly more points than the offset
    pub fn is_available(&self, series_len: usize) -> bool {
        series_len > self.offset
    }
}

/// Default catalogue (~252 trading days per year), ascending by offset
pub fn default_windows() -> Vec<HistoricalWindow> {
    [
        (5, "1W"),
        (21, "1M"),
        (63, "3M"),
        (126, "6M"),
        (252, "1Y"),
        (504, "2Y"),
        (1260, "5Y"),
    ]
    .into_iter()
    .map(|(offset, label)| HistoricalWindow::new(offset, label))
    .collect()
}
