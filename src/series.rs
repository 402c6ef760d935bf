//! Synthetic time series types.
//!
//! Series are built fresh for every query and dropped once the response body
//! has been assembled; nothing here is ever stored.

/// Label name that carries the synthesized series index.
pub const SERIES_ID_LABEL: &str = "series_id";

/// A metric label representing a name=value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    /// Create a new label with the given name and value.
    ///
    /// # Parameters
    ///
    /// - `name` - Label name
    /// - `value` - Label value
    ///
    /// # Returns
    ///
    /// Returns a new `Label` instance.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// A single synthesized sample: unix seconds and an integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub timestamp: i64,
    pub value: i64,
}

impl Point {
    /// Create a new point at `timestamp` (seconds since Unix epoch).
    pub const fn new(timestamp: i64, value: i64) -> Self {
        Self { timestamp, value }
    }

    /// Render as the `[<unixSeconds>, "<value>"]` pair used on the wire.
    pub fn to_pair(self) -> (i64, String) {
        (self.timestamp, self.value.to_string())
    }
}

/// One synthesized series: its label set and its ordered points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticSeries {
    pub labels: Vec<Label>,
    pub points: Vec<Point>,
}

impl SyntheticSeries {
    /// Create a series for `series_id` from the pass-through labels.
    ///
    /// Any incoming `series_id` label is dropped so the synthesized one is
    /// the only occurrence and always comes last.
    ///
    /// # Parameters
    ///
    /// - `labels` - Pass-through labels from the query, in query order
    /// - `series_id` - Id rendered into the `series_id` label
    /// - `points` - Generated samples, ascending by timestamp
    ///
    /// # Returns
    ///
    /// Returns a new `SyntheticSeries`.
    pub fn new(labels: &[Label], series_id: u64, points: Vec<Point>) -> Self {
        let mut labels: Vec<Label> =
            labels.iter().filter(|l| l.name != SERIES_ID_LABEL).cloned().collect();
        labels.push(Label::new(SERIES_ID_LABEL, series_id.to_string()));
        Self { labels, points }
    }

    /// Value of the label `name`, if present.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.iter().find(|l| l.name == name).map(|l| l.value.as_str())
    }
}
