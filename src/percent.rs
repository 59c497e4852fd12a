use serde::Serialize;

/// A named share of a whole, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub name: String,
    pub value: f64,
}

/// Shares below this percentage get no on-chart label.
pub const LABEL_THRESHOLD_PCT: f64 = 5.0;

impl Slice {
    /// Chart label for the slice, or `None` when it is too small to label.
    /// Presentation policy; the normalizer itself keeps every entry.
    pub fn label(&self) -> Option<String> {
        (self.value >= LABEL_THRESHOLD_PCT).then(|| format!("{} {:.2}%", self.name, self.value))
    }
}

/// Convert values into percentage shares of their total, preserving order.
/// A non-positive total yields 0 for every entry.
pub fn to_percentages<S: AsRef<str>>(values: &[(S, f64)]) -> Vec<Slice> {
    let total: f64 = values.iter().map(|(_, v)| *v).sum();
    values
        .iter()
        .map(|(name, v)| Slice {
            name: name.as_ref().to_string(),
            value: if total > 0.0 { 100.0 * v / total } else { 0.0 },
        })
        .collect()
}
