/// Statistic view-models handed to the presentation layer, plus the number
/// formatting helpers analyzers use to fill them.
///
/// The engine never looks inside a `Statistic`; it only collects them per
/// module after finalization.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    General,
    Talents,
    Traits,
    Items,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistic {
    pub category: Category,
    pub label:    String,
    pub value:    String,
    /// Spell id whose icon represents the statistic.
    pub icon:     Option<u32>,
    pub tooltip:  Option<String>,
    /// Sort hint within the category; lower first.
    pub position: Option<u32>,
}

impl Statistic {
    pub fn new(category: Category, label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category,
            label:    label.into(),
            value:    value.into(),
            icon:     None,
            tooltip:  None,
            position: None,
        }
    }

    pub fn icon(mut self, spell_id: u32) -> Self {
        self.icon = Some(spell_id);
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `0.9512` -> `"95.12"`.
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.2}", ratio * 100.0)
}

/// `12_345` -> `"12k"`, `1_234_567` -> `"1.23m"`, small values with separators.
pub fn format_number(value: u64) -> String {
    if value > 1_000_000 {
        format!("{:.2}m", value as f64 / 1_000_000.0)
    } else if value > 10_000 {
        format!("{}k", (value as f64 / 1_000.0).round() as u64)
    } else {
        format_thousands(value)
    }
}

pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers() {
        assert_eq!(format_number(950), "950");
        assert_eq!(format_number(9_999), "9,999");
        assert_eq!(format_number(22_156), "22k");
        assert_eq!(format_number(1_234_567), "1.23m");
        assert_eq!(format_thousands(1_000_000), "1,000,000");
    }

    #[test]
    fn formats_percentages() {
        assert_eq!(format_percentage(0.9512), "95.12");
        assert_eq!(format_percentage(0.0), "0.00");
    }
}
