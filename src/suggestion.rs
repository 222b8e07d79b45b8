/// Suggestion thresholds and the `when(..).add_suggestion(..)` builder.
///
/// A module measures something, wraps it in a `Threshold` and hands the
/// engine a closure that fills in the suggestion text. The closure always
/// runs (it receives the actual and recommended values), but its output is
/// kept only when the threshold triggers.
///
/// Boolean thresholds: `is_equal(v)` triggers when the measured flag equals
/// `v`, i.e. `v` is the outcome worth complaining about.
///
/// Numeric thresholds: `minor` is the recommended value. Being past it
/// triggers; the importance is the most severe band crossed (`major` ->
/// Major, `average` -> Regular, otherwise Minor).
use crate::module::ModuleKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Minor,
    Regular,
    Major,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Actual {
    Boolean(bool),
    Number(f64),
    /// Ratio in `[0, 1]`.
    Percentage(f64),
}

impl Actual {
    pub fn value(self) -> f64 {
        match self {
            Self::Boolean(b)    => if b { 1.0 } else { 0.0 },
            Self::Number(n)     => n,
            Self::Percentage(p) => p,
        }
    }
}

/// Severity cutoffs. Unset bands may be filled by the suggestion builder.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bands {
    pub minor:   Option<f64>,
    pub average: Option<f64>,
    pub major:   Option<f64>,
}

impl Bands {
    pub fn new(minor: f64, average: f64, major: f64) -> Self {
        Self { minor: Some(minor), average: Some(average), major: Some(major) }
    }

    pub fn minor(minor: f64) -> Self {
        Self { minor: Some(minor), ..Self::default() }
    }

    fn or(self, other: Bands) -> Bands {
        Bands {
            minor:   self.minor.or(other.minor),
            average: self.average.or(other.average),
            major:   self.major.or(other.major),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    IsEqual(bool),
    IsLessThan(Bands),
    IsGreaterThan(Bands),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub actual:     Actual,
    pub comparison: Comparison,
}

impl Threshold {
    pub fn boolean(actual: bool, is_equal: bool) -> Self {
        Self { actual: Actual::Boolean(actual), comparison: Comparison::IsEqual(is_equal) }
    }

    pub fn less_than(actual: Actual, bands: Bands) -> Self {
        Self { actual, comparison: Comparison::IsLessThan(bands) }
    }

    pub fn greater_than(actual: Actual, bands: Bands) -> Self {
        Self { actual, comparison: Comparison::IsGreaterThan(bands) }
    }

    /// The value handed to the builder as "recommended".
    pub fn recommended(&self) -> f64 {
        match self.comparison {
            Comparison::IsEqual(v) => Actual::Boolean(!v).value(),
            Comparison::IsLessThan(b) | Comparison::IsGreaterThan(b) => {
                b.minor.or(b.average).or(b.major).unwrap_or(0.0)
            }
        }
    }

    /// `None` when the threshold holds; otherwise the band-derived importance.
    pub fn evaluate(&self, fallback: Bands) -> Option<Importance> {
        let actual = self.actual.value();
        match self.comparison {
            Comparison::IsEqual(v) => {
                let flag = actual != 0.0;
                (flag == v).then_some(Importance::Minor)
            }
            Comparison::IsLessThan(bands) => severity(bands.or(fallback), |cut| actual < cut),
            Comparison::IsGreaterThan(bands) => severity(bands.or(fallback), |cut| actual > cut),
        }
    }
}

fn severity(bands: Bands, past: impl Fn(f64) -> bool) -> Option<Importance> {
    let first = bands.minor.or(bands.average).or(bands.major)?;
    if !past(first) {
        return None;
    }
    if bands.major.is_some_and(&past) {
        Some(Importance::Major)
    } else if bands.average.is_some_and(&past) {
        Some(Importance::Regular)
    } else {
        Some(Importance::Minor)
    }
}

// ---------------------------------------------------------------------------
// Suggestion record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub module:      ModuleKind,
    pub text:        String,
    pub icon:        Option<String>,
    pub importance:  Importance,
    pub actual:      Option<String>,
    pub recommended: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionBuilder {
    text:              String,
    icon:              Option<String>,
    actual:            Option<String>,
    recommended:       Option<String>,
    static_importance: Option<Importance>,
    bands:             Bands,
}

impl SuggestionBuilder {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn recommended(mut self, recommended: impl Into<String>) -> Self {
        self.recommended = Some(recommended.into());
        self
    }

    /// Fixed importance, ignoring bands.
    pub fn static_importance(mut self, importance: Importance) -> Self {
        self.static_importance = Some(importance);
        self
    }

    /// Regular-importance cutoff, used when the threshold has none.
    pub fn average(mut self, cutoff: f64) -> Self {
        self.bands.average = Some(cutoff);
        self
    }

    /// Major-importance cutoff, used when the threshold has none.
    pub fn major(mut self, cutoff: f64) -> Self {
        self.bands.major = Some(cutoff);
        self
    }
}

// ---------------------------------------------------------------------------
// when(..)
// ---------------------------------------------------------------------------

/// Collects the suggestions of one module.
pub struct When {
    module:      ModuleKind,
    suggestions: Vec<Suggestion>,
}

impl When {
    pub(crate) fn new(module: ModuleKind) -> Self {
        Self { module, suggestions: Vec::new() }
    }

    pub fn threshold(&mut self, threshold: Threshold) -> Pending<'_> {
        Pending { when: self, threshold }
    }

    pub fn value(&mut self, actual: Actual) -> Check<'_> {
        Check { when: self, actual }
    }

    pub(crate) fn into_suggestions(self) -> Vec<Suggestion> {
        self.suggestions
    }
}

/// `when.value(x)` waiting for its comparison.
pub struct Check<'w> {
    when:   &'w mut When,
    actual: Actual,
}

impl<'w> Check<'w> {
    pub fn is_less_than(self, recommended: f64) -> Pending<'w> {
        let Check { when, actual } = self;
        when.threshold(Threshold::less_than(actual, Bands::minor(recommended)))
    }

    pub fn is_greater_than(self, recommended: f64) -> Pending<'w> {
        let Check { when, actual } = self;
        when.threshold(Threshold::greater_than(actual, Bands::minor(recommended)))
    }

    pub fn is_equal(self, value: bool) -> Pending<'w> {
        let Check { when, actual } = self;
        when.threshold(Threshold::boolean(actual.value() != 0.0, value))
    }
}

pub struct Pending<'w> {
    when:      &'w mut When,
    threshold: Threshold,
}

impl Pending<'_> {
    pub fn add_suggestion<F>(self, build: F)
    where
        F: FnOnce(SuggestionBuilder, f64, f64) -> SuggestionBuilder,
    {
        let builder = build(
            SuggestionBuilder::default(),
            self.threshold.actual.value(),
            self.threshold.recommended(),
        );
        let Some(importance) = self.threshold.evaluate(builder.bands) else {
            return;
        };
        self.when.suggestions.push(Suggestion {
            module:      self.when.module,
            text:        builder.text,
            icon:        builder.icon,
            importance:  builder.static_importance.unwrap_or(importance),
            actual:      builder.actual,
            recommended: builder.recommended,
        });
    }
}
