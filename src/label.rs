//! Weighted labels (surnames)

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DensityError, Result};

/// Origin category of a surname
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelOrigin {
    Kohanim,
    Levite,
    Ashkenazi,
}

impl LabelOrigin {
    pub fn name(self) -> &'static str {
        match self {
            LabelOrigin::Kohanim => "kohanim",
            LabelOrigin::Levite => "levite",
            LabelOrigin::Ashkenazi => "ashkenazi",
        }
    }
}

/// A weighted category whose weight scales point density per cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Relative weight in [0, 1]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<LabelOrigin>,
}

impl Label {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: LabelOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DensityError::InvalidLabel {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(DensityError::InvalidLabel {
                name: self.name.clone(),
                reason: format!("weight must be in [0, 1] (got {})", self.weight),
            });
        }
        Ok(())
    }
}

/// Validated label catalog with unique names
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    /// Validate and wrap a list of labels
    ///
    /// # Errors
    ///
    /// Returns `InvalidLabel` for an empty name or a weight outside [0, 1],
    /// and `DuplicateId` when two labels share a name.
    pub fn new(labels: Vec<Label>) -> Result<Self> {
        let mut seen = HashSet::new();
        for label in &labels {
            label.validate()?;
            if !seen.insert(label.name.as_str()) {
                return Err(DensityError::DuplicateId(label.name.clone()));
            }
        }
        Ok(Self { labels })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Exact-name lookup
    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.name == name)
    }

    /// Select one label by case-insensitive name
    ///
    /// An unknown name selects the whole set.
    pub fn filter_by_name(&self, name: &str) -> LabelSet {
        let matched: Vec<Label> = self
            .labels
            .iter()
            .filter(|l| l.name.eq_ignore_ascii_case(name))
            .cloned()
            .collect();
        if matched.is_empty() {
            tracing::debug!(name, "unknown label filter, keeping all labels");
            return self.clone();
        }
        LabelSet { labels: matched }
    }

    /// Labels ordered by descending weight
    pub fn sorted_by_weight(&self) -> Vec<&Label> {
        let mut sorted: Vec<&Label> = self.labels.iter().collect();
        sorted.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        sorted
    }
}
