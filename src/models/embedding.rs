use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Fixed-length semantic vector derived from a profile analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wrap raw values without resizing
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Truncate or zero-pad `values` to exactly `dimensions` entries
    pub fn fit(mut values: Vec<f32>, dimensions: usize) -> Self {
        values.resize(dimensions, 0.0);
        Self(values)
    }

    /// Parse the persisted `[n1,n2,...]` form, resizing to `dimensions`
    pub fn parse_wire(text: &str, dimensions: usize) -> Result<Self, MatchError> {
        let inner = text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim();

        if inner.is_empty() {
            return Ok(Self::fit(Vec::new(), dimensions));
        }

        let values = inner
            .split(',')
            .map(|token| {
                token.trim().parse::<f32>().map_err(|_| {
                    MatchError::Validation(format!("invalid embedding element: {:?}", token.trim()))
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;

        Ok(Self::fit(values, dimensions))
    }

    /// Render as `[n1,n2,...]` with no whitespace
    pub fn to_wire(&self) -> String {
        let body = self
            .0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!("[{}]", body)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
