mod rules;
mod tables;

pub use tables::{first_matching_row, BodyCompTables, GenderTables, TapeRow, TapeTolerance};

use super::domain::Measurements;
use serde::{Deserialize, Serialize};

/// Outcome class of a body-composition screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyCompStatus {
    /// Height or weight is missing.
    Incomplete,
    /// At or under the screening weight.
    Within,
    /// Over the screening weight but the tape estimate is within allowance.
    Tape,
    Over,
}

impl BodyCompStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Incomplete => "Incomplete",
            Self::Within => "Within standards",
            Self::Tape => "Tape required",
            Self::Over => "Over standards",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyCompResult {
    pub status: BodyCompStatus,
    pub message: String,
}

/// Stateless evaluator that applies the lookup tables to a set of measurements.
#[derive(Debug, Clone, Default)]
pub struct BodyCompEvaluator {
    tables: BodyCompTables,
}

impl BodyCompEvaluator {
    pub fn new(tables: BodyCompTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &BodyCompTables {
        &self.tables
    }

    /// Runs the screening cascade: weight-for-height, then the tape estimate against the
    /// age/gender allowance.
    pub fn evaluate(&self, measurements: &Measurements) -> BodyCompResult {
        rules::classify(&self.tables, measurements)
    }
}

/// Evaluates against the standard tables.
pub fn evaluate(measurements: &Measurements) -> BodyCompResult {
    BodyCompEvaluator::default().evaluate(measurements)
}
