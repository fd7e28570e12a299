use super::super::domain::Measurements;
use super::tables::BodyCompTables;
use super::{BodyCompResult, BodyCompStatus};

pub(crate) const DEFAULT_AGE: f64 = 18.0;

/// Intermediate values gathered while walking the cascade.
pub(crate) struct ScreeningSignals {
    pub height: f64,
    pub weight: f64,
    pub screening_max: Option<f64>,
    pub allowance: f64,
    pub estimate: Option<f64>,
}

pub(crate) fn classify(tables: &BodyCompTables, measurements: &Measurements) -> BodyCompResult {
    let (Some(height), Some(weight)) = (
        positive(measurements.height),
        positive(measurements.weight),
    ) else {
        return BodyCompResult {
            status: BodyCompStatus::Incomplete,
            message: "Enter height and weight to screen body composition.".to_string(),
        };
    };

    let screening_max = tables.screening_weight_for(height, measurements.gender);
    if let Some(max_weight) = screening_max {
        if weight <= max_weight {
            return BodyCompResult {
                status: BodyCompStatus::Within,
                message: format!(
                    "{} lb is within the {} lb screening weight for {} in.",
                    number(weight),
                    number(max_weight),
                    number(height)
                ),
            };
        }
    }

    let age = positive(measurements.age).unwrap_or(DEFAULT_AGE);
    let signals = ScreeningSignals {
        height,
        weight,
        screening_max,
        allowance: tables.allowable_body_fat_for(age, measurements.gender),
        estimate: tables.estimate_body_fat(measurements),
    };

    decide(&signals)
}

fn decide(signals: &ScreeningSignals) -> BodyCompResult {
    let screening_note = match signals.screening_max {
        Some(max_weight) => format!(
            "{} lb exceeds the {} lb screening weight",
            number(signals.weight),
            number(max_weight)
        ),
        None => format!("no screening weight is listed for {} in", number(signals.height)),
    };

    match signals.estimate {
        Some(estimate) if estimate <= signals.allowance => BodyCompResult {
            status: BodyCompStatus::Tape,
            message: format!(
                "Tape required: {screening_note}; estimated {}% body fat is within the {}% allowance.",
                number(estimate),
                number(signals.allowance)
            ),
        },
        Some(estimate) => BodyCompResult {
            status: BodyCompStatus::Over,
            message: format!(
                "Over standards: {screening_note}; estimated {}% body fat exceeds the {}% allowance.",
                number(estimate),
                number(signals.allowance)
            ),
        },
        None => BodyCompResult {
            status: BodyCompStatus::Over,
            message: format!(
                "Over standards: {screening_note} and no tape chart row matches the circumferences (allowance {}%).",
                number(signals.allowance)
            ),
        },
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite() && *value > 0.0)
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let formatted = format!("{value:.2}");
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::number;

    #[test]
    fn numbers_drop_trailing_zeros() {
        assert_eq!(number(180.0), "180");
        assert_eq!(number(67.5), "67.5");
        assert_eq!(number(16.25), "16.25");
    }
}
