use super::super::domain::{Gender, Measurements};

/// Maximum screening weight (lb) by whole-inch height.
const MALE_SCREENING_WEIGHT: &[(u8, f64)] = &[
    (60, 141.0),
    (61, 145.0),
    (62, 150.0),
    (63, 155.0),
    (64, 160.0),
    (65, 165.0),
    (66, 170.0),
    (67, 175.0),
    (68, 180.0),
    (69, 186.0),
    (70, 192.0),
];

const FEMALE_SCREENING_WEIGHT: &[(u8, f64)] = &[
    (60, 136.0),
    (61, 140.0),
    (62, 144.0),
    (63, 148.0),
    (64, 152.0),
    (65, 156.0),
    (66, 160.0),
    (67, 165.0),
    (68, 170.0),
    (69, 175.0),
    (70, 180.0),
];

/// Allowable body-fat percentage by minimum age, ascending.
const MALE_BODY_FAT: &[(f64, f64)] = &[(17.0, 20.0), (20.0, 22.0), (28.0, 24.0), (40.0, 26.0)];
const FEMALE_BODY_FAT: &[(f64, f64)] = &[(17.0, 30.0), (20.0, 32.0), (28.0, 34.0), (40.0, 36.0)];

/// Reference row of a circumference chart. `None` means the row ignores that measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeRow {
    pub neck: Option<f64>,
    pub waist: Option<f64>,
    pub hip: Option<f64>,
    pub body_fat: f64,
}

impl TapeRow {
    pub const fn male(neck: f64, waist: f64, body_fat: f64) -> Self {
        Self {
            neck: Some(neck),
            waist: Some(waist),
            hip: None,
            body_fat,
        }
    }

    pub const fn female(neck: f64, waist: f64, hip: f64, body_fat: f64) -> Self {
        Self {
            neck: Some(neck),
            waist: Some(waist),
            hip: Some(hip),
            body_fat,
        }
    }
}

const MALE_TAPE_CHART: &[TapeRow] = &[
    TapeRow::male(15.0, 30.0, 12.0),
    TapeRow::male(15.5, 32.0, 15.0),
    TapeRow::male(16.0, 34.0, 18.0),
    TapeRow::male(16.5, 36.0, 21.0),
    TapeRow::male(17.0, 38.0, 24.0),
    TapeRow::male(17.5, 40.0, 27.0),
    TapeRow::male(18.0, 42.0, 30.0),
];

const FEMALE_TAPE_CHART: &[TapeRow] = &[
    TapeRow::female(12.0, 26.0, 36.0, 22.0),
    TapeRow::female(12.5, 28.0, 38.0, 26.0),
    TapeRow::female(13.0, 30.0, 40.0, 30.0),
    TapeRow::female(13.5, 32.0, 42.0, 34.0),
    TapeRow::female(14.0, 34.0, 44.0, 38.0),
];

/// Inclusive match window around each chart value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeTolerance {
    pub neck: f64,
    pub waist: f64,
    pub hip: f64,
}

impl Default for TapeTolerance {
    fn default() -> Self {
        Self {
            neck: 0.75,
            waist: 1.5,
            hip: 1.5,
        }
    }
}

/// Lookup tables for one gender.
#[derive(Debug, Clone, PartialEq)]
pub struct GenderTables {
    pub screening_weight: Vec<(u8, f64)>,
    pub body_fat: Vec<(f64, f64)>,
    pub tape_chart: Vec<TapeRow>,
}

/// Complete table set consulted by the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCompTables {
    pub male: GenderTables,
    pub female: GenderTables,
    pub tolerance: TapeTolerance,
}

impl Default for BodyCompTables {
    fn default() -> Self {
        Self::standard()
    }
}

impl BodyCompTables {
    pub fn standard() -> Self {
        Self {
            male: GenderTables {
                screening_weight: MALE_SCREENING_WEIGHT.to_vec(),
                body_fat: MALE_BODY_FAT.to_vec(),
                tape_chart: MALE_TAPE_CHART.to_vec(),
            },
            female: GenderTables {
                screening_weight: FEMALE_SCREENING_WEIGHT.to_vec(),
                body_fat: FEMALE_BODY_FAT.to_vec(),
                tape_chart: FEMALE_TAPE_CHART.to_vec(),
            },
            tolerance: TapeTolerance::default(),
        }
    }

    /// A missing gender selects the male tables.
    pub fn for_gender(&self, gender: Option<Gender>) -> &GenderTables {
        match gender {
            Some(Gender::Female) => &self.female,
            Some(Gender::Male) | None => &self.male,
        }
    }

    /// Heights are rounded to the nearest inch, half away from zero.
    pub fn screening_weight_for(&self, height: f64, gender: Option<Gender>) -> Option<f64> {
        if !height.is_finite() {
            return None;
        }
        let rounded = height.round();
        self.for_gender(gender)
            .screening_weight
            .iter()
            .find(|(inches, _)| f64::from(*inches) == rounded)
            .map(|(_, max_weight)| *max_weight)
    }

    /// Step lookup: the largest breakpoint at or below `age`, else the smallest breakpoint.
    pub fn allowable_body_fat_for(&self, age: f64, gender: Option<Gender>) -> f64 {
        let table = &self.for_gender(gender).body_fat;
        let mut allowance = table.first().map(|(_, percent)| *percent);
        for (breakpoint, percent) in table {
            if *breakpoint <= age {
                allowance = Some(*percent);
            }
        }
        allowance.unwrap_or(0.0)
    }

    pub fn estimate_body_fat(&self, measurements: &Measurements) -> Option<f64> {
        let chart = &self.for_gender(measurements.gender).tape_chart;
        first_matching_row(chart, measurements, &self.tolerance).map(|row| row.body_fat)
    }
}

/// Returns the first row, in chart order, whose defined measurements are all in tolerance.
pub fn first_matching_row<'a>(
    chart: &'a [TapeRow],
    measurements: &Measurements,
    tolerance: &TapeTolerance,
) -> Option<&'a TapeRow> {
    chart.iter().find(|row| {
        within(row.neck, measurements.neck, tolerance.neck)
            && within(row.waist, measurements.waist, tolerance.waist)
            && within(row.hip, measurements.hip, tolerance.hip)
    })
}

fn within(reference: Option<f64>, candidate: Option<f64>, tolerance: f64) -> bool {
    match (reference, candidate) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(reference), Some(candidate)) => (candidate - reference).abs() <= tolerance,
    }
}
