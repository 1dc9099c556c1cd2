//! Score computation and banding against the normative baseline.

use serde::{Deserialize, Serialize};

use crate::session::model::Response;

/// Question count the normative study and the band thresholds were
/// calibrated for.
pub const CALIBRATED_ITEMS: usize = 6;
/// Population mean total for the calibrated six-item scale.
pub const POPULATION_MEAN: f64 = 22.64;
/// Population standard deviation for the calibrated six-item scale.
pub const POPULATION_STD_DEV: f64 = 3.98;
/// Totals at or above this are top quartile (six items).
pub const TOP_QUARTILE_AT: u32 = 25;
/// Totals at or below this are bottom quartile (six items).
pub const BOTTOM_QUARTILE_AT: u32 = 20;

/// Qualitative score band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    TopQuartile,
    Middle,
    BottomQuartile,
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TopQuartile => "top quartile",
            Self::Middle => "middle",
            Self::BottomQuartile => "bottom quartile",
        };
        write!(f, "{s}")
    }
}

/// Band thresholds for a given number of questions.
///
/// The six-item values come from the normative study; other counts scale
/// linearly and round half up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Banding {
    pub top_at_or_above: u32,
    pub bottom_at_or_below: u32,
}

impl Banding {
    pub fn for_questions(count: usize) -> Self {
        let n = count as u32;
        let scale = |threshold: u32| (threshold * n + 3) / CALIBRATED_ITEMS as u32;
        let top_at_or_above = scale(TOP_QUARTILE_AT);
        let bottom_at_or_below = scale(BOTTOM_QUARTILE_AT).min(top_at_or_above.saturating_sub(1));
        Self {
            top_at_or_above,
            bottom_at_or_below,
        }
    }

    pub fn classify(&self, total: u32) -> Band {
        if total >= self.top_at_or_above {
            Band::TopQuartile
        } else if total <= self.bottom_at_or_below {
            Band::BottomQuartile
        } else {
            Band::Middle
        }
    }
}

/// Population reference distribution for a given number of questions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    pub items: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl Baseline {
    /// Mean scales with the item count, the deviation with its square root.
    pub fn for_questions(count: usize) -> Self {
        let ratio = count as f64 / CALIBRATED_ITEMS as f64;
        Self {
            items: count,
            mean: POPULATION_MEAN * ratio,
            std_dev: POPULATION_STD_DEV * ratio.sqrt(),
        }
    }

    pub fn z_score(&self, total: u32) -> f64 {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        (f64::from(total) - self.mean) / self.std_dev
    }

    /// Normal density at `x`.
    pub fn density(&self, x: f64) -> f64 {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        let z = (x - self.mean) / self.std_dev;
        (-0.5 * z * z).exp() / (self.std_dev * (2.0 * std::f64::consts::PI).sqrt())
    }

    /// Evenly spaced `(total, density)` points across the attainable range
    /// `items..=5 * items`, for charting the reference curve.
    pub fn density_curve(&self, points: usize) -> Vec<(f64, f64)> {
        let low = self.items as f64;
        let high = (self.items * 5) as f64;
        match points {
            0 => Vec::new(),
            1 => vec![(self.mean, self.density(self.mean))],
            _ => {
                let step = (high - low) / (points - 1) as f64;
                (0..points)
                    .map(|i| {
                        let x = low + step * i as f64;
                        (x, self.density(x))
                    })
                    .collect()
            }
        }
    }
}

/// Result of scoring a completed scale questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub total: u32,
    pub max: u32,
    pub question_count: usize,
    pub band: Band,
    pub baseline_mean: f64,
    pub baseline_std_dev: f64,
    pub z_score: f64,
}

impl ScoreSummary {
    /// Score a list of 1-5 answers.
    pub fn compute(values: &[u8]) -> Self {
        let total: u32 = values.iter().map(|v| u32::from(*v)).sum();
        Self::from_total(total, values.len())
    }

    /// Score a precomputed total for a questionnaire of `count` questions.
    pub fn from_total(total: u32, count: usize) -> Self {
        let baseline = Baseline::for_questions(count);
        Self {
            total,
            max: 5 * count as u32,
            question_count: count,
            band: Banding::for_questions(count).classify(total),
            baseline_mean: baseline.mean,
            baseline_std_dev: baseline.std_dev,
            z_score: baseline.z_score(total),
        }
    }

    /// Score the scale answers in a response list. Open responses carry no
    /// numeric value and are skipped.
    pub fn from_responses(responses: &[Response]) -> Self {
        let values: Vec<u8> = responses
            .iter()
            .filter_map(|r| match r {
                Response::Scale { value, .. } => Some(*value),
                Response::Open { .. } => None,
            })
            .collect();
        Self::compute(&values)
    }

    /// One-line comparison against the population mean.
    pub fn comparison(&self) -> String {
        let relation = if f64::from(self.total) > self.baseline_mean {
            "above"
        } else if f64::from(self.total) < self.baseline_mean {
            "below"
        } else {
            "at"
        };
        format!(
            "You scored {} out of {}, {} the population mean of {:.2} (SD {:.2}). \
             That places you in the {}.",
            self.total, self.max, relation, self.baseline_mean, self.baseline_std_dev, self.band
        )
    }
}
