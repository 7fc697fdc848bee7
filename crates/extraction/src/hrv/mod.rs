//! Heart-rate-variability analysis of an RR / ACC / HR export triplet.
//!
//! Flow: RR series -> rest filter (movement from ACC) -> time-domain stats,
//! triangular index, Welch LF/HF power. HR yields min / mean / max.

mod series;
mod spectral;
mod stats;

pub use series::{read_acc_magnitude, read_hr, read_rr};
pub use spectral::{band_power, resample_tachogram, welch, CubicSpline, HF_BAND, LF_BAND};
pub use stats::rest_filter;

use contracts::{CanonicalMetric, CaptureGroup};
use tracing::debug;

use crate::error::{ExtractionError, Result};

/// RR samples needed for a spectral estimate
const MIN_SPECTRAL_SAMPLES: usize = 4;

/// Band power (ms²) below this is resampling and DFT round-off
const MIN_BAND_POWER: f64 = 1e-6;

/// Sub-kind tags of the three exports
pub const RR: &str = "RR";
pub const ACC: &str = "ACC";
pub const HR: &str = "HR";

/// Results of one recording. Fields are NaN when not computable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HrvReport {
    pub rmssd: f64,
    pub sdnn: f64,
    pub avnn: f64,
    pub lf_power: f64,
    pub hf_power: f64,
    pub lf_hf_ratio: f64,
    pub triangular_index: f64,
    pub heart_rate: Option<HeartRateSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartRateSummary {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl HeartRateSummary {
    pub fn from_series(hr: &[f64]) -> Self {
        Self {
            min: stats::min(hr),
            mean: stats::mean(hr),
            max: stats::max(hr),
        }
    }
}

impl HrvReport {
    /// Analyze an RR series (ms), already rest-filtered
    pub fn from_rr(rr_ms: &[f64]) -> Self {
        let (lf_power, hf_power) = if rr_ms.len() >= MIN_SPECTRAL_SAMPLES {
            resample_tachogram(rr_ms)
                .map(|samples| {
                    let (freqs, psd) = welch(&samples, spectral::RESAMPLE_HZ);
                    (
                        above_noise_floor(band_power(&freqs, &psd, LF_BAND)),
                        above_noise_floor(band_power(&freqs, &psd, HF_BAND)),
                    )
                })
                .unwrap_or((f64::NAN, f64::NAN))
        } else {
            (f64::NAN, f64::NAN)
        };
        let lf_hf_ratio = if hf_power > 0.0 {
            lf_power / hf_power
        } else {
            f64::NAN
        };

        Self {
            rmssd: stats::rmssd(rr_ms),
            sdnn: stats::std_dev(rr_ms),
            avnn: stats::mean(rr_ms),
            lf_power,
            hf_power,
            lf_hf_ratio,
            triangular_index: stats::triangular_index(rr_ms),
            heart_rate: None,
        }
    }

    pub fn with_heart_rate(mut self, hr: &[f64]) -> Self {
        self.heart_rate = Some(HeartRateSummary::from_series(hr));
        self
    }

    /// Report as metrics; non-finite values are left out.
    pub fn metrics(&self) -> Vec<CanonicalMetric> {
        let mut values = vec![
            ("POLAR_HRV_RMSSD", round_to(self.rmssd, 1)),
            ("POLAR_HRV_SDNN", round_to(self.sdnn, 1)),
            ("POLAR_HRV_AVNN", round_to(self.avnn, 1)),
            ("POLAR_HRV_LF_POWER", round_to(self.lf_power, 1)),
            ("POLAR_HRV_HF_POWER", round_to(self.hf_power, 1)),
            ("POLAR_HRV_LF_HF_RATIO", round_to(self.lf_hf_ratio, 2)),
            ("POLAR_HRV_TRIANGULAR_INDEX", round_to(self.triangular_index, 1)),
        ];
        if let Some(hr) = &self.heart_rate {
            values.extend([
                ("POLAR_HR_MIN", round_to(hr.min, 1)),
                ("POLAR_HR_PROMEDIO", round_to(hr.mean, 1)),
                ("POLAR_HR_MAX", round_to(hr.max, 1)),
            ]);
        }
        values
            .into_iter()
            .filter(|(_, v)| v.is_finite())
            .map(|(name, v)| CanonicalMetric::new(name, v))
            .collect()
    }
}

fn above_noise_floor(power: f64) -> f64 {
    if power.abs() < MIN_BAND_POWER {
        0.0
    } else {
        power
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// File-set analyzer for Polar exports
#[derive(Debug, Clone, Copy)]
pub struct HrvAnalyzer {
    rest_threshold: f64,
}

impl HrvAnalyzer {
    pub fn new(rest_threshold: f64) -> Self {
        Self { rest_threshold }
    }

    /// Analyze a capture group. The RR member is required; ACC and HR are
    /// used when present.
    ///
    /// # Errors
    /// `ExtractionError::Analysis` when the RR member is missing or any
    /// export cannot be parsed.
    pub fn analyze(&self, group: &CaptureGroup) -> Result<HrvReport> {
        let rr_file = group.member_for_sub_kind(RR).ok_or_else(|| {
            let anchor = group
                .first_member()
                .map(|f| f.path.clone())
                .unwrap_or_default();
            ExtractionError::analysis(&anchor, format!("group {} has no RR export", group.key))
        })?;

        let mut rr = read_rr(&rr_file.path)?;
        if let Some(acc_file) = group.member_for_sub_kind(ACC) {
            let movement = read_acc_magnitude(&acc_file.path)?;
            let total = rr.len();
            rr = rest_filter(&rr, &movement, self.rest_threshold);
            debug!(group = %group.key, total, at_rest = rr.len(), "rest filter applied");
        }

        let mut report = HrvReport::from_rr(&rr);
        if let Some(hr_file) = group.member_for_sub_kind(HR) {
            report = report.with_heart_rate(&read_hr(&hr_file.path)?);
        }
        Ok(report)
    }
}
