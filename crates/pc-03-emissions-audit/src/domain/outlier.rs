//! # Outlier Gate
//!
//! Admission rule for a new emissions figure given the figures it replaces
//! or extends.
//!
//! - Fewer than `min_iqr_samples` priors: accept within
//!   `[(1 - r)·median, (1 + r)·median]` where `r` is the band ratio.
//! - Otherwise: Tukey fences `[Q1 - k·IQR, Q3 + k·IQR]`.
//!
//! Both fences are inclusive. Pure functions, no I/O.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the quartiles of the prior sample are located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuartileMethod {
    /// Rank `h = (n - 1)·p / 100`, interpolated between the neighbouring
    /// order statistics.
    #[default]
    Linear,
    /// Rank `⌊p·(n + 1) / 100⌋ - 1` (integer arithmetic), clamped, then moved
    /// `(p mod 100) / 100` of the way toward the next order statistic.
    /// Kept for reproducing audits made with the first deployment.
    ShiftedRank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierParams {
    pub min_iqr_samples: usize,
    pub band_ratio: f64,
    pub iqr_multiplier: f64,
    pub quartile_method: QuartileMethod,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self {
            min_iqr_samples: 5,
            band_ratio: 0.5,
            iqr_multiplier: 1.5,
            quartile_method: QuartileMethod::Linear,
        }
    }
}

/// Inclusive acceptance interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fence {
    pub lower: f64,
    pub upper: f64,
}

impl Fence {
    pub fn admits(&self, value: i64) -> bool {
        let value = value as f64;
        value >= self.lower && value <= self.upper
    }
}

impl fmt::Display for Fence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// No priors, nothing to compare against.
    Unchecked,
    Accepted(Fence),
    Rejected(Fence),
}

impl Verdict {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

pub fn median(sorted: &[i64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 0 => Some((sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0),
        _ => Some(sorted[n / 2] as f64),
    }
}

/// `p`-th percentile (0..=100) of an ascending slice.
pub fn percentile(sorted: &[i64], p: u32, method: QuartileMethod) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let at = |i: usize| sorted[i] as f64;
    let value = match method {
        QuartileMethod::Linear => {
            let h = (n - 1) as f64 * f64::from(p.min(100)) / 100.0;
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            at(lo) + (at(hi) - at(lo)) * (h - lo as f64)
        }
        QuartileMethod::ShiftedRank => {
            let rank = (p as usize * (n + 1) / 100) as isize - 1;
            if rank < 0 {
                at(0)
            } else if rank as usize >= n - 1 {
                at(n - 1)
            } else {
                let i = rank as usize;
                at(i) + (at(i + 1) - at(i)) * f64::from(p % 100) / 100.0
            }
        }
    };
    Some(value)
}

/// Acceptance interval for the given priors, `None` when there are none.
pub fn fence(priors: &[i64], params: &OutlierParams) -> Option<Fence> {
    let mut sorted = priors.to_vec();
    sorted.sort_unstable();

    if sorted.len() < params.min_iqr_samples {
        let m = median(&sorted)?;
        return Some(Fence {
            lower: m * (1.0 - params.band_ratio),
            upper: m * (1.0 + params.band_ratio),
        });
    }

    let q1 = percentile(&sorted, 25, params.quartile_method)?;
    let q3 = percentile(&sorted, 75, params.quartile_method)?;
    let iqr = q3 - q1;
    Some(Fence {
        lower: q1 - params.iqr_multiplier * iqr,
        upper: q3 + params.iqr_multiplier * iqr,
    })
}

pub fn judge(candidate: i64, priors: &[i64], params: &OutlierParams) -> Verdict {
    match fence(priors, params) {
        None => Verdict::Unchecked,
        Some(f) if f.admits(candidate) => Verdict::Accepted(f),
        Some(f) => Verdict::Rejected(f),
    }
}
