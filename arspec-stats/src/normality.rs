//! Residual Normality Test
//!
//! D'Agostino-Pearson omnibus K² test. The sample skewness and kurtosis are
//! each transformed to an approximately standard normal score (D'Agostino's
//! skewness transform and the Anscombe-Glynn kurtosis transform); the sum of
//! their squares is chi-squared with two degrees of freedom under the null
//! hypothesis of normality, which gives the closed-form p-value `exp(-K²/2)`.

use thiserror::Error;

/// Smallest sample the skewness transform is defined for
pub const MIN_NORMALITY_SAMPLES: usize = 8;

/// A residual is classified Gaussian when its p-value is at least this value
pub const GAUSSIAN_P_THRESHOLD: f64 = 0.05;

/// Errors raised by the normality test
#[derive(Debug, Error, PartialEq)]
pub enum NormalityError {
    /// Not enough observations for the skewness transform
    #[error("normality test needs at least {MIN_NORMALITY_SAMPLES} samples, got {0}")]
    TooFewSamples(usize),

    /// All observations are identical
    #[error("sample variance is zero")]
    ZeroVariance,

    /// The sample contains NaN or infinite values
    #[error("sample contains non-finite values")]
    NonFinite,

    /// The test statistic could not be evaluated
    #[error("test statistic is undefined for this sample")]
    Undefined,
}

/// Outcome of the omnibus normality test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalTest {
    /// Z score of the skewness test
    pub skew_z: f64,
    /// Z score of the kurtosis test
    pub kurtosis_z: f64,
    /// K² statistic (`skew_z² + kurtosis_z²`)
    pub statistic: f64,
    /// Probability of a K² at least this large under normality
    pub p_value: f64,
}

/// Inclusive classification: `p == 0.05` counts as Gaussian.
pub fn is_gaussian(p_value: f64) -> bool {
    p_value >= GAUSSIAN_P_THRESHOLD
}

/// Central moments m2, m3, m4 (population form)
fn central_moments(samples: &[f64]) -> (f64, f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let (m2, m3, m4) = samples.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), x| {
        let d = x - mean;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    (m2 / n, m3 / n, m4 / n)
}

/// Biased sample skewness `m3 / m2^1.5`
pub fn skewness(samples: &[f64]) -> f64 {
    let (m2, m3, _) = central_moments(samples);
    m3 / m2.powf(1.5)
}

/// Biased sample kurtosis (Pearson, normal = 3) `m4 / m2²`
pub fn kurtosis(samples: &[f64]) -> f64 {
    let (m2, _, m4) = central_moments(samples);
    m4 / (m2 * m2)
}

fn skew_z(b1: f64, n: f64) -> f64 {
    let y = b1 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    delta * (y / alpha).asinh()
}

fn kurtosis_z(b2: f64, n: f64) -> f64 {
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let variance = 24.0 * n * (n - 2.0) * (n - 3.0)
        / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - expected) / variance.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0 + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}

/// Run the D'Agostino-Pearson K² test over `samples`.
pub fn normal_test(samples: &[f64]) -> Result<NormalTest, NormalityError> {
    if samples.len() < MIN_NORMALITY_SAMPLES {
        return Err(NormalityError::TooFewSamples(samples.len()));
    }
    if samples.iter().any(|x| !x.is_finite()) {
        return Err(NormalityError::NonFinite);
    }

    let (m2, m3, m4) = central_moments(samples);
    if m2 <= f64::EPSILON * f64::EPSILON {
        return Err(NormalityError::ZeroVariance);
    }

    let n = samples.len() as f64;
    let skew_z = skew_z(m3 / m2.powf(1.5), n);
    let kurtosis_z = kurtosis_z(m4 / (m2 * m2), n);
    let statistic = skew_z * skew_z + kurtosis_z * kurtosis_z;
    if !statistic.is_finite() {
        return Err(NormalityError::Undefined);
    }

    Ok(NormalTest {
        skew_z,
        kurtosis_z,
        statistic,
        p_value: (-statistic / 2.0).exp(),
    })
}
