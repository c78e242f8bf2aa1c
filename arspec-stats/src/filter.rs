//! Whitening Filter
//!
//! Applies the AR polynomial `A(z) = a0 + a1 z^-1 + ... + ap z^-p` as an FIR
//! filter. If the model fits, the output is the innovation sequence.

use thiserror::Error;

/// Reasons the residual cannot be computed
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    /// No coefficients were supplied
    #[error("no AR coefficients supplied")]
    NoCoefficients,

    /// The signal to filter is empty
    #[error("signal is empty")]
    EmptySignal,

    /// A coefficient is NaN or infinite
    #[error("AR coefficient {index} is not finite ({value})")]
    NonFiniteCoefficient {
        /// Position of the offending coefficient
        index: usize,
        /// The offending value
        value: f64,
    },
}

/// Filter `signal` through the inverse AR model described by `coefficients`.
///
/// `e[n] = Σ_k a[k] · x[n - k]` with zero initial state; the output has the
/// same length as the input.
pub fn whiten(coefficients: &[f64], signal: &[f64]) -> Result<Vec<f64>, FilterError> {
    if coefficients.is_empty() {
        return Err(FilterError::NoCoefficients);
    }
    if signal.is_empty() {
        return Err(FilterError::EmptySignal);
    }
    if let Some((index, &value)) = coefficients
        .iter()
        .enumerate()
        .find(|(_, c)| !c.is_finite())
    {
        return Err(FilterError::NonFiniteCoefficient { index, value });
    }

    let residual = (0..signal.len())
        .map(|n| {
            coefficients
                .iter()
                .take(n + 1)
                .enumerate()
                .map(|(k, a)| a * signal[n - k])
                .sum::<f64>()
        })
        .collect();

    Ok(residual)
}
