#![warn(missing_docs)]
//! arspec Statistical Kernels
//!
//! Numeric building blocks used when a worker run is turned into a metrics record:
//! - Peak/mean reduction over per-tick resource readings
//! - Inverse-AR (whitening) filtering of the analyzed signal
//! - D'Agostino-Pearson K² normality test over the residual

mod filter;
mod normality;
mod summary;

pub use filter::{FilterError, whiten};
pub use normality::{
    GAUSSIAN_P_THRESHOLD, MIN_NORMALITY_SAMPLES, NormalTest, NormalityError, is_gaussian,
    kurtosis, normal_test, skewness,
};
pub use summary::{ResourceStats, summarize, summarize_present};
