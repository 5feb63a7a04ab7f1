//! Statistical methods for benchmark estimation.
//!
//! This module provides the numerical kernels the estimators are built on:
//! - Quantile computation using efficient O(n) selection algorithms
//! - Welford online mean/variance for calibration readings
//! - Exact least-absolute-deviation line fitting
//! - Wilcoxon signed-rank test with a Hodges–Lehmann interval

mod lad;
mod online;
mod quantile;
mod wilcoxon;

pub use lad::{fit_lad, LadFit};
pub use online::{OnlineStats, StatsSnapshot};
pub use quantile::{compute_quantile, median, order_statistic};
pub use wilcoxon::{
    average_ranks, signed_rank_interval, signed_rank_test, SignedRankInterval, SignedRankTest,
};
