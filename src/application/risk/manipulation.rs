//! Market manipulation heuristics over prices and recent trade windows.

use std::fmt;

use serde::Serialize;

use crate::domain::TradeTick;
use crate::infrastructure::config::thresholds::FuturesThresholds;

/// Pattern reported by [`ManipulationDetector::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManipulationKind {
    PriceDeviation,
    WashTrading,
    Spoofing,
}

impl ManipulationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceDeviation => "price_deviation",
            Self::WashTrading => "wash_trading",
            Self::Spoofing => "spoofing",
        }
    }

    /// Fixed confidence attached to each pattern.
    #[must_use]
    pub const fn confidence(self) -> f64 {
        match self {
            Self::PriceDeviation => 0.9,
            Self::WashTrading => 0.7,
            Self::Spoofing => 0.6,
        }
    }
}

impl fmt::Display for ManipulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected manipulation pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManipulationSignal {
    #[serde(rename = "type")]
    pub kind: ManipulationKind,
    pub confidence: f64,
    pub detail: String,
}

impl ManipulationSignal {
    fn new(kind: ManipulationKind, detail: String) -> Self {
        Self {
            kind,
            confidence: kind.confidence(),
            detail,
        }
    }
}

/// Relative distance between `price` and `reference`.
///
/// Returns `None` when `reference` is not positive.
#[must_use]
pub fn relative_deviation(price: f64, reference: f64) -> Option<f64> {
    (reference > 0.0).then(|| (price - reference).abs() / reference)
}

/// Return `true` if `current` strays too far from the oracle or from the
/// mean of `recent` prices. An empty `recent` skips the second check.
#[must_use]
pub fn detect_price_manipulation(
    current: f64,
    oracle: f64,
    recent: &[f64],
    oracle_limit: f64,
    recent_limit: f64,
) -> bool {
    if relative_deviation(current, oracle).is_some_and(|d| d > oracle_limit) {
        return true;
    }
    if recent.is_empty() {
        return false;
    }
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    relative_deviation(current, mean).is_some_and(|d| d > recent_limit)
}

/// Number of ticks whose volume exceeds `multiplier` times the window average.
#[must_use]
pub fn count_volume_spikes(window: &[TradeTick], multiplier: f64) -> usize {
    if window.is_empty() {
        return 0;
    }
    let average = window.iter().map(|t| t.volume).sum::<f64>() / window.len() as f64;
    if average <= 0.0 {
        return 0;
    }
    window
        .iter()
        .filter(|t| t.volume > average * multiplier)
        .count()
}

/// Price direction reversals in a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reversals {
    pub count: usize,
    /// Mean time between consecutive reversals, `None` with fewer than two.
    pub mean_interval: Option<f64>,
}

/// Count sign changes of the price direction; flat moves keep the direction.
#[must_use]
pub fn price_reversals(window: &[TradeTick]) -> Reversals {
    let mut direction = 0.0_f64;
    let mut at: Vec<u64> = Vec::new();

    for pair in window.windows(2) {
        let step = pair[1].price - pair[0].price;
        if step == 0.0 {
            continue;
        }
        let sign = step.signum();
        if direction != 0.0 && sign != direction {
            at.push(pair[1].timestamp);
        }
        direction = sign;
    }

    let mean_interval = (at.len() >= 2).then(|| {
        let total: u64 = at.windows(2).map(|w| w[1].saturating_sub(w[0])).sum();
        total as f64 / (at.len() - 1) as f64
    });

    Reversals {
        count: at.len(),
        mean_interval,
    }
}

/// Trade-window manipulation detector for futures markets.
#[derive(Debug, Clone)]
pub struct ManipulationDetector {
    oracle_deviation: f64,
    volume_spike_multiplier: f64,
    max_volume_spikes: usize,
    max_price_reversals: usize,
    min_reversal_interval: f64,
}

impl Default for ManipulationDetector {
    fn default() -> Self {
        Self::new(&FuturesThresholds::default())
    }
}

impl ManipulationDetector {
    #[must_use]
    pub fn new(thresholds: &FuturesThresholds) -> Self {
        Self {
            oracle_deviation: thresholds.manipulation_oracle_deviation,
            volume_spike_multiplier: thresholds.volume_spike_multiplier,
            max_volume_spikes: thresholds.max_volume_spikes,
            max_price_reversals: thresholds.max_price_reversals,
            min_reversal_interval: thresholds.min_reversal_interval,
        }
    }

    /// Report the first matching pattern, checking price deviation, then
    /// wash trading, then spoofing.
    #[must_use]
    pub fn detect(
        &self,
        window: &[TradeTick],
        oracle_price: f64,
        mark_price: f64,
    ) -> Option<ManipulationSignal> {
        if let Some(deviation) = relative_deviation(mark_price, oracle_price) {
            if deviation > self.oracle_deviation {
                return Some(ManipulationSignal::new(
                    ManipulationKind::PriceDeviation,
                    format!("Mark price deviates {:.2}% from oracle", deviation * 100.0),
                ));
            }
        }

        let spikes = count_volume_spikes(window, self.volume_spike_multiplier);
        if spikes > self.max_volume_spikes {
            return Some(ManipulationSignal::new(
                ManipulationKind::WashTrading,
                format!("{spikes} volume spikes above {}x average", self.volume_spike_multiplier),
            ));
        }

        let reversals = price_reversals(window);
        if reversals.count > self.max_price_reversals {
            if let Some(interval) = reversals.mean_interval {
                if interval < self.min_reversal_interval {
                    return Some(ManipulationSignal::new(
                        ManipulationKind::Spoofing,
                        format!(
                            "{} price reversals, {interval:.1} apart on average",
                            reversals.count
                        ),
                    ));
                }
            }
        }

        None
    }
}
