//! Reference evaluation of trigger conditions over synthetic bars. The
//! generated scripts run on the charting platform, never here; these
//! evaluators replay the same conditions in-process so tests can check the
//! semantics the scripts describe. Bars are in chronological order.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    fn is_red(&self) -> bool {
        self.close < self.open
    }

    fn is_green(&self) -> bool {
        self.close > self.open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    High,
    Low,
    Close,
}

impl PriceField {
    fn of(self, bar: &Bar) -> f64 {
        match self {
            PriceField::High => bar.high,
            PriceField::Low => bar.low,
            PriceField::Close => bar.close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSide {
    High,
    Low,
}

pub const ONE_TICK: f64 = 0.01;

/// Close crosses above the highest `basis` value of the prior `lookback`
/// bars, current bar excluded. One flag per bar.
pub fn breakout(bars: &[Bar], lookback: usize, basis: PriceField) -> Vec<bool> {
    cross_prior_extreme(bars, lookback, basis, true)
}

/// Mirror of [`breakout`]: close crosses below the lowest prior value.
pub fn breakdown(bars: &[Bar], lookback: usize, basis: PriceField) -> Vec<bool> {
    cross_prior_extreme(bars, lookback, basis, false)
}

fn cross_prior_extreme(bars: &[Bar], lookback: usize, basis: PriceField, above: bool) -> Vec<bool> {
    let level = |i: usize| -> Option<f64> {
        if lookback == 0 || i < lookback {
            return None;
        }
        bars[i - lookback..i]
            .iter()
            .map(|b| basis.of(b))
            .reduce(|acc, v| if above { acc.max(v) } else { acc.min(v) })
    };

    (0..bars.len())
        .map(|i| {
            let (Some(cur), Some(prev)) = (level(i), i.checked_sub(1).and_then(level)) else {
                return false;
            };
            if above {
                bars[i].close > cur && bars[i - 1].close <= prev
            } else {
                bars[i].close < cur && bars[i - 1].close >= prev
            }
        })
        .collect()
}

/// Close crosses below the simple moving average of close over `window` bars
/// (current bar included, as the platform computes it).
pub fn ma_breakdown(bars: &[Bar], window: usize) -> Vec<bool> {
    let sma = |i: usize| -> Option<f64> {
        if window == 0 || i + 1 < window {
            return None;
        }
        let sum: f64 = bars[i + 1 - window..=i].iter().map(|b| b.close).sum();
        Some(sum / window as f64)
    };

    (0..bars.len())
        .map(|i| {
            let (Some(cur), Some(prev)) = (sma(i), i.checked_sub(1).and_then(sma)) else {
                return false;
            };
            bars[i].close < cur && bars[i - 1].close >= prev
        })
        .collect()
}

/// 3 red bars then 1 green arm a (high, low) pair; fires once when a later
/// high exceeds the armed high by more than one tick, and disarms without
/// firing if a later low undercuts the armed low first.
pub fn bullish_reversal(bars: &[Bar], tick: f64) -> Vec<bool> {
    reversal(bars, tick, RangeSide::High)
}

/// Mirror: 3 green bars then 1 red; fires on a break below the armed low.
pub fn bearish_reversal(bars: &[Bar], tick: f64) -> Vec<bool> {
    reversal(bars, tick, RangeSide::Low)
}

fn reversal(bars: &[Bar], tick: f64, side: RangeSide) -> Vec<bool> {
    let mut out = vec![false; bars.len()];
    let mut armed: Option<(f64, f64)> = None;

    for i in 0..bars.len() {
        // Pattern over the four completed bars before bar i; re-arming
        // overwrites any remembered pair.
        if i >= 4 {
            let (a, b, c, d) = (&bars[i - 4], &bars[i - 3], &bars[i - 2], &bars[i - 1]);
            let matched = match side {
                RangeSide::High => a.is_red() && b.is_red() && c.is_red() && d.is_green(),
                RangeSide::Low => a.is_green() && b.is_green() && c.is_green() && d.is_red(),
            };
            if matched {
                armed = Some(match side {
                    RangeSide::High => (d.high, a.low.min(b.low).min(c.low)),
                    RangeSide::Low => (a.high.max(b.high).max(c.high), d.low),
                });
            }
        }

        if let Some((range_high, range_low)) = armed {
            let fired = match side {
                RangeSide::High => bars[i].high > range_high + tick,
                RangeSide::Low => bars[i].low < range_low - tick,
            };
            let invalidated = match side {
                RangeSide::High => bars[i].low < range_low,
                RangeSide::Low => bars[i].high > range_high,
            };
            // A bar that both breaks out and invalidates counts as a fire,
            // matching the generated script's condition order.
            if fired {
                out[i] = true;
                armed = None;
            } else if invalidated {
                armed = None;
            }
        }
    }

    out
}

/// Opening-range break. Each session locks in the high/low of its first
/// `window` bars, arms once the window closes, and fires at most once per
/// session. Returns one flag vector per session.
pub fn opening_range(
    sessions: &[Vec<Bar>],
    window: usize,
    side: RangeSide,
    tick: f64,
) -> Vec<Vec<bool>> {
    sessions
        .iter()
        .map(|bars| {
            let mut out = vec![false; bars.len()];
            if window == 0 || bars.len() <= window {
                return out;
            }

            let or_high = bars[..window]
                .iter()
                .map(|b| b.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let or_low = bars[..window]
                .iter()
                .map(|b| b.low)
                .fold(f64::INFINITY, f64::min);

            for (i, bar) in bars.iter().enumerate().skip(window) {
                let fired = match side {
                    RangeSide::High => bar.high > or_high + tick,
                    RangeSide::Low => bar.low < or_low - tick,
                };
                if fired {
                    out[i] = true;
                    break;
                }
            }
            out
        })
        .collect()
}
