//! Live-scan signal core: latest-row snapshots and alert throttling.
//!
//! Scheduling, market hours and the delivery channel live outside the
//! domain; this module only decides WHAT fires and WHEN it may fire
//! again. One cooldown window per (symbol, signal kind), so a condition
//! that stays true across consecutive scans alerts once per window.

use crate::domain::indicator::IndicatorRow;
use crate::ports::notify_port::NotifyPort;
use chrono::NaiveDate;
use std::collections::HashMap;

pub const DEFAULT_COOLDOWN_SECS: i64 = 3_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Buy,
    SellHalf,
    SellAll,
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::SellHalf => write!(f, "SELL_HALF"),
            SignalKind::SellAll => write!(f, "SELL_ALL"),
        }
    }
}

/// The latest fully-resolved signal state of one symbol.
#[derive(Debug, Clone)]
pub struct SignalSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub rsi: f64,
    pub bb_position: f64,
    pub band_width: Option<f64>,
    pub squeeze: bool,
    pub buy: bool,
    pub sell_half: bool,
    pub sell_all: bool,
}

/// Snapshot from the newest row whose RSI and BB position both resolved.
pub fn latest_snapshot(symbol: &str, rows: &[IndicatorRow]) -> Option<SignalSnapshot> {
    let row = rows
        .iter()
        .rev()
        .find(|r| r.rsi.is_some() && r.bb_position.is_some())?;
    Some(SignalSnapshot {
        symbol: symbol.to_string(),
        date: row.date,
        price: row.close,
        rsi: row.rsi?,
        bb_position: row.bb_position?,
        band_width: row.band_width,
        squeeze: row.squeeze,
        buy: row.buy,
        sell_half: row.sell_half,
        sell_all: row.sell_all,
    })
}

/// Per-(symbol, kind) cooldown gate. Timestamps are plain epoch seconds
/// supplied by the caller, which keeps the gate deterministic under test.
#[derive(Debug)]
pub struct AlertThrottle {
    cooldown_secs: i64,
    last_sent: HashMap<(String, SignalKind), i64>,
}

impl AlertThrottle {
    pub fn new(cooldown_secs: i64) -> Self {
        AlertThrottle {
            cooldown_secs,
            last_sent: HashMap::new(),
        }
    }

    /// True iff the window for this (symbol, kind) has elapsed. A true
    /// answer arms the window at `now`.
    pub fn should_send(&mut self, symbol: &str, kind: SignalKind, now: i64) -> bool {
        let key = (symbol.to_string(), kind);
        if let Some(&last) = self.last_sent.get(&key) {
            if now - last < self.cooldown_secs {
                return false;
            }
        }
        self.last_sent.insert(key, now);
        true
    }
}

impl Default for AlertThrottle {
    fn default() -> Self {
        AlertThrottle::new(DEFAULT_COOLDOWN_SECS)
    }
}

/// Send one notification per newly-armed signal. Returns the number of
/// successful sends.
pub fn process_signals(
    snapshot: &SignalSnapshot,
    throttle: &mut AlertThrottle,
    notifier: &dyn NotifyPort,
    now: i64,
) -> usize {
    let mut sent = 0;
    let kinds = [
        (snapshot.buy, SignalKind::Buy),
        (snapshot.sell_half, SignalKind::SellHalf),
        (snapshot.sell_all, SignalKind::SellAll),
    ];
    for (active, kind) in kinds {
        if active && throttle.should_send(&snapshot.symbol, kind, now) {
            let message = format!(
                "[{}] {} @ {:.2} (RSI {:.1}, BB pos {:.2}{})",
                kind,
                snapshot.symbol,
                snapshot.price,
                snapshot.rsi,
                snapshot.bb_position,
                if snapshot.squeeze { ", squeeze" } else { "" },
            );
            if notifier.notify(&message) {
                sent += 1;
            }
        }
    }
    sent
}
