//! Pump detection over short-window price and volume deltas.

use crate::types::TokenSnapshot;

/// 5 minute price change (percent) above which a pair is pumping.
pub const PUMP_PRICE_CHANGE_5M: f64 = 20.0;
/// 1 hour price change (percent) above which a pair is pumping.
pub const PUMP_PRICE_CHANGE_1H: f64 = 50.0;
/// Volume surge multiplier above which a pair is pumping.
pub const PUMP_VOLUME_SURGE: f64 = 5.0;

/// Which pump conditions hold for a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSignals {
    pub fast_move: bool,
    pub hourly_move: bool,
    pub volume_surge: bool,
}

impl PumpSignals {
    pub fn any(&self) -> bool {
        self.fast_move || self.hourly_move || self.volume_surge
    }
}

pub fn pump_signals(snapshot: &TokenSnapshot) -> PumpSignals {
    PumpSignals {
        fast_move: snapshot.price_change_5m > PUMP_PRICE_CHANGE_5M,
        hourly_move: snapshot.price_change_1h > PUMP_PRICE_CHANGE_1H,
        volume_surge: snapshot.volume_surge > PUMP_VOLUME_SURGE,
    }
}

/// True iff at least one pump condition holds. Independent of the degen score.
pub fn is_pumping(snapshot: &TokenSnapshot) -> bool {
    pump_signals(snapshot).any()
}
