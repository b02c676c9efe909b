pub const DRY_PRECIPITATION: f64 = 5.0;
pub const DRY_HUMIDITY_FRACTION: f64 = 0.6;
pub const ONSET_TICKS: u32 = 24;
/// Dry ticks past onset at which severity saturates (sixty days).
const FULL_SEVERITY_TICKS: f64 = 24.0 * 60.0;
/// Dry-tick counter reduction for each tick of rain.
const RECOVERY_PER_WET_TICK: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroughtTransition {
    None,
    Began,
    Ended,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DroughtState {
    pub ticks_without_rain: u32,
    pub severity: f64,
    pub active: bool,
}

pub fn is_dry(precipitation: f64, humidity: f64, humidity_baseline: f64) -> bool {
    precipitation < DRY_PRECIPITATION && humidity < DRY_HUMIDITY_FRACTION * humidity_baseline
}

/// Log-scaled severity; zero until the onset threshold has been passed.
pub fn severity_for(ticks_without_rain: u32) -> f64 {
    if ticks_without_rain <= ONSET_TICKS {
        return 0.0;
    }
    let past_onset = (ticks_without_rain - ONSET_TICKS) as f64;
    ((1.0 + past_onset).ln() / (1.0 + FULL_SEVERITY_TICKS).ln()).min(1.0)
}

impl DroughtState {
    pub fn update(&mut self, dry: bool) -> DroughtTransition {
        if dry {
            self.ticks_without_rain = self.ticks_without_rain.saturating_add(1);
        } else {
            self.ticks_without_rain = self.ticks_without_rain.saturating_sub(RECOVERY_PER_WET_TICK);
        }
        self.severity = severity_for(self.ticks_without_rain);
        let was_active = self.active;
        self.active = self.ticks_without_rain > ONSET_TICKS;
        match (was_active, self.active) {
            (false, true) => DroughtTransition::Began,
            (true, false) => DroughtTransition::Ended,
            _ => DroughtTransition::None,
        }
    }

    /// Nothing left worth tracking.
    pub fn is_idle(&self) -> bool {
        self.ticks_without_rain == 0 && !self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_zero_until_onset_then_non_decreasing() {
        let mut state = DroughtState::default();
        let mut transitions = Vec::new();
        for _ in 0..ONSET_TICKS {
            transitions.push(state.update(true));
            assert_eq!(state.severity, 0.0);
            assert!(!state.active);
        }
        let mut previous = 0.0;
        for tick in 0..500 {
            let transition = state.update(true);
            if tick == 0 {
                assert_eq!(transition, DroughtTransition::Began);
            }
            assert!(state.severity > 0.0);
            assert!(state.severity >= previous);
            previous = state.severity;
        }
        assert!(transitions.iter().all(|t| *t == DroughtTransition::None));
    }

    #[test]
    fn rain_winds_the_drought_down() {
        let mut state = DroughtState::default();
        for _ in 0..100 {
            state.update(true);
        }
        let peak = state.severity;
        state.update(false);
        assert!(state.severity < peak);
        let mut ended = false;
        for _ in 0..20 {
            if state.update(false) == DroughtTransition::Ended {
                ended = true;
            }
            if state.ticks_without_rain <= ONSET_TICKS {
                assert_eq!(state.severity, 0.0);
            }
        }
        assert!(ended);
        assert!(state.is_idle());
    }

    #[test]
    fn dryness_needs_both_conditions() {
        assert!(is_dry(1.0, 0.2, 0.5));
        assert!(!is_dry(6.0, 0.2, 0.5));
        assert!(!is_dry(1.0, 0.35, 0.5));
    }
}
