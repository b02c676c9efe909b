use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY: u32 = 24;
pub const DAYS_PER_YEAR: u32 = 365;
pub const SYNODIC_MONTH_DAYS: f64 = 29.53;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// Northern-hemisphere season for a day of the year.
    pub fn from_day(day_of_year: u32) -> Self {
        match day_of_year {
            79..=171 => Season::Spring,
            172..=265 => Season::Summer,
            266..=354 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// Calendar position of the world. One tick is one in-game hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldTime {
    pub tick: u64,
    pub year: u32,
    pub day_of_year: u32,
    pub hour: u32,
    pub season: Season,
    /// Fraction of the synodic month: 0.0 new moon, 0.5 full moon.
    pub lunar_phase: f64,
}

impl WorldTime {
    pub fn new(start_day: u32, start_hour: u32) -> Self {
        let mut time = Self {
            tick: 0,
            year: 0,
            day_of_year: start_day % DAYS_PER_YEAR,
            hour: start_hour % HOURS_PER_DAY,
            season: Season::Winter,
            lunar_phase: 0.0,
        };
        time.refresh_derived();
        time
    }

    pub fn advance(&mut self) {
        self.tick += 1;
        self.hour += 1;
        if self.hour >= HOURS_PER_DAY {
            self.hour = 0;
            self.day_of_year += 1;
            if self.day_of_year >= DAYS_PER_YEAR {
                self.day_of_year = 0;
                self.year += 1;
            }
        }
        self.refresh_derived();
    }

    pub fn total_days(&self) -> f64 {
        self.year as f64 * DAYS_PER_YEAR as f64
            + self.day_of_year as f64
            + self.hour as f64 / HOURS_PER_DAY as f64
    }

    /// Annual angle in radians, zero at the June solstice.
    pub fn solstice_angle(&self) -> f64 {
        let day = self.day_of_year as f64 + self.hour as f64 / HOURS_PER_DAY as f64;
        2.0 * std::f64::consts::PI * (day - 172.0) / DAYS_PER_YEAR as f64
    }

    fn lunar_day(&self) -> f64 {
        self.lunar_phase * SYNODIC_MONTH_DAYS
    }

    pub fn is_new_moon(&self) -> bool {
        self.lunar_day() < 1.0
    }

    pub fn is_full_moon(&self) -> bool {
        (self.lunar_day() - SYNODIC_MONTH_DAYS / 2.0).abs() < 0.5
    }

    /// 1.0 at new and full moon (spring tides), 0.0 at the quarters.
    pub fn tidal_force(&self) -> f64 {
        (2.0 * std::f64::consts::PI * self.lunar_phase).cos().abs()
    }

    fn refresh_derived(&mut self) {
        self.season = Season::from_day(self.day_of_year);
        self.lunar_phase = (self.total_days() / SYNODIC_MONTH_DAYS).fract();
    }
}

impl Default for WorldTime {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
