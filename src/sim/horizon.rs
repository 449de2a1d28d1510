//! The global timestamp sequence: an equally spaced clock over the simulated days.

use std::ops::Range;

use serde::Serialize;

/// Minutes in one day.
pub const MINUTES_PER_DAY: usize = 1440;

/// Equally spaced simulation clock.
///
/// Every per-vehicle and per-group series is indexed by the step numbers
/// this horizon yields.
///
/// # Examples
///
/// ```
/// use ev_charge_sim::sim::horizon::Horizon;
///
/// let h = Horizon::new(15, 7);
/// assert_eq!(h.steps_per_day, 96);
/// assert_eq!(h.total_steps(), 672);
/// assert_eq!(h.dt_hours, 0.25);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Horizon {
    /// Step length in minutes.
    pub resolution_minutes: usize,
    /// Number of steps per simulated day.
    pub steps_per_day: usize,
    /// Number of simulated days.
    pub days: usize,
    /// Step length in hours, used for every kW to kWh conversion.
    pub dt_hours: f32,
}

impl Horizon {
    /// Creates a horizon of `days` days at `resolution_minutes` resolution.
    ///
    /// # Panics
    ///
    /// Panics if `days` is zero or `resolution_minutes` does not divide a day.
    pub fn new(resolution_minutes: usize, days: usize) -> Self {
        assert!(
            resolution_minutes > 0 && MINUTES_PER_DAY % resolution_minutes == 0,
            "resolution_minutes must divide 1440"
        );
        assert!(days > 0, "days must be > 0");
        Self {
            resolution_minutes,
            steps_per_day: MINUTES_PER_DAY / resolution_minutes,
            days,
            dt_hours: resolution_minutes as f32 / 60.0,
        }
    }

    /// Total number of steps across all days.
    pub fn total_steps(&self) -> usize {
        self.steps_per_day * self.days
    }

    /// Index of the last step.
    pub fn final_step(&self) -> usize {
        self.total_steps() - 1
    }

    /// All step indices in chronological order.
    pub fn timesteps(&self) -> Range<usize> {
        0..self.total_steps()
    }

    /// Position of `t` within its day.
    pub fn step_of_day(&self, t: usize) -> usize {
        t % self.steps_per_day
    }

    /// Day number of `t`, starting at zero.
    pub fn day_of(&self, t: usize) -> usize {
        t / self.steps_per_day
    }

    /// Hour of day at the start of step `t`, in `[0, 24)`.
    pub fn hour_of_day(&self, t: usize) -> f32 {
        self.step_of_day(t) as f32 * self.dt_hours
    }

    /// Elapsed hours since the start of the horizon.
    pub fn time_hr(&self, t: usize) -> f32 {
        t as f32 * self.dt_hours
    }

    /// Step index of `hour` on `day`, rounded to the nearest step.
    pub fn step_at(&self, day: usize, hour: f32) -> usize {
        day * self.steps_per_day + self.steps_for_hours(hour)
    }

    /// Converts a duration in hours to a whole number of steps (rounded).
    pub fn steps_for_hours(&self, hours: f32) -> usize {
        (hours / self.dt_hours).round().max(0.0) as usize
    }
}
