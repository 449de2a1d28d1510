use super::horizon::Horizon;

/// Daily time-of-day window during which no charging takes place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackoutWindow {
    /// Start hour of day (inclusive).
    pub start_hour: f32,
    /// End hour of day (exclusive). May be smaller than `start_hour` for
    /// windows that span midnight.
    pub end_hour: f32,
}

impl BlackoutWindow {
    /// Creates a window spanning `[start_hour, end_hour)` every day.
    ///
    /// # Panics
    ///
    /// Panics if either bound lies outside `[0, 24]` or the bounds are equal.
    pub fn new(start_hour: f32, end_hour: f32) -> Self {
        assert!((0.0..=24.0).contains(&start_hour));
        assert!((0.0..=24.0).contains(&end_hour));
        assert!(start_hour != end_hour);
        Self {
            start_hour,
            end_hour,
        }
    }

    /// Returns `true` when `hour` (time of day) falls within the window.
    pub fn contains_hour(&self, hour: f32) -> bool {
        if self.start_hour < self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Returns `true` when step `t` starts inside the window.
    pub fn is_active(&self, horizon: &Horizon, t: usize) -> bool {
        self.contains_hour(horizon.hour_of_day(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_only_inside_window() {
        let w = BlackoutWindow::new(17.0, 20.0);
        assert!(!w.contains_hour(16.75));
        assert!(w.contains_hour(17.0));
        assert!(w.contains_hour(19.75));
        assert!(!w.contains_hour(20.0));
    }

    #[test]
    fn window_can_span_midnight() {
        let w = BlackoutWindow::new(22.0, 2.0);
        assert!(w.contains_hour(23.5));
        assert!(w.contains_hour(0.0));
        assert!(w.contains_hour(1.75));
        assert!(!w.contains_hour(2.0));
        assert!(!w.contains_hour(12.0));
    }

    #[test]
    fn applies_every_day_of_horizon() {
        let h = Horizon::new(60, 3);
        let w = BlackoutWindow::new(18.0, 19.0);
        let active: Vec<usize> = h.timesteps().filter(|&t| w.is_active(&h, t)).collect();
        assert_eq!(active, vec![18, 42, 66]);
    }

    #[test]
    #[should_panic]
    fn empty_window_panics() {
        BlackoutWindow::new(5.0, 5.0);
    }
}
