//! Progress accounting for a running task

/// Counters plus timing for one task at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSnapshot {
    /// Units resolved so far
    pub processed_units: u32,

    /// Units in the task
    pub total_units: u32,

    /// Seconds since dispatch began
    pub elapsed_secs: f64,

    /// Estimated seconds until every unit is resolved
    pub estimated_remaining_secs: f64,
}

impl ProgressSnapshot {
    /// Build a snapshot, estimating the remaining time from the mean
    /// per-unit duration observed so far
    ///
    /// # Examples
    ///
    /// ```
    /// use proofline_domain::ProgressSnapshot;
    ///
    /// let snapshot = ProgressSnapshot::measure(2, 6, 10.0);
    /// assert_eq!(snapshot.estimated_remaining_secs, 20.0);
    /// assert_eq!(snapshot.percent(), 33.33);
    /// ```
    pub fn measure(processed_units: u32, total_units: u32, elapsed_secs: f64) -> Self {
        let remaining = total_units.saturating_sub(processed_units);
        let estimated_remaining_secs = if processed_units == 0 {
            0.0
        } else {
            elapsed_secs / processed_units as f64 * remaining as f64
        };

        Self {
            processed_units,
            total_units,
            elapsed_secs,
            estimated_remaining_secs,
        }
    }

    /// Completion percentage rounded to two decimals
    pub fn percent(&self) -> f64 {
        if self.total_units == 0 {
            return 0.0;
        }
        let raw = self.processed_units as f64 / self.total_units as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    }

    /// Whether every unit has been resolved
    pub fn is_complete(&self) -> bool {
        self.total_units > 0 && self.processed_units >= self.total_units
    }
}
