//! Time windows and customer attributes.

use serde::{Deserialize, Serialize};

use crate::network::{CustomerIndex, VertexId};

/// A service window in minutes.
///
/// A vehicle may arrive early and wait until `ready`; service must start no
/// later than `due`.
///
/// # Examples
///
/// ```
/// use u_cvrptw::models::TimeWindow;
///
/// let tw = TimeWindow::new(100.0, 200.0).unwrap();
/// assert!(tw.contains(150.0));
/// assert_eq!(tw.service_start(40.0), 100.0);
/// assert!(tw.is_violated(250.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    ready: f64,
    due: f64,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `ready > due` or either value is non-finite.
    pub fn new(ready: f64, due: f64) -> Option<Self> {
        if !ready.is_finite() || !due.is_finite() || ready > due {
            return None;
        }
        Some(Self { ready, due })
    }

    /// Earliest service start.
    pub fn ready(&self) -> f64 {
        self.ready
    }

    /// Latest service start.
    pub fn due(&self) -> f64 {
        self.due
    }

    /// Returns `true` if the given time falls within this window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.ready && time <= self.due
    }

    /// Service start after waiting for the window to open.
    pub fn service_start(&self, arrival: f64) -> f64 {
        arrival.max(self.ready)
    }

    /// Returns `true` if arriving at the given time misses the window.
    pub fn is_violated(&self, arrival: f64) -> bool {
        arrival > self.due
    }
}

/// A customer vertex of the network with its service attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    index: CustomerIndex,
    vertex: VertexId,
    name: String,
    demand: f64,
    service_minutes: f64,
    window: TimeWindow,
}

impl Customer {
    pub(crate) fn new(
        index: CustomerIndex,
        vertex: VertexId,
        name: impl Into<String>,
        demand: f64,
        service_minutes: f64,
        window: TimeWindow,
    ) -> Self {
        Self {
            index,
            vertex,
            name: name.into(),
            demand,
            service_minutes,
            window,
        }
    }

    /// Dense index used for partitioning rows and dual prices.
    pub fn index(&self) -> CustomerIndex {
        self.index
    }

    /// Network vertex of this customer.
    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Location name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units delivered at this stop.
    pub fn demand(&self) -> f64 {
        self.demand
    }

    /// Stop (service) duration in minutes.
    pub fn service_minutes(&self) -> f64 {
        self.service_minutes
    }

    /// Service window.
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_invalid() {
        assert!(TimeWindow::new(20.0, 10.0).is_none());
        assert!(TimeWindow::new(f64::NAN, 10.0).is_none());
        assert!(TimeWindow::new(10.0, f64::INFINITY).is_none());
        assert!(TimeWindow::new(10.0, 10.0).is_some());
    }

    #[test]
    fn test_time_window_bounds() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert!(tw.contains(10.0));
        assert!(tw.contains(20.0));
        assert!(!tw.contains(9.9));
        assert!(!tw.is_violated(20.0));
        assert!(tw.is_violated(20.1));
    }

    #[test]
    fn test_service_start_waits() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert_eq!(tw.service_start(5.0), 10.0);
        assert_eq!(tw.service_start(15.0), 15.0);
        assert_eq!(tw.service_start(25.0), 25.0);
    }

    #[test]
    fn test_customer_accessors() {
        let tw = TimeWindow::new(0.0, 60.0).expect("valid");
        let c = Customer::new(CustomerIndex(0), VertexId(2), "C1", 4.0, 10.0, tw);
        assert_eq!(c.index(), CustomerIndex(0));
        assert_eq!(c.vertex(), VertexId(2));
        assert_eq!(c.name(), "C1");
        assert_eq!(c.demand(), 4.0);
        assert_eq!(c.service_minutes(), 10.0);
        assert_eq!(c.window().due(), 60.0);
    }
}
