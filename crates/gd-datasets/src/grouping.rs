//! Splitting a point stream into one route per entity per day.

use chrono::NaiveDate;

use gd_core::{TimedPoint, TimedRoute};

use crate::DatasetResult;

/// All points one taxi or user recorded on one UTC day, in radians.
#[derive(Clone, Debug, PartialEq)]
pub struct DailyRoute {
    pub entity_id: u32,
    pub date: NaiveDate,
    pub route: TimedRoute,
}

/// Consumes `(entity_id, point)` pairs in input order.  A new route starts
/// whenever the entity or the UTC date differs from the current route's.
#[derive(Debug, Default)]
pub struct DailyRouteBuilder {
    current: Option<DailyRoute>,
    finished: Vec<DailyRoute>,
}

impl DailyRouteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point given in degrees.  Returns `true` if it started a new
    /// route.
    pub fn push(&mut self, entity_id: u32, point: TimedPoint) -> DatasetResult<bool> {
        let date = point.timestamp.date_naive();
        let starts_new = !matches!(
            &self.current,
            Some(r) if r.entity_id == entity_id && r.date == date
        );
        if starts_new {
            self.close_current()?;
            self.current = Some(DailyRoute { entity_id, date, route: TimedRoute::new() });
        }
        if let Some(current) = self.current.as_mut() {
            current.route.push(point)?;
        }
        Ok(starts_new)
    }

    fn close_current(&mut self) -> DatasetResult<()> {
        if let Some(mut done) = self.current.take() {
            done.route.convert_to_radians()?;
            self.finished.push(done);
        }
        Ok(())
    }

    pub fn finish(mut self) -> DatasetResult<Vec<DailyRoute>> {
        self.close_current()?;
        Ok(self.finished)
    }
}
