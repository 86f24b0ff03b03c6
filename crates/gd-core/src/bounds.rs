//! Outer coordinate bounds used to scale routes to `[0, 1]`.

use crate::Point;

/// Min/max of the x (longitude) and y (latitude) coordinates of a point set.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationBounds {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl LocationBounds {
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        Self { lon_min, lon_max, lat_min, lat_max }
    }

    /// Degenerate bounds enclosing exactly one point.
    pub fn from_point(point: &Point) -> Self {
        Self::new(point.x_lon(), point.x_lon(), point.y_lat(), point.y_lat())
    }

    /// Bounds of all `points`, or `None` if the iterator is empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let mut bounds = Self::from_point(iter.next()?);
        for p in iter {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Grow the bounds to enclose `point`.
    pub fn include(&mut self, point: &Point) {
        self.lon_min = self.lon_min.min(point.x_lon());
        self.lon_max = self.lon_max.max(point.x_lon());
        self.lat_min = self.lat_min.min(point.y_lat());
        self.lat_max = self.lat_max.max(point.y_lat());
    }

    /// The smallest bounds enclosing both `self` and `other`.
    pub fn merge(self, other: LocationBounds) -> LocationBounds {
        Self::new(
            self.lon_min.min(other.lon_min),
            self.lon_max.max(other.lon_max),
            self.lat_min.min(other.lat_min),
            self.lat_max.max(other.lat_max),
        )
    }

    /// `(lon_min, lon_max, lat_min, lat_max)`.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.lon_min, self.lon_max, self.lat_min, self.lat_max)
    }

    #[inline]
    pub(crate) fn scale_x(&self, x: f64) -> f64 {
        scale(x, self.lon_min, self.lon_max)
    }

    #[inline]
    pub(crate) fn scale_y(&self, y: f64) -> f64 {
        scale(y, self.lat_min, self.lat_max)
    }

    #[inline]
    pub(crate) fn unscale_x(&self, x: f64) -> f64 {
        x * (self.lon_max - self.lon_min) + self.lon_min
    }

    #[inline]
    pub(crate) fn unscale_y(&self, y: f64) -> f64 {
        y * (self.lat_max - self.lat_min) + self.lat_min
    }
}

/// Zero-width spans map everything to 0.
#[inline]
fn scale(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span == 0.0 { 0.0 } else { (value - min) / span }
}
