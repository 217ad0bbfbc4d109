use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("Too many pairs: {given} given, at most {max} allowed")]
    TooManyPairs { given: usize, max: usize },
}

/// A WGS84 position in decimal degrees.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::LatitudeOutOfRange(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Builds a coordinate from the `[lon, lat]` ordering used by GeoJSON.
    pub fn from_lon_lat(lon: f64, lat: f64) -> Result<Self, ValidationError> {
        Self::new(lat, lon)
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // {:?} keeps the decimal point on whole degrees: (25.0, 55.0)
        write!(f, "({:?}, {:?})", self.lat, self.lon)
    }
}

/// Axis-aligned lon/lat bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoExtent {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoExtent {
    pub fn around(point: Coordinate) -> Self {
        Self {
            min_lon: point.lon,
            min_lat: point.lat,
            max_lon: point.lon,
            max_lat: point.lat,
        }
    }

    /// Smallest extent holding every point, or `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut points = points.into_iter();
        let mut extent = Self::around(points.next()?);
        for point in points {
            extent.include(point);
        }
        Some(extent)
    }

    pub fn include(&mut self, point: Coordinate) {
        self.min_lon = self.min_lon.min(point.lon);
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lon = self.max_lon.max(point.lon);
        self.max_lat = self.max_lat.max(point.lat);
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Grows the extent by `fraction` of its span on every side, treating
    /// spans below `min_span` as `min_span`. Results are clamped to WGS84.
    pub fn padded(&self, fraction: f64, min_span: f64) -> Self {
        let (cx, cy) = self.center();
        let half_w = self.lon_span().max(min_span) * (0.5 + fraction);
        let half_h = self.lat_span().max(min_span) * (0.5 + fraction);
        Self {
            min_lon: (cx - half_w).max(-180.0),
            min_lat: (cy - half_h).max(-90.0),
            max_lon: (cx + half_w).min(180.0),
            max_lat: (cy + half_h).min(90.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_latitude() {
        assert_eq!(
            Coordinate::new(200.0, 10.0),
            Err(ValidationError::LatitudeOutOfRange(200.0))
        );
        assert!(Coordinate::new(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_longitude() {
        assert_eq!(
            Coordinate::new(10.0, -180.5),
            Err(ValidationError::LongitudeOutOfRange(-180.5))
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_display_uses_lat_lon_order() {
        let c = Coordinate::new(25.5, 55.25).unwrap();
        assert_eq!(c.to_string(), "(25.5, 55.25)");
        assert_eq!(c.to_lon_lat(), [55.25, 25.5]);
    }

    #[test]
    fn test_display_keeps_decimal_on_whole_degrees() {
        let c = Coordinate::new(25.0, 55.0).unwrap();
        assert_eq!(c.to_string(), "(25.0, 55.0)");
    }

    #[test]
    fn test_extent_enclosing_and_padding() {
        let a = Coordinate::new(25.0, 55.0).unwrap();
        let b = Coordinate::new(25.2, 55.4).unwrap();
        let extent = GeoExtent::enclosing([a, b]).unwrap();
        assert_eq!(extent.min_lon, 55.0);
        assert_eq!(extent.max_lat, 25.2);

        let padded = extent.padded(0.05, 0.01);
        assert!(padded.contains(a));
        assert!(padded.contains(b));
        assert!(padded.lon_span() > extent.lon_span());
    }

    #[test]
    fn test_padding_single_point_uses_min_span() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let padded = GeoExtent::around(a).padded(0.0, 0.01);
        assert!((padded.lon_span() - 0.01).abs() < 1e-12);
        assert!((padded.lat_span() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_enclosing_empty_is_none() {
        assert!(GeoExtent::enclosing(Vec::new()).is_none());
    }
}
