use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("expected `lat,lng`, got {0:?}")]
    Format(String),
    #[error("invalid radius {0:?}, expected a non negative number of km or `inf`")]
    Radius(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }

        Ok(LatLng { lat, lng })
    }

    pub fn distance_km(self, other: LatLng) -> f64 {
        haversine_km(self, other)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for LatLng {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| GeoError::Format(s.to_string()))?;

        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| GeoError::Format(s.to_string()))
        };

        LatLng::new(parse(lat)?, parse(lng)?)
    }
}

/// Search radius in kilometers, `inf` meaning no limit.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RadiusKm(f64);

impl RadiusKm {
    pub const UNLIMITED: RadiusKm = RadiusKm(f64::INFINITY);

    pub fn new(km: f64) -> Result<Self, GeoError> {
        if km.is_nan() || km < 0.0 {
            return Err(GeoError::Radius(km.to_string()));
        }
        Ok(RadiusKm(km))
    }

    pub fn km(self) -> f64 {
        self.0
    }

    pub fn is_unlimited(self) -> bool {
        self.0.is_infinite()
    }
}

impl Default for RadiusKm {
    fn default() -> Self {
        RadiusKm(10.0)
    }
}

impl fmt::Display for RadiusKm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            write!(f, "inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for RadiusKm {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let km = s
            .trim()
            .parse::<f64>()
            .map_err(|_| GeoError::Radius(s.to_string()))?;

        RadiusKm::new(km).map_err(|_| GeoError::Radius(s.to_string()))
    }
}

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // rounding can push h just past 1 near antipodes
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// The point reached from `start` travelling `km` along the great circle
/// with initial `bearing` (radians, clockwise from north).
pub fn destination(start: LatLng, bearing: f64, km: f64) -> LatLng {
    let d = km / EARTH_RADIUS_KM;
    let (lat1, lng1) = (start.lat.to_radians(), start.lng.to_radians());

    let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * bearing.cos())
        .clamp(-1.0, 1.0)
        .asin();
    let lng2 = lng1
        + (bearing.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

    // normalize to [-180, 180)
    let lng = (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;

    LatLng {
        lat: lat2.to_degrees(),
        lng,
    }
}

/// `steps` points at distance `radius` around `center`, for drawing the
/// search area.
pub fn ring(center: LatLng, radius: RadiusKm, steps: usize) -> Vec<LatLng> {
    if radius.is_unlimited() || steps == 0 {
        return vec![];
    }

    (0..steps)
        .map(|i| {
            let bearing = i as f64 * std::f64::consts::TAU / steps as f64;
            destination(center, bearing, radius.km())
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nearby<T> {
    pub item: T,
    pub distance_km: f64,
}

/// Keep the items whose distance from `center` is at most `radius`, nearest
/// first. Items at the same distance keep their relative order.
pub fn within_radius<T>(
    center: LatLng,
    items: impl IntoIterator<Item = (LatLng, T)>,
    radius: RadiusKm,
) -> Vec<Nearby<T>> {
    let mut nearby: Vec<_> = items
        .into_iter()
        .map(|(pos, item)| Nearby {
            item,
            distance_km: haversine_km(center, pos),
        })
        .filter(|n| n.distance_km <= radius.km())
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

/// Kilometers per degree of latitude.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// A lat/lng rectangle, used as the map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl MapBounds {
    pub const WORLD: MapBounds = MapBounds {
        min_lat: -90.0,
        max_lat: 90.0,
        min_lng: -180.0,
        max_lng: 180.0,
    };

    /// The square of side `2 * radius` centered on `center`, with some margin,
    /// clamped to the world.
    pub fn around(center: LatLng, radius: RadiusKm) -> Self {
        if radius.is_unlimited() {
            return Self::WORLD;
        }

        let dlat = (radius.km() * 1.2 / KM_PER_DEGREE).max(0.01);
        let dlng = dlat / center.lat.to_radians().cos().max(0.01);

        MapBounds {
            min_lat: center.lat - dlat,
            max_lat: center.lat + dlat,
            min_lng: center.lng - dlng,
            max_lng: center.lng + dlng,
        }
        .clamped()
    }

    /// The smallest rectangle containing all the points, padded by 10%.
    pub fn fit(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;

        let mut b = MapBounds {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lng: first.lng,
            max_lng: first.lng,
        };
        for p in points {
            b.min_lat = b.min_lat.min(p.lat);
            b.max_lat = b.max_lat.max(p.lat);
            b.min_lng = b.min_lng.min(p.lng);
            b.max_lng = b.max_lng.max(p.lng);
        }

        let pad_lat = ((b.max_lat - b.min_lat) * 0.1).max(0.01);
        let pad_lng = ((b.max_lng - b.min_lng) * 0.1).max(0.01);
        b.min_lat -= pad_lat;
        b.max_lat += pad_lat;
        b.min_lng -= pad_lng;
        b.max_lng += pad_lng;

        Some(b.clamped())
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lng..=self.max_lng).contains(&p.lng)
    }

    fn clamped(self) -> Self {
        MapBounds {
            min_lat: self.min_lat.max(-90.0),
            max_lat: self.max_lat.min(90.0),
            min_lng: self.min_lng.max(-180.0),
            max_lng: self.max_lng.min(180.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYC: LatLng = LatLng {
        lat: 40.7128,
        lng: -74.0060,
    };
    const BROOKLYN: LatLng = LatLng {
        lat: 40.6782,
        lng: -73.9442,
    };
    const RIGA: LatLng = LatLng {
        lat: 56.96983479279139,
        lng: 24.1578652520115,
    };

    #[test]
    fn distance_to_self_is_zero() {
        for p in [NYC, BROOKLYN, RIGA, LatLng { lat: 90.0, lng: 180.0 }] {
            assert_eq!(haversine_km(p, p), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(haversine_km(NYC, RIGA), haversine_km(RIGA, NYC));
        assert_eq!(haversine_km(NYC, BROOKLYN), BROOKLYN.distance_km(NYC));
    }

    #[test]
    fn manhattan_to_brooklyn() {
        // 3.85 km north-south and 5.21 km east-west apart
        let d = haversine_km(NYC, BROOKLYN);
        assert!((d - 6.48).abs() <= 0.2, "got {d}");
    }

    #[test]
    fn antipodes_are_half_a_circumference_away() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;

        for i in 0..=2000 {
            let lat = -90.0 + 180.0 * i as f64 / 2000.0;
            let a = LatLng { lat, lng: 0.0 };
            let b = LatLng {
                lat: -lat,
                lng: 180.0,
            };

            let d = haversine_km(a, b);
            assert!(d.is_finite() && d <= half, "lat {lat}: {d}");
            assert!((d - half).abs() < 1e-3, "lat {lat}: {d}");

            let found = within_radius(a, vec![(b, ())], RadiusKm::UNLIMITED);
            assert_eq!(found.len(), 1, "antipode of lat {lat} dropped");
        }
    }

    #[test]
    fn pole_to_pole() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        let north = LatLng { lat: 90.0, lng: 0.0 };
        let south = LatLng {
            lat: -90.0,
            lng: 123.0,
        };

        let d = haversine_km(north, south);
        assert!(d.is_finite() && d <= half);
        assert!((d - half).abs() < 1e-6);

        // every meridian meets at the pole
        let other_north = LatLng {
            lat: 90.0,
            lng: -170.0,
        };
        assert!(haversine_km(north, other_north) < 1e-6);
    }

    #[test]
    fn ring_points_lie_on_the_radius() {
        let radius = RadiusKm::new(10.0).unwrap();
        let points = ring(NYC, radius, 64);

        assert_eq!(points.len(), 64);
        for p in &points {
            let d = haversine_km(NYC, *p);
            assert!((d - 10.0).abs() < 1e-6, "got {d}");
        }

        assert!(ring(NYC, RadiusKm::UNLIMITED, 64).is_empty());
    }

    #[test]
    fn ring_wraps_the_antimeridian() {
        let fiji = LatLng {
            lat: -17.7,
            lng: 179.9,
        };
        for p in ring(fiji, RadiusKm::new(50.0).unwrap(), 32) {
            assert!((-180.0..180.0).contains(&p.lng), "got {}", p.lng);
            assert!((haversine_km(fiji, p) - 50.0).abs() < 1e-6);
        }
    }

    #[test]
    fn tiny_distances_stay_precise() {
        // ~8.4 m apart in longitude at NYC latitude
        let b = LatLng {
            lat: NYC.lat,
            lng: NYC.lng - 0.0001,
        };
        let d = haversine_km(NYC, b) * 1000.0;
        assert!(d > 8.0 && d < 9.0, "got {d}");
    }

    #[test]
    fn zero_radius_keeps_coincident_points_only() {
        let items = vec![(BROOKLYN, "b"), (NYC, "n"), (RIGA, "r")];
        let found = within_radius(NYC, items, RadiusKm::new(0.0).unwrap());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item, "n");
        assert_eq!(found[0].distance_km, 0.0);
    }

    #[test]
    fn unlimited_radius_sorts_everything() {
        let items = vec![(RIGA, "r"), (BROOKLYN, "b"), (NYC, "n")];
        let found = within_radius(NYC, items, RadiusKm::UNLIMITED);

        let names: Vec<_> = found.iter().map(|n| n.item).collect();
        assert_eq!(names, ["n", "b", "r"]);
        assert!(found.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn ties_keep_input_order() {
        let items = vec![(BROOKLYN, 1), (NYC, 2), (BROOKLYN, 3)];
        let found = within_radius(NYC, items, RadiusKm::UNLIMITED);

        let ids: Vec<_> = found.iter().map(|n| n.item).collect();
        assert_eq!(ids, [2, 1, 3]);
    }

    #[test]
    fn growing_radius_is_monotonic() {
        let items: Vec<_> = [NYC, BROOKLYN, RIGA]
            .into_iter()
            .enumerate()
            .map(|(i, p)| (p, i))
            .collect();

        let mut previous: Vec<usize> = vec![];
        for km in [0.0, 1.0, 4.0, 5.0, 100.0, 7000.0, 10_000.0, f64::INFINITY] {
            let found: Vec<_> = within_radius(NYC, items.clone(), RadiusKm::new(km).unwrap())
                .into_iter()
                .map(|n| n.item)
                .collect();

            assert!(previous.iter().all(|i| found.contains(i)), "radius {km}");
            previous = found;
        }
        assert_eq!(previous.len(), 3);
    }

    #[test]
    fn parses_coordinates() {
        let p: LatLng = "40.7128, -74.006".parse().unwrap();
        assert_eq!(p, LatLng::new(40.7128, -74.006).unwrap());
        assert_eq!(p.to_string().parse::<LatLng>().unwrap(), p);

        assert_eq!("91,0".parse::<LatLng>(), Err(GeoError::Latitude(91.0)));
        assert_eq!("0,-181".parse::<LatLng>(), Err(GeoError::Longitude(-181.0)));
        assert!(matches!("nope".parse::<LatLng>(), Err(GeoError::Format(_))));
        assert!(matches!("NaN,1".parse::<LatLng>(), Err(GeoError::Latitude(_))));
    }

    #[test]
    fn parses_radius() {
        assert_eq!("2.5".parse::<RadiusKm>().unwrap().km(), 2.5);
        assert!("inf".parse::<RadiusKm>().unwrap().is_unlimited());
        assert_eq!(RadiusKm::UNLIMITED.to_string(), "inf");
        assert!("-1".parse::<RadiusKm>().is_err());
        assert!("NaN".parse::<RadiusKm>().is_err());
        assert!("ten".parse::<RadiusKm>().is_err());
    }
    #[test]
    fn bounds_around_center() {
        let b = MapBounds::around(NYC, RadiusKm::new(10.0).unwrap());
        assert!(b.contains(NYC));
        assert!(b.contains(BROOKLYN));
        assert!(!b.contains(RIGA));
        assert!(b.max_lng - b.min_lng > b.max_lat - b.min_lat);

        assert_eq!(MapBounds::around(NYC, RadiusKm::UNLIMITED), MapBounds::WORLD);

        let pole = MapBounds::around(
            LatLng::new(89.9, 0.0).unwrap(),
            RadiusKm::new(500.0).unwrap(),
        );
        assert_eq!(pole.max_lat, 90.0);
        assert_eq!(pole.min_lng, -180.0);
    }

    #[test]
    fn bounds_fit_points() {
        assert_eq!(MapBounds::fit(vec![]), None);

        let b = MapBounds::fit(vec![NYC, BROOKLYN]).unwrap();
        assert!(b.contains(NYC) && b.contains(BROOKLYN));
        assert!(!b.contains(RIGA));

        let single = MapBounds::fit(vec![RIGA]).unwrap();
        assert!(single.contains(RIGA));
        assert!(single.max_lat > single.min_lat);
    }
}
