//! Map geometry for the business directory.
//!
//! Markers come from the `latitude`/`longitude` strings the backend returns.
//! The view either fits the bounds of all plottable markers or falls back to
//! a default center.

use reqwest::Url;
use serde::Serialize;
use thiserror::Error;

use crate::models::Business;

/// Center used when no marker has usable coordinates (Lahore)
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 31.5204,
    lng: 74.3587,
};

pub const DEFAULT_ZOOM: u8 = 6;

/// Zoom applied when a single business is focused
pub const FOCUS_ZOOM: u8 = 15;

pub const MIN_ZOOM: u8 = 2;
pub const MAX_ZOOM: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Parse a coordinate pair from backend strings
    pub fn parse(lat: &str, lng: &str) -> Option<Self> {
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        if lat.is_finite() && lng.is_finite() {
            Some(Self { lat, lng })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    fn from_point(p: LatLng) -> Self {
        Self {
            south_west: p,
            north_east: p,
        }
    }

    fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn contains(&self, p: LatLng) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&p.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&p.lng)
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }
}

/// What the map should show for a set of results
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum MapView {
    Fit(Bounds),
    Center { center: LatLng, zoom: u8 },
}

impl Default for MapView {
    fn default() -> Self {
        MapView::Center {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Fit the view to every business with usable coordinates
pub fn fit_markers(businesses: &[Business], zoom: u8) -> MapView {
    let bounds = businesses
        .iter()
        .filter_map(Business::coordinates)
        .fold(None, |acc: Option<Bounds>, p| match acc {
            Some(mut b) => {
                b.extend(p);
                Some(b)
            }
            None => Some(Bounds::from_point(p)),
        });

    match bounds {
        Some(bounds) => MapView::Fit(bounds),
        None => MapView::Center {
            center: DEFAULT_CENTER,
            zoom,
        },
    }
}

/// Pan to a single business
pub fn focus(business: &Business) -> Option<MapView> {
    business.coordinates().map(|center| MapView::Center {
        center,
        zoom: FOCUS_ZOOM,
    })
}

/// Apply a zoom step, clamped to the supported range
pub fn step_zoom(current: u8, delta: i32) -> u8 {
    i32::from(current)
        .saturating_add(delta)
        .clamp(i32::from(MIN_ZOOM), i32::from(MAX_ZOOM)) as u8
}

// ============================================================================
// Google Maps URLs
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapUrlError {
    #[error("Invalid URL format.")]
    InvalidUrl,

    #[error("URL must be from 'https://www.google.com/maps/'")]
    NotGoogleMaps,

    #[error("Coordinates not found in URL. Make sure the URL includes '@lat,lon'")]
    MissingCoordinates,

    #[error("Coordinates could not be parsed as valid numbers.")]
    InvalidNumber,
}

/// Extract the `@lat,lon` pair from a Google Maps place URL.
pub fn parse_google_maps_url(url: &str) -> Result<LatLng, MapUrlError> {
    let parsed = Url::parse(url).map_err(|_| MapUrlError::InvalidUrl)?;
    if parsed.host_str() != Some("www.google.com") || !parsed.path().starts_with("/maps/") {
        return Err(MapUrlError::NotGoogleMaps);
    }

    let (lat, lng) = url
        .match_indices('@')
        .find_map(|(i, _)| coordinate_pair(&url[i + 1..]))
        .ok_or(MapUrlError::MissingCoordinates)?;

    LatLng::parse(lat, lng).ok_or(MapUrlError::InvalidNumber)
}

/// Match `<decimal>,<decimal>` at the start of `s`
fn coordinate_pair(s: &str) -> Option<(&str, &str)> {
    let (lat, rest) = decimal_prefix(s)?;
    let rest = rest.strip_prefix(',')?;
    let (lng, _) = decimal_prefix(rest)?;
    Some((lat, lng))
}

/// Match an optionally signed number with a fractional part (`-12.5`, `.5`)
fn decimal_prefix(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if bytes.get(i) != Some(&b'.') {
        return None;
    }
    i += 1;
    let fraction_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == fraction_start {
        return None;
    }
    Some((&s[..i], &s[i..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business(id: i64, lat: Option<&str>, lng: Option<&str>) -> Business {
        Business {
            id,
            name: format!("Business {}", id),
            latitude: lat.map(str::to_string),
            longitude: lng.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_google_maps_url() {
        let url = "https://www.google.com/maps/place/Kabul/@34.5553,69.2075,12z/data=!3m1";
        let p = parse_google_maps_url(url).unwrap();
        assert_eq!(p, LatLng { lat: 34.5553, lng: 69.2075 });
    }

    #[test]
    fn test_parse_google_maps_url_negative_and_signed() {
        let url = "https://www.google.com/maps/@-33.8688,+151.2093,10z";
        let p = parse_google_maps_url(url).unwrap();
        assert_eq!(p, LatLng { lat: -33.8688, lng: 151.2093 });
    }

    #[test]
    fn test_parse_google_maps_url_errors() {
        assert_eq!(parse_google_maps_url("not a url"), Err(MapUrlError::InvalidUrl));
        assert_eq!(
            parse_google_maps_url("https://maps.example.com/maps/@1.0,2.0"),
            Err(MapUrlError::NotGoogleMaps)
        );
        assert_eq!(
            parse_google_maps_url("https://www.google.com/search?q=@1.0,2.0"),
            Err(MapUrlError::NotGoogleMaps)
        );
        assert_eq!(
            parse_google_maps_url("https://www.google.com/maps/place/Kabul"),
            Err(MapUrlError::MissingCoordinates)
        );
        // Integers without a fraction are not accepted
        assert_eq!(
            parse_google_maps_url("https://www.google.com/maps/@34,69,12z"),
            Err(MapUrlError::MissingCoordinates)
        );
    }

    #[test]
    fn test_fit_markers_skips_unplottable() {
        let items = vec![
            business(1, Some("34.5"), Some("69.2")),
            business(2, Some("31.6"), Some("65.7")),
            business(3, Some("abc"), Some("65.7")),
            business(4, None, None),
        ];

        match fit_markers(&items, DEFAULT_ZOOM) {
            MapView::Fit(bounds) => {
                assert_eq!(bounds.south_west, LatLng { lat: 31.6, lng: 65.7 });
                assert_eq!(bounds.north_east, LatLng { lat: 34.5, lng: 69.2 });
                assert!(bounds.contains(LatLng { lat: 33.0, lng: 67.0 }));
            }
            other => panic!("expected fit, got {:?}", other),
        }
    }

    #[test]
    fn test_fit_markers_falls_back_to_default_center() {
        let items = vec![business(1, None, Some("69.2"))];
        assert_eq!(
            fit_markers(&items, 9),
            MapView::Center {
                center: DEFAULT_CENTER,
                zoom: 9
            }
        );
        assert_eq!(fit_markers(&[], DEFAULT_ZOOM), MapView::default());
    }

    #[test]
    fn test_focus() {
        let b = business(1, Some("34.5"), Some("69.2"));
        assert_eq!(
            focus(&b),
            Some(MapView::Center {
                center: LatLng { lat: 34.5, lng: 69.2 },
                zoom: FOCUS_ZOOM
            })
        );
        assert_eq!(focus(&business(2, None, None)), None);
    }

    #[test]
    fn test_step_zoom_clamps() {
        assert_eq!(step_zoom(6, 1), 7);
        assert_eq!(step_zoom(2, -1), MIN_ZOOM);
        assert_eq!(step_zoom(20, 3), MAX_ZOOM);
        assert_eq!(step_zoom(20, i32::MAX), MAX_ZOOM);
        assert_eq!(step_zoom(2, i32::MIN), MIN_ZOOM);
    }
}
