use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::api::FormData;
use crate::map::{parse_google_maps_url, LatLng, MapUrlError};

/// A directory listing from `/afghan/business/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub longitude: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl Business {
    /// Marker position, if both coordinates parse
    pub fn coordinates(&self) -> Option<LatLng> {
        LatLng::parse(self.latitude.as_deref()?, self.longitude.as_deref()?)
    }
}

/// Decimal fields arrive as strings from the backend, numbers from some fixtures
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// One page of a paginated listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Filters for the business listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessQuery {
    pub category: Option<String>,
    pub province: Option<String>,
    pub search: Option<String>,
}

impl BusinessQuery {
    /// Query parameters, omitting empty filters
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(province) = self.province.as_deref().filter(|p| !p.is_empty()) {
            pairs.push(("province", province.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}

/// Create-business form
#[derive(Debug, Clone, Default)]
pub struct NewBusiness {
    pub name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub category: String,
    pub province: String,
    pub facebook_link: String,
    pub instagram_link: String,
    pub youtube_link: String,
    pub website_link: String,
    pub map_location_url: String,
    pub featured: bool,
    pub image: Option<PathBuf>,
}

impl NewBusiness {
    /// Coordinates from the map URL. An empty URL means no coordinates.
    pub fn coordinates(&self) -> Result<Option<LatLng>, MapUrlError> {
        if self.map_location_url.is_empty() {
            return Ok(None);
        }
        parse_google_maps_url(&self.map_location_url).map(Some)
    }

    /// Build the multipart payload. Fails on an unusable map URL before
    /// anything is read from disk.
    pub fn to_form(&self) -> Result<FormData, NewBusinessError> {
        let coordinates = self.coordinates()?;

        let mut form = FormData::new()
            .text("name", &self.name)
            .text("contact_email", &self.contact_email)
            .text("contact_phone", &self.contact_phone)
            .text("address", &self.address)
            .text("category", &self.category)
            .text("province", &self.province)
            .text("facebook_link", &self.facebook_link)
            .text("instagram_link", &self.instagram_link)
            .text("youtube_link", &self.youtube_link)
            .text("website_link", &self.website_link)
            .text("map_location_url", &self.map_location_url)
            .text("featured", self.featured.to_string());

        if let Some(ref image) = self.image {
            form = form.file("image", image)?;
        }

        if let Some(p) = coordinates {
            form = form
                .text("latitude", p.lat.to_string())
                .text("longitude", p.lng.to_string());
        }

        Ok(form)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum NewBusinessError {
    #[error("Cannot submit: Map URL is invalid. {0}")]
    MapUrl(#[from] MapUrlError),

    #[error("Failed to read image: {0}")]
    Image(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_page_with_string_and_number_coordinates() {
        let json = r#"{
            "count": 2,
            "next": "http://localhost:8000/afghan/business/?page=2",
            "previous": null,
            "results": [
                {"id": 1, "name": "Kabul Bakery", "latitude": "34.5553", "longitude": "69.2075"},
                {"id": 2, "name": "Herat Rugs", "latitude": 34.35, "longitude": 62.2, "featured": true}
            ]
        }"#;
        let page: Page<Business> = serde_json::from_str(json).unwrap();
        assert_eq!(page.count, 2);
        assert!(page.next.is_some());
        assert!(page.previous.is_none());
        assert_eq!(page.results[0].coordinates(), Some(LatLng { lat: 34.5553, lng: 69.2075 }));
        assert_eq!(page.results[1].latitude.as_deref(), Some("34.35"));
        assert!(page.results[1].featured);
    }

    #[test]
    fn test_query_pairs_omit_empty_and_trim_search() {
        let q = BusinessQuery {
            category: Some("3".into()),
            province: Some(String::new()),
            search: Some("  bakery ".into()),
        };
        assert_eq!(
            q.to_query_pairs(),
            vec![("category", "3".to_string()), ("search", "bakery".to_string())]
        );

        let q = BusinessQuery {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(q.to_query_pairs().is_empty());
    }

    #[test]
    fn test_form_adds_coordinates_from_map_url() {
        let nb = NewBusiness {
            name: "Kabul Bakery".into(),
            map_location_url: "https://www.google.com/maps/place/x/@34.5553,69.2075,15z".into(),
            ..Default::default()
        };
        let form = nb.to_form().unwrap();
        assert_eq!(form.get_text("latitude"), Some("34.5553"));
        assert_eq!(form.get_text("longitude"), Some("69.2075"));
        assert_eq!(form.get_text("featured"), Some("false"));
        // Empty text fields are still sent
        assert_eq!(form.get_text("website_link"), Some(""));
        assert!(form.get("image").is_none());
    }

    #[test]
    fn test_form_without_map_url_has_no_coordinates() {
        let form = NewBusiness::default().to_form().unwrap();
        assert!(form.get("latitude").is_none());
    }

    #[test]
    fn test_form_rejects_bad_map_url() {
        let nb = NewBusiness {
            map_location_url: "https://example.com/maps/@1.0,2.0".into(),
            ..Default::default()
        };
        assert!(matches!(
            nb.to_form(),
            Err(NewBusinessError::MapUrl(MapUrlError::NotGoogleMaps))
        ));
    }
}
