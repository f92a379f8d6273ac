use serde::{Deserialize, Deserializer, Serialize};

pub mod filter;
pub mod geo;
pub mod locator;
pub mod query;
pub mod util;

use geo::LatLng;

pub const DEFAULT_API: &str = "http://localhost:8083/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    pub name: String,
    #[serde(rename = "imgSrc", default)]
    pub img_src: Option<String>,
    #[serde(rename = "carModels", default, deserialize_with = "null_as_empty")]
    pub car_models: Vec<CarModel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarModel {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub phone: String,
    pub availability: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: LatLng,
}

/// A geocoder hit, as returned by Nominatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub place_id: i64,
    pub osm_type: String,
    pub osm_id: i64,
    pub display_name: String,
    #[serde(default)]
    pub importance: f64,
    pub lat: String,
    pub lon: String,
}

impl Place {
    pub fn location(&self) -> Result<LatLng, geo::GeoError> {
        format!("{},{}", self.lat, self.lon).parse()
    }
}

fn null_as_empty<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(de)?.unwrap_or_default())
}

fn user_agent() -> String {
    format!("shopfinder/{}", env!("CARGO_PKG_VERSION"))
}

/// Client for the car/shop backend.
#[derive(Debug, Clone)]
pub struct Api {
    base: reqwest::Url,
    client: reqwest::Client,
}

impl Api {
    pub fn new(mut base: reqwest::Url) -> reqwest::Result<Self> {
        // a base without a trailing slash would lose its last segment on join
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder().user_agent(user_agent()).build()?;

        Ok(Api { base, client })
    }

    pub fn base(&self) -> &reqwest::Url {
        &self.base
    }

    pub fn endpoint(&self, path: &str) -> reqwest::Url {
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    pub async fn cars(&self) -> reqwest::Result<Vec<Car>> {
        let cars: Vec<Car> = self.get("cars/v1/api/").await?;
        tracing::info!(count = cars.len(), "fetched cars");
        Ok(cars)
    }

    pub async fn shops(&self) -> reqwest::Result<Vec<Shop>> {
        let shops: Vec<Shop> = self.get("shops/v1/api/").await?;
        tracing::info!(count = shops.len(), "fetched shops");
        Ok(shops)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> reqwest::Result<T> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "GET");

        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

pub async fn geocode(query: &str) -> reqwest::Result<Vec<Place>> {
    tracing::debug!(query, "geocoding");

    reqwest::Client::new()
        .get("https://nominatim.openstreetmap.org/search")
        .query(&[("q", query), ("format", "json")])
        .header(reqwest::header::USER_AGENT, user_agent())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Link to the shop position on openstreetmap.org.
pub fn osm_link(pos: LatLng) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map=17/{lat}/{lng}",
        lat = pos.lat,
        lng = pos.lng
    )
}

/// `tel:` link for a phone number as written by the backend, e.g. `(347) 727-1913`.
pub fn tel_link(phone: &str) -> String {
    let digits: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    format!("tel:{digits}")
}
