//! View state carried in a URL query string, e.g. `?shop=Key+Auto+Center&radius=5`.

use reqwest::Url;
use thiserror::Error;

use crate::geo::{GeoError, LatLng, RadiusKm};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid `{key}` value: {source}")]
    Value {
        key: &'static str,
        #[source]
        source: GeoError,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    pub shop: Option<String>,
    pub at: Option<LatLng>,
    pub radius: Option<RadiusKm>,
}

impl ViewQuery {
    pub fn is_empty(&self) -> bool {
        self.shop.is_none() && self.at.is_none() && self.radius.is_none()
    }

    /// Encode as `?key=value&...`, or the empty string when there is nothing
    /// to encode.
    pub fn to_query_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut url = base_url();
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(shop) = &self.shop {
                pairs.append_pair("shop", shop);
            }
            if let Some(at) = &self.at {
                pairs.append_pair("at", &at.to_string());
            }
            if let Some(radius) = &self.radius {
                pairs.append_pair("radius", &radius.to_string());
            }
        }

        format!("?{}", url.query().unwrap_or_default())
    }

    pub fn parse(s: &str) -> Result<Self, QueryError> {
        let mut url = base_url();
        url.set_query(Some(s.trim().trim_start_matches('?')));

        let mut q = ViewQuery::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "shop" if !value.is_empty() => q.shop = Some(value.into_owned()),
                "at" => {
                    q.at = Some(value.parse().map_err(|source| QueryError::Value {
                        key: "at",
                        source,
                    })?)
                }
                "radius" => {
                    q.radius = Some(value.parse().map_err(|source| QueryError::Value {
                        key: "radius",
                        source,
                    })?)
                }
                _ => tracing::debug!(%key, "ignoring query parameter"),
            }
        }

        Ok(q)
    }
}

impl std::str::FromStr for ViewQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewQuery::parse(s)
    }
}

fn base_url() -> Url {
    Url::parse("http://localhost/").expect("static url")
}
