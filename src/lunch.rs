//! `/lunch` restaurant search and random selection.

use anyhow::Result;
use log::{debug, error, info};
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_LOCATION: &str = "43201";
const DEFAULT_RANGE_MILES: u32 = 1;
const MAX_RANGE_MILES: u32 = 25;
const METERS_PER_MILE: u32 = 1609;
const RESULT_LIMIT: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LunchError {
    #[error("restaurant search returned no results")]
    NoResults,
}

#[derive(Debug, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub businesses: Vec<Business>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Business {
    pub name: String,
    pub price: Option<String>,
    pub rating: Option<f32>,
    pub location: Option<BusinessLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessLocation {
    pub address1: Option<String>,
    pub city: Option<String>,
}

/// One `/lunch` invocation: parses the optional `<location> <range>` free
/// text and builds the search request for it. Addressing (channel, user)
/// stays with the handler that posts the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunchCommand {
    location: String,
    range_miles: u32,
}

impl LunchCommand {
    pub fn new(text: &str) -> Self {
        let (location, range_miles) = parse_lunch_text(text);
        LunchCommand {
            location,
            range_miles,
        }
    }

    /// Query parameters for the restaurant-search API.
    pub fn search_params(&self) -> Vec<(String, String)> {
        vec![
            ("location".to_string(), self.location.clone()),
            (
                "radius".to_string(),
                (self.range_miles * METERS_PER_MILE).to_string(),
            ),
            ("term".to_string(), "lunch".to_string()),
            ("limit".to_string(), RESULT_LIMIT.to_string()),
            ("open_now".to_string(), "true".to_string()),
        ]
    }

    pub fn format_selection(&self, business: &Business) -> String {
        let mut details = Vec::new();
        if let Some(rating) = business.rating {
            details.push(format!("{} stars", rating));
        }
        if let Some(price) = &business.price {
            details.push(price.clone());
        }
        if let Some(location) = &business.location {
            if let Some(address) = &location.address1 {
                details.push(address.clone());
            }
        }

        if details.is_empty() {
            format!("The lunch gods have chosen *{}* for you today", business.name)
        } else {
            format!(
                "The lunch gods have chosen *{}* for you today ({})",
                business.name,
                details.join(", ")
            )
        }
    }
}

/// Pick one business uniformly at random. An empty result set is a defined
/// error, not a crash.
pub fn select_random(results: &SearchResults) -> Result<&Business, LunchError> {
    if results.businesses.is_empty() {
        return Err(LunchError::NoResults);
    }
    let mut rng = rand::rng();
    let index = rng.random_range(0..results.businesses.len());
    Ok(&results.businesses[index])
}

fn parse_lunch_text(text: &str) -> (String, u32) {
    let mut parts = text.split_whitespace();
    let location = parts
        .next()
        .map(|s| s.to_string())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    let range_miles = parts
        .next()
        .and_then(|s| s.parse::<u32>().ok())
        .map(|r| r.clamp(1, MAX_RANGE_MILES))
        .unwrap_or(DEFAULT_RANGE_MILES);
    (location, range_miles)
}

#[derive(Clone)]
pub struct RestaurantClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl RestaurantClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        RestaurantClient {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Run a restaurant search. A non-success status is a hard error that
    /// propagates to the caller.
    pub async fn search(&self, params: &[(String, String)]) -> Result<SearchResults> {
        debug!("restaurant search params: {:?}", params);
        let response = self
            .client
            .get(format!("{}/businesses/search", self.base_url))
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("restaurant search failed (status {}): {}", status, body);
            return Err(anyhow::anyhow!("restaurant search failed (status {})", status));
        }

        let results: SearchResults = response.json().await?;
        info!("restaurant search returned {} result(s)", results.businesses.len());
        Ok(results)
    }
}
