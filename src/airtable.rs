//! Airtable-style tabular backend client, used by the `/mentor` form to fetch
//! its reference lists.

use anyhow::Result;
use log::{debug, error};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    fields: Value,
}

#[derive(Clone)]
pub struct AirtableClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl AirtableClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        AirtableClient {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch every record of `table` and project the named field.
    pub async fn list_records(&self, table: &str, field: &str) -> Result<Vec<String>> {
        debug!("airtable list: table={} field={}", table, field);
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, table))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!("airtable list failed for {} (status {})", table, status);
            return Err(anyhow::anyhow!("airtable request failed (status {})", status));
        }

        let list: RecordList = response.json().await?;
        Ok(project_field(&list.records, field))
    }
}

/// Project one named field out of a record list, skipping records where the
/// field is absent or not a string.
fn project_field(records: &[Record], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.fields.get(field))
        .filter_map(Value::as_str)
        .map(|s| s.to_string())
        .collect()
}
