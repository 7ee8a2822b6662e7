//! PostgREST upsert sink for the hosted store. Records are flat key/value
//! maps; the uniqueness key is (d1c, d2c, d3c).

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::config::SupabaseConfig;
use crate::sidra::SidraTable;

const BATCH_SIZE: usize = 500;
const CONFLICT_KEY: &str = "d1c,d2c,d3c";

/// One raw row as upserted, carrying the source dimension columns verbatim.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpsertRecord {
    pub d1c: Option<String>,
    pub d1n: Option<String>,
    pub d2c: Option<String>,
    pub d2n: Option<String>,
    pub d3c: Option<String>,
    pub d3n: Option<String>,
    pub mc: Option<String>,
    pub mn: Option<String>,
    pub nc: Option<String>,
    pub nn: Option<String>,
    pub v: Option<f64>,
    pub source_url: String,
}

/// Flatten the cleaned table into upsert records.
pub fn to_records(table: &SidraTable, source_url: &str) -> Vec<UpsertRecord> {
    table
        .records
        .iter()
        .map(|r| UpsertRecord {
            d1c: r.geography_code.clone(),
            d1n: r.geography_name.clone(),
            d2c: r.variable_code.clone(),
            d2n: r.variable_name.clone(),
            d3c: r.period_code.clone(),
            d3n: r.period_name.clone(),
            mc: r.measure_unit_code.clone(),
            mn: r.measure_unit_name.clone(),
            nc: r.level_code.clone(),
            nn: r.level_name.clone(),
            v: r.value,
            source_url: source_url.to_string(),
        })
        .collect()
}

/// NaN/Infinity must never reach the store; they become null. Mandatory
/// before any handoff — the REST layer has no representation for them.
pub fn sanitize(records: &mut [UpsertRecord]) {
    for record in records.iter_mut() {
        if record.v.is_some_and(|v| !v.is_finite()) {
            record.v = None;
        }
    }
}

pub struct SupabaseSink {
    endpoint: String,
    key: String,
    client: reqwest::Client,
}

impl SupabaseSink {
    pub fn new(config: &SupabaseConfig, table: &str, client: reqwest::Client) -> SupabaseSink {
        let base = config.url.trim_end_matches('/');
        SupabaseSink {
            endpoint: format!("{}/rest/v1/{}?on_conflict={}", base, table, CONFLICT_KEY),
            key: config.service_role_key.clone(),
            client,
        }
    }

    /// Upsert in fixed-size batches, sequentially. A batch failure aborts
    /// the whole run; there is no partial-batch rollback or resume
    /// checkpoint.
    pub async fn upsert(&self, records: &[UpsertRecord]) -> Result<()> {
        for chunk in records.chunks(BATCH_SIZE) {
            self.client
                .post(&self.endpoint)
                .header("apikey", &self.key)
                .header("Authorization", format!("Bearer {}", self.key))
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(chunk)
                .send()
                .await
                .context("upsert request failed")?
                .error_for_status()
                .context("upsert rejected by store")?;
        }
        info!("Upserted {} records", records.len());
        Ok(())
    }
}
