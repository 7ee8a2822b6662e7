//! Run configuration: YAML dataset jobs plus environment-derived sink
//! credentials. Everything is resolved into immutable values before a
//! pipeline starts; nothing reads the environment after that.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// One dataset job: a logical name, the API URL (with its `/p/` period
/// segment), and where the spreadsheet sheets go.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

pub fn load_job(path: &Path) -> Result<Job> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .with_context(|| format!("failed to read dataset config {}", path.display()))?;
    settings
        .try_deserialize()
        .with_context(|| format!("invalid dataset config {}", path.display()))
}

/// Credentials for the hosted store, from `SUPABASE_URL` and
/// `SUPABASE_SERVICE_ROLE_KEY`.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

pub fn supabase_from_env() -> Result<SupabaseConfig> {
    let settings = config::Config::builder()
        .add_source(config::Environment::with_prefix("SUPABASE"))
        .build()
        .context("failed to read environment")?;
    settings
        .try_deserialize()
        .context("SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn job_from_yaml() {
        let path = std::env::temp_dir().join("indicator_ingest_test_job.yml");
        fs::write(
            &path,
            "name: ibge_ipca_1737\nurl: https://api.test/p/202601\noutput_dir: out/ipca\n",
        )
        .unwrap();
        let job = load_job(&path).unwrap();
        assert_eq!(job.name, "ibge_ipca_1737");
        assert_eq!(job.url, "https://api.test/p/202601");
        assert_eq!(job.output_dir.as_deref(), Some(Path::new("out/ipca")));
    }

    #[test]
    fn output_dir_is_optional() {
        let path = std::env::temp_dir().join("indicator_ingest_test_job_min.yml");
        fs::write(&path, "name: minimal\nurl: https://api.test/p/202601\n").unwrap();
        let job = load_job(&path).unwrap();
        assert!(job.output_dir.is_none());
    }
}
