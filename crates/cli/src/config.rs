//! OCI config file loading
//!
//! Reads `~/.oci/config` (INI, one section per profile) for the tenancy
//! OCID. A missing or unreadable config is a fatal setup error; the scan
//! never starts without credentials.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One profile section of the OCI config file. Only the fields the scanner
/// needs; everything else in the file is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OciProfile {
    pub tenancy: Option<String>,
    pub region: Option<String>,
}

impl OciProfile {
    /// Default config location, `~/.oci/config`.
    pub fn default_path() -> Result<PathBuf> {
        dirs_next::home_dir()
            .map(|home| home.join(".oci").join("config"))
            .context("could not determine home directory")
    }

    /// Load the named profile from the default config location.
    pub fn load(profile: &str) -> Result<Self> {
        Self::load_from(&Self::default_path()?, profile)
    }

    /// Load the named profile from an explicit config file.
    pub fn load_from(path: &Path, profile: &str) -> Result<Self> {
        if !path.exists() {
            bail!(
                "OCI config file not found at {}; run `oci setup config` first",
                path.display()
            );
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Ini))
            .build()
            .with_context(|| format!("parsing OCI config {}", path.display()))?;

        // The config crate lowercases section names.
        settings
            .get::<OciProfile>(&profile.to_lowercase())
            .with_context(|| format!("profile [{profile}] not found in {}", path.display()))
    }
}
