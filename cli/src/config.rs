//! Curve and verifier configuration loading

use anyhow::{Context, Result};
use curve_model::CurveConfig;
use proofs_z3::VerifierConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of the optional TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub curve: CurveConfig,
    pub verifier: VerifierConfig,
}

impl AppConfig {
    /// Load from `path` if given, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let path = expand_path(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;

        config
            .verifier
            .validate()
            .with_context(|| format!("Invalid verifier settings in: {}", path.display()))?;

        Ok(config)
    }
}

/// Expand a leading `~` in a user-supplied path
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofs_z3::{ExponentStrategy, Symbol, VerificationMode};
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.curve.unit, curve_model::UNIT);
        assert_eq!(config.curve.base_fee_bps, curve_model::BASE_FEE_BPS);
    }

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[curve]
unit = 1000000
base_fee_bps = 30

[verifier]
timeout_ms = 2500
mode = "per_invariant"
exponents = {{ enumerated = [1, 2] }}

[verifier.bounds.x]
min = 0
max = 500
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.curve.unit, 1_000_000);
        assert_eq!(config.curve.base_fee_bps, 30);
        assert_eq!(config.verifier.timeout_ms, Some(2500));
        assert_eq!(config.verifier.mode, VerificationMode::PerInvariant);
        assert_eq!(config.verifier.exponents, ExponentStrategy::Enumerated(vec![1, 2]));
        assert_eq!(config.verifier.bounds[&Symbol::TradeSize].max, Some(500));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[curve]\nbase_fee_bps = 10").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.curve.unit, curve_model::UNIT);
        assert_eq!(config.curve.base_fee_bps, 10);
        assert_eq!(config.verifier, VerifierConfig::default());
    }

    #[test]
    fn test_invalid_verifier_settings_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[verifier]\nexponents = {{ enumerated = [] }}").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid verifier settings"));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_file(Path::new("/nonexistent/curvecheck.toml")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
