use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Environment, File, FileFormat};
use directories_next::ProjectDirs;
use serde::Deserialize;
use tracing::info;

/// Prefix of environment variables overriding config keys, as in
/// `PASTEBIN_BASE_URL`, `PASTEBIN_PORT` or `PASTEBIN_TEST_MODE`.
pub const ENV_PREFIX: &str = "PASTEBIN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public base URL that paste links are built from.
    pub base_url: String,
    pub host: IpAddr,
    pub port: u16,
    /// Honour the `x-test-now-ms` header. Never enable this in production.
    pub test_mode: bool,
    pub storage: Storage,
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:3000".to_owned(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            test_mode: false,
            storage: Storage::default(),
            limits: Limits::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub kind: StorageKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted request body, in bytes.
    pub max_upload_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_upload_size: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load the config from `path`, or from the platform config directory if
    /// no path is given, then layer `PASTEBIN_*` environment variables on top.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::build(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn build(path: Option<&Path>, env: Environment) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => {
                info!("reading config from {}", path.display());
                Some(File::from(path).format(FileFormat::Toml).required(true))
            }
            None => default_path()
                .map(|path| File::from(path).format(FileFormat::Toml).required(false)),
        };

        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        builder
            // nested keys use a double underscore, e.g. PASTEBIN_LIMITS__MAX_UPLOAD_SIZE
            .add_source(env.prefix_separator("_").separator("__"))
            .build()
            .context("failed to read config")?
            .try_deserialize()
            .context("failed to deserialize config")
    }
}

fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pastebin-lite").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(vars))
    }

    fn config_file(source: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    fn from_file(source: &str, vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let file = config_file(source);
        Config::build(Some(file.path()), env(vars))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = from_file("", &[]).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.port, 3000);
        assert!(!config.test_mode);
        assert_eq!(config.storage.kind, StorageKind::Memory);
        assert_eq!(config.limits.max_upload_size, 1024 * 1024);
    }

    #[test]
    fn parses_full_file() {
        let config = from_file(
            r#"
            base_url = "https://paste.example.com"
            host = "0.0.0.0"
            port = 8080
            test_mode = true

            [storage]
            kind = "memory"

            [limits]
            max_upload_size = 4096
            "#,
            &[],
        )
        .unwrap();

        assert_eq!(config.base_url, "https://paste.example.com");
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.port, 8080);
        assert!(config.test_mode);
        assert_eq!(config.limits.max_upload_size, 4096);
    }

    #[test]
    fn rejects_unknown_storage_kind() {
        assert!(from_file("[storage]\nkind = \"redis\"\n", &[]).is_err());
    }

    #[test]
    fn env_overrides_file() {
        let config = from_file(
            "base_url = \"http://file\"\nport = 1\n",
            &[
                ("PASTEBIN_BASE_URL", "http://env"),
                ("PASTEBIN_PORT", "4000"),
                ("PASTEBIN_TEST_MODE", "1"),
                ("PASTEBIN_LIMITS__MAX_UPLOAD_SIZE", "512"),
            ],
        )
        .unwrap();

        assert_eq!(config.base_url, "http://env");
        assert_eq!(config.port, 4000);
        assert!(config.test_mode);
        assert_eq!(config.limits.max_upload_size, 512);
    }

    #[test]
    fn env_alone_is_enough() {
        let config = Config::build(None, env(&[("PASTEBIN_PORT", "8081")])).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_mode_can_be_switched_off() {
        for value in ["0", "false", "no"] {
            let config = from_file("test_mode = true\n", &[("PASTEBIN_TEST_MODE", value)]).unwrap();
            assert!(!config.test_mode, "{value:?} should not enable test mode");
        }
    }

    #[test]
    fn unrecognised_test_mode_is_an_error() {
        assert!(from_file("", &[("PASTEBIN_TEST_MODE", "on please")]).is_err());
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(from_file("", &[("PASTEBIN_PORT", "eighty")]).is_err());
    }

    #[test]
    fn other_prefixes_are_ignored() {
        let config = from_file("", &[("NONBIN_PORT", "9999")]).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = Path::new("/definitely/not/here/config.toml");
        assert!(Config::load(Some(path)).is_err());
    }
}
