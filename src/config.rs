use chrono_tz::Tz;
use clap::Parser;
use serde::Deserialize;
use std::fs::read_to_string;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    IoError { path: PathBuf, source: io::Error },
    #[error("invalid config file: {source}")]
    DecodingError {
        #[from]
        source: toml::de::Error,
    },
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
    #[error("invalid listen address '{0}'")]
    InvalidListenAddress(String),
    #[error("invalid allowed origin '{0}'")]
    InvalidOrigin(String),
    #[error("tls needs both a key file and a certificate file")]
    IncompleteTls,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML file with server settings, see `Settings`.
    #[arg(long, env = "FORECAST_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// IANA name of the zone that decides what "tomorrow" is.
    #[arg(short, long, env = "FORECAST_TIMEZONE")]
    pub timezone: Option<String>,

    #[arg(long, env = "DATASET_PATH")]
    pub dataset: Option<PathBuf>,

    #[arg(long, env = "MODEL_MAX_PATH")]
    pub model_max: Option<PathBuf>,

    #[arg(long, env = "MODEL_MIN_PATH")]
    pub model_min: Option<PathBuf>,

    #[arg(short, long, env = "KEY_FILE_PATH")]
    pub key_file_path: Option<PathBuf>,

    #[arg(short, long, env = "CERT_FILE_PATH")]
    pub cert_file_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub listen_address: String,
    pub timezone: String,
    pub dataset_path: PathBuf,
    pub model_max_path: PathBuf,
    pub model_min_path: PathBuf,
    /// Origins allowed to call the api from a browser. Empty means any.
    pub allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            listen_address: "0.0.0.0:5000".to_string(),
            timezone: "Asia/Kolkata".to_string(),
            dataset_path: PathBuf::from("weather_data.csv"),
            model_max_path: PathBuf::from("weather_model_max.json"),
            model_min_path: PathBuf::from("weather_model_min.json"),
            allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TlsFiles {
    pub key_file_path: PathBuf,
    pub cert_file_path: PathBuf,
}

impl Settings {
    pub fn from_toml(contents: &str) -> Result<Settings, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(file_path: impl Into<PathBuf>) -> Result<Settings, ConfigError> {
        let path = file_path.into();
        let contents =
            read_to_string(&path).map_err(|source| ConfigError::IoError { path, source })?;
        Settings::from_toml(&contents)
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn listen_address(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_address
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddress(self.listen_address.clone()))
    }
}

impl Args {
    /// Settings from the config file (or defaults), with command line and
    /// environment values taking precedence.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        if let Some(listen_address) = &self.listen_address {
            settings.listen_address = listen_address.clone();
        }
        if let Some(timezone) = &self.timezone {
            settings.timezone = timezone.clone();
        }
        if let Some(dataset) = &self.dataset {
            settings.dataset_path = dataset.clone();
        }
        if let Some(model_max) = &self.model_max {
            settings.model_max_path = model_max.clone();
        }
        if let Some(model_min) = &self.model_min {
            settings.model_min_path = model_min.clone();
        }
        Ok(settings)
    }

    pub fn tls_files(&self) -> Result<Option<TlsFiles>, ConfigError> {
        match (&self.key_file_path, &self.cert_file_path) {
            (Some(key_file_path), Some(cert_file_path)) => Ok(Some(TlsFiles {
                key_file_path: key_file_path.clone(),
                cert_file_path: cert_file_path.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::IncompleteTls),
        }
    }
}
