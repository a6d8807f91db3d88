//! Runtime configuration.
//!
//! Built from the command line, with a few environment overrides:
//! - `CATASTRO_API_URL`: base URL of the OVC Callejero service
//! - `CATASTRO_SEDE_URL`: URL of the Sede Electrónica viewer page
//! - `CATASTRO_LOG_LEVEL`: log level when neither `--log-level`, `-v` nor `-q` is given

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::Level;

use crate::cli::CliArgs;
use crate::export::default_output_path;
use crate::{
    Error, Result, BASE_API, DEFAULT_CONSECUTIVE_MISSES, DEFAULT_MAX_NUMBER,
    DEFAULT_REQUEST_DELAY_MS, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS,
    SEDE_URL,
};

pub const API_URL_ENV: &str = "CATASTRO_API_URL";
pub const SEDE_URL_ENV: &str = "CATASTRO_SEDE_URL";
pub const LOG_LEVEL_ENV: &str = "CATASTRO_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct Config {
    pub province: String,
    pub municipality: String,
    pub street: String,
    pub max_number: u32,
    pub consecutive_misses: u32,
    pub output: PathBuf,
    pub plot_surface: bool,
    pub api_url: String,
    pub sede_url: String,
    pub retries: u32,
    pub retry_delay: Duration,
    pub request_delay: Duration,
    pub timeout: Duration,
}

impl Config {
    /// Config with default settings for the given location. Names are upper-cased.
    pub fn new(province: &str, municipality: &str, street: &str) -> Result<Self> {
        let province = normalize_name("province", province)?;
        let municipality = normalize_name("municipality", municipality)?;
        let street = normalize_name("street", street)?;
        let output = default_output_path(&municipality, &street);

        Ok(Self {
            province,
            municipality,
            street,
            max_number: DEFAULT_MAX_NUMBER,
            consecutive_misses: DEFAULT_CONSECUTIVE_MISSES,
            output,
            plot_surface: true,
            api_url: BASE_API.to_string(),
            sede_url: SEDE_URL.to_string(),
            retries: DEFAULT_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn from_args(args: &CliArgs) -> Result<Self> {
        Self::from_args_with_env(args, |key| env::var(key).ok())
    }

    /// Like [`Config::from_args`], reading environment variables through `env`.
    pub fn from_args_with_env<F>(args: &CliArgs, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(&args.province, &args.municipality, &args.street)?;

        config.max_number = args.max_number;
        config.consecutive_misses = args.consecutive_misses;
        if let Some(output) = &args.output {
            config.output = output.clone();
        }
        config.plot_surface = !args.no_plot_surface;
        config.retries = args.retries;
        config.retry_delay = Duration::from_millis(args.retry_delay_ms);
        config.request_delay = Duration::from_millis(args.delay_ms);
        config.timeout = Duration::from_secs(args.timeout);

        if let Some(url) = env_override(env(API_URL_ENV)) {
            config.api_url = url;
        }
        if let Some(url) = env_override(env(SEDE_URL_ENV)) {
            config.sede_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retries == 0 {
            return Err(Error::Config("retries must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than 0".into()));
        }
        for (what, url) in [("API", &self.api_url), ("Sede", &self.sede_url)] {
            if reqwest::Url::parse(url).is_err() {
                return Err(Error::Config(format!("invalid {what} URL: {url}")));
            }
        }
        Ok(())
    }
}

fn normalize_name(what: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Config(format!("{what} must not be empty")));
    }
    Ok(value.to_uppercase())
}

/// Picks the log level from `--log-level`, `-v`, `-q`, then `CATASTRO_LOG_LEVEL`,
/// defaulting to info. An unknown level name comes back as `Err`.
pub fn log_level<F>(args: &CliArgs, env: F) -> core::result::Result<Level, String>
where
    F: Fn(&str) -> Option<String>,
{
    let name = match &args.log_level {
        Some(name) => name.clone(),
        None if args.verbose => return Ok(Level::DEBUG),
        None if args.quiet => return Ok(Level::ERROR),
        None => match env(LOG_LEVEL_ENV) {
            Some(name) => name,
            None => return Ok(Level::INFO),
        },
    };
    Level::from_str(name.trim()).map_err(|_| name)
}

fn env_override(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_new_uppercases_and_defaults() {
        let config = Config::new(" toledo", "almorox", "pinar almorox ").unwrap();
        assert_eq!(config.province, "TOLEDO");
        assert_eq!(config.municipality, "ALMOROX");
        assert_eq!(config.street, "PINAR ALMOROX");
        assert_eq!(config.output, PathBuf::from("almorox_pinar_almorox_catastro.csv"));
        assert_eq!(config.max_number, 500);
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert!(config.plot_surface);
        assert_eq!(config.api_url, BASE_API);
    }

    #[test]
    fn test_empty_names_are_rejected() {
        assert!(matches!(Config::new("TOLEDO", "  ", "REAL"), Err(Error::Config(_))));
        assert!(matches!(Config::new("", "ALMOROX", "REAL"), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_args_applies_flags() {
        let args = CliArgs::parse_from([
            "catastro-scrap",
            "madrid",
            "san martin de valdeiglesias",
            "real",
            "--no-plot-surface",
            "--output",
            "out.csv",
            "--delay-ms",
            "0",
        ]);
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.municipality, "SAN MARTIN DE VALDEIGLESIAS");
        assert_eq!(config.output, PathBuf::from("out.csv"));
        assert!(!config.plot_surface);
        assert!(config.request_delay.is_zero());
    }

    #[test]
    fn test_zero_retries_is_invalid() {
        let args = CliArgs::parse_from(["catastro-scrap", "A", "B", "C", "--retries", "0"]);
        assert!(matches!(Config::from_args(&args), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_url_is_invalid() {
        let mut config = Config::new("A", "B", "C").unwrap();
        config.api_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    fn fake_env(vars: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars.to_vec();
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_env_overrides_urls() {
        let args = CliArgs::parse_from(["catastro-scrap", "A", "B", "C"]);
        let env = fake_env(&[
            (API_URL_ENV, " http://127.0.0.1:8080/ovc/ "),
            (SEDE_URL_ENV, "http://127.0.0.1:8080/sede/"),
        ]);
        let config = Config::from_args_with_env(&args, env).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8080/ovc");
        assert_eq!(config.sede_url, "http://127.0.0.1:8080/sede");
    }

    #[test]
    fn test_blank_env_keeps_defaults() {
        let args = CliArgs::parse_from(["catastro-scrap", "A", "B", "C"]);
        let config = Config::from_args_with_env(&args, fake_env(&[(API_URL_ENV, "  ")])).unwrap();
        assert_eq!(config.api_url, BASE_API);
        assert_eq!(config.sede_url, SEDE_URL);
    }

    #[test]
    fn test_invalid_env_url_is_rejected() {
        let args = CliArgs::parse_from(["catastro-scrap", "A", "B", "C"]);
        let res = Config::from_args_with_env(&args, fake_env(&[(SEDE_URL_ENV, "nowhere")]));
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn test_log_level_sources() {
        let plain = CliArgs::parse_from(["catastro-scrap", "A", "B", "C"]);
        assert_eq!(log_level(&plain, fake_env(&[])), Ok(Level::INFO));
        assert_eq!(
            log_level(&plain, fake_env(&[(LOG_LEVEL_ENV, "warn")])),
            Ok(Level::WARN)
        );

        let verbose = CliArgs::parse_from(["catastro-scrap", "A", "B", "C", "-v"]);
        assert_eq!(
            log_level(&verbose, fake_env(&[(LOG_LEVEL_ENV, "warn")])),
            Ok(Level::DEBUG)
        );

        let quiet = CliArgs::parse_from(["catastro-scrap", "A", "B", "C", "-q"]);
        assert_eq!(log_level(&quiet, fake_env(&[])), Ok(Level::ERROR));

        let flag = CliArgs::parse_from(["catastro-scrap", "A", "B", "C", "--log-level", "trace"]);
        assert_eq!(
            log_level(&flag, fake_env(&[(LOG_LEVEL_ENV, "warn")])),
            Ok(Level::TRACE)
        );
    }

    #[test]
    fn test_unknown_log_level() {
        let args = CliArgs::parse_from(["catastro-scrap", "A", "B", "C"]);
        assert_eq!(
            log_level(&args, fake_env(&[(LOG_LEVEL_ENV, "loud")])),
            Err("loud".to_string())
        );
    }
}
