use std::path::PathBuf;

use clap::Parser;

use crate::{
    DEFAULT_CONSECUTIVE_MISSES, DEFAULT_MAX_NUMBER, DEFAULT_REQUEST_DELAY_MS, DEFAULT_RETRIES,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_SECS,
};

/// Scrape the properties of a street from the Spanish Catastro registry
#[derive(Parser, Debug, Clone)]
#[command(
    name = "catastro-scrap",
    version,
    author,
    about = "Scrape the properties of a street from the Spanish Catastro registry",
    after_help = "Examples:\n  \
                  catastro-scrap TOLEDO ALMOROX 'PINAR ALMOROX'\n  \
                  catastro-scrap MADRID 'SAN MARTIN DE VALDEIGLESIAS' REAL --max-number 200\n  \
                  catastro-scrap TOLEDO ALMOROX 'PINAR ALMOROX' --output my_results.csv"
)]
pub struct CliArgs {
    #[arg(value_name = "PROVINCE", help = "Province name (e.g. TOLEDO, MADRID)")]
    pub province: String,

    #[arg(value_name = "MUNICIPALITY", help = "Municipality name (e.g. ALMOROX)")]
    pub municipality: String,

    #[arg(
        value_name = "STREET",
        help = "Street name or partial match (e.g. 'PINAR ALMOROX')"
    )]
    pub street: String,

    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_NUMBER,
        help = "Maximum house number to scan"
    )]
    pub max_number: u32,

    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_CONSECUTIVE_MISSES,
        help = "Stop scanning a street after this many consecutive misses"
    )]
    pub consecutive_misses: u32,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Output CSV file (default: <municipality>_<street>_catastro.csv)"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Skip fetching plot surface from Sede Electrónica (faster)")]
    pub no_plot_surface: bool,

    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_RETRIES,
        help = "Attempts per request before giving up"
    )]
    pub retries: u32,

    #[arg(
        long,
        value_name = "MS",
        default_value_t = DEFAULT_RETRY_DELAY_MS,
        help = "Pause between failed attempts, in milliseconds"
    )]
    pub retry_delay_ms: u64,

    #[arg(
        long,
        value_name = "MS",
        default_value_t = DEFAULT_REQUEST_DELAY_MS,
        help = "Pause after every property found, in milliseconds"
    )]
    pub delay_ms: u64,

    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "Request timeout in seconds"
    )]
    pub timeout: u64,

    #[arg(long, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, help = "Log debug diagnostics")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["catastro-scrap", "toledo", "almorox", "pinar almorox"])
            .unwrap();
        assert_eq!(args.province, "toledo");
        assert_eq!(args.street, "pinar almorox");
        assert_eq!(args.max_number, 500);
        assert_eq!(args.consecutive_misses, 40);
        assert_eq!(args.retries, 3);
        assert_eq!(args.delay_ms, 300);
        assert_eq!(args.timeout, 15);
        assert!(args.output.is_none());
        assert!(!args.no_plot_surface);
    }

    #[test]
    fn test_flags() {
        let args = CliArgs::try_parse_from([
            "catastro-scrap",
            "MADRID",
            "SAN MARTIN DE VALDEIGLESIAS",
            "REAL",
            "--max-number",
            "200",
            "--consecutive-misses",
            "10",
            "-o",
            "out.csv",
            "--no-plot-surface",
        ])
        .unwrap();
        assert_eq!(args.max_number, 200);
        assert_eq!(args.consecutive_misses, 10);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert!(args.no_plot_surface);
    }

    #[test]
    fn test_missing_street_is_rejected() {
        assert!(CliArgs::try_parse_from(["catastro-scrap", "TOLEDO", "ALMOROX"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let res = CliArgs::try_parse_from(["catastro-scrap", "A", "B", "C", "-v", "-q"]);
        assert!(res.is_err());
    }
}
