//! Street scanner for the Spanish Catastro registry.
//!
//! Probes the OVC Callejero web service house number by house number, reads the
//! plot surface of every hit from the Sede Electrónica viewer page and exports
//! the collected properties as CSV.

pub mod cli;
pub mod config;
mod error;
pub mod export;
mod macros;
pub mod parse;
pub mod process;
pub mod property;
pub mod request;

pub use config::Config;
pub use error::{Error, Result};

/// OVC Callejero web service.
pub const BASE_API: &str =
    "https://ovc.catastro.meh.es/ovcservweb/OVCSWLocalizacionRC/OVCCallejero.asmx";
/// Sede Electrónica property viewer.
pub const SEDE_URL: &str = "https://www1.sedecatastro.gob.es/CYCBienInmueble/OVCConCiud.aspx";

pub const USER_AGENT: &str = "Mozilla/5.0";
/// Street type used when the registry doesn't report one.
pub const DEFAULT_STREET_KIND: &str = "CL";

pub const DEFAULT_MAX_NUMBER: u32 = 500;
pub const DEFAULT_CONSECUTIVE_MISSES: u32 = 40;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
/// Pause after every hit so the registry isn't hammered.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
