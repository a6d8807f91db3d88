use std::path::PathBuf;

use chrono::Local;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::export::{sort_properties, write_csv, Summary};
use crate::property::{MunicipalityCodes, Property, Street};
use crate::request::CatastroClient;
use crate::{info_time, Config, Result};

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Sorted by street label, then number.
    pub properties: Vec<Property>,
    pub streets: Vec<Street>,
    pub output: PathBuf,
    pub summary: Summary,
}

/// Counts consecutive misses and tells when the end of a street is reached.
#[derive(Debug, Clone, Copy)]
pub struct MissCounter {
    limit: u32,
    run: u32,
}

impl MissCounter {
    pub fn new(limit: u32) -> Self {
        Self { limit, run: 0 }
    }

    /// Returns `true` once the run of misses exceeds the limit.
    pub fn record_miss(&mut self) -> bool {
        self.run += 1;
        self.run > self.limit
    }

    pub fn record_hit(&mut self) {
        self.run = 0;
    }

    pub fn run(&self) -> u32 {
        self.run
    }
}

/// Looks up the municipality, scans every matching street and writes the CSV.
pub async fn process_street(config: &Config) -> Result<ScanReport> {
    let start_time = Local::now();
    let client = CatastroClient::new(config)?;
    let scanner = StreetScanner {
        client: &client,
        config,
        codes: lookup_codes(&client, config).await,
    };

    info_time!(
        "Discovering streets matching '{}' in {}...",
        config.street,
        config.municipality
    );
    let streets = client
        .streets(&config.province, &config.municipality, &config.street)
        .await;
    info_time!("Found {} street section(s):", streets.len());
    for street in &streets {
        println!("  - {street}");
    }

    let mut properties = Vec::new();
    for street in &streets {
        properties.extend(scanner.scan_street(street).await);
    }
    info_time!(start_time, "Finished scanning {} street(s).", streets.len());

    sort_properties(&mut properties);
    info_time!(
        "Writing {} properties to {}...",
        properties.len(),
        config.output.display()
    );
    write_csv(&config.output, &properties).await?;
    info_time!(
        "Done! {} properties exported to {}",
        properties.len(),
        config.output.display()
    );

    let summary = Summary::new(&properties);
    if !properties.is_empty() {
        println!("\n{summary}");
    }

    Ok(ScanReport {
        properties,
        streets,
        output: config.output.clone(),
        summary,
    })
}

async fn lookup_codes(client: &CatastroClient, config: &Config) -> Option<MunicipalityCodes> {
    if !config.plot_surface {
        return None;
    }

    info_time!(
        "Looking up Catastro codes for {}, {}...",
        config.municipality,
        config.province
    );
    let codes = client
        .municipality_codes(&config.province, &config.municipality)
        .await;
    match &codes {
        Some(c) => info_time!(
            "Province code: {}, Municipality code: {}",
            c.delegation,
            c.municipality
        ),
        None => warn!("Could not determine municipality codes; plot surface will be skipped."),
    }
    codes
}

struct StreetScanner<'a> {
    client: &'a CatastroClient,
    config: &'a Config,
    /// `None` when plot surfaces are disabled or the lookup failed.
    codes: Option<MunicipalityCodes>,
}

impl StreetScanner<'_> {
    /// Probes numbers `1..=max_number` until the run of misses gets too long.
    async fn scan_street(&self, street: &Street) -> Vec<Property> {
        let config = self.config;
        info_time!(
            "=== Scanning: {} (numbers 1-{}) ===",
            street,
            config.max_number
        );

        let mut misses = MissCounter::new(config.consecutive_misses);
        let mut found = Vec::new();

        for number in 1..=config.max_number {
            let Some(mut prop) = self
                .client
                .property(&config.province, &config.municipality, street, number)
                .await
            else {
                if misses.record_miss() {
                    info_time!(
                        "Reached end of street at number ~{}",
                        number.saturating_sub(config.consecutive_misses)
                    );
                    break;
                }
                debug!("#{number}: miss ({} in a row)", misses.run());
                continue;
            };
            misses.record_hit();

            if let Some(codes) = &self.codes {
                prop.plot_surface = self.client.plot_surface(&prop.reference, codes).await;
            }
            info_time!(
                "#{}: ref={} built={}m²{}",
                number,
                prop.reference,
                prop.built_surface,
                plot_label(config.plot_surface, prop.plot_surface)
            );

            found.push(prop);
            sleep(config.request_delay).await;
        }

        info_time!("Found {} properties in {}", found.len(), street);
        found
    }
}

/// Plot part of a progress line. Empty only when plot surfaces are disabled.
fn plot_label(enabled: bool, surface: Option<u64>) -> String {
    match (enabled, surface) {
        (false, _) => String::new(),
        (true, Some(surface)) => format!(" plot={surface}m²"),
        (true, None) => " plot=N/A".to_string(),
    }
}
