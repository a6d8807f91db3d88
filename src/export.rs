use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use tokio::{fs::File, io::AsyncWriteExt};

use crate::property::Property;
use crate::Result;

pub const CSV_HEADER: [&str; 7] = [
    "Referencia Catastral",
    "Number",
    "Street",
    "Built Surface (m2)",
    "Plot Surface (m2)",
    "Year Built",
    "Use",
];

/// `<municipality>_<street>_catastro.csv`, lower-cased with spaces turned into underscores.
pub fn default_output_path(municipality: &str, street: &str) -> PathBuf {
    let slug = |s: &str| s.to_lowercase().replace(' ', "_");
    PathBuf::from(format!("{}_{}_catastro.csv", slug(municipality), slug(street)))
}

/// Sorts the properties by street label, then house number.
pub fn sort_properties(properties: &mut [Property]) {
    properties.sort_by(|a, b| (&a.street, a.number).cmp(&(&b.street, b.number)));
}

/// Encodes the properties as CSV, in the given order.
pub fn to_csv(properties: &[Property]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for prop in properties {
        let number = prop.number.to_string();
        let built = prop.built_surface.to_string();
        let plot = prop.plot_surface.map(|s| s.to_string()).unwrap_or_default();
        writer.write_record([
            prop.reference.as_str(),
            number.as_str(),
            prop.street.as_str(),
            built.as_str(),
            plot.as_str(),
            prop.year.as_str(),
            prop.usage.as_str(),
        ])?;
    }

    Ok(writer.into_inner()?)
}

/// Writes the properties to `path` as CSV.
pub async fn write_csv(path: &Path, properties: &[Property]) -> Result<()> {
    let bytes = to_csv(properties)?;
    let mut file = File::create(path).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    Ok(())
}

/// Totals printed at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    /// Over properties with a built surface above 0.
    pub built_range: Option<RangeInclusive<u64>>,
    pub plot_range: Option<RangeInclusive<u64>>,
    /// Distinct plots (parcel references) the properties sit on.
    pub parcels: usize,
}

impl Summary {
    pub fn new(properties: &[Property]) -> Self {
        Self {
            total: properties.len(),
            built_range: range_of(
                properties
                    .iter()
                    .map(|p| p.built_surface)
                    .filter(|s| *s > 0),
            ),
            plot_range: range_of(properties.iter().filter_map(|p| p.plot_surface)),
            parcels: properties
                .iter()
                .map(|p| p.parcel_ref.as_str())
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        write!(f, "  Total properties: {}", self.total)?;
        write!(f, "\n  Distinct parcels: {}", self.parcels)?;
        if let Some(range) = &self.built_range {
            write!(f, "\n  Built surface range: {} - {} m²", range.start(), range.end())?;
        }
        if let Some(range) = &self.plot_range {
            write!(f, "\n  Plot surface range: {} - {} m²", range.start(), range.end())?;
        }
        Ok(())
    }
}

fn range_of(values: impl Iterator<Item = u64>) -> Option<RangeInclusive<u64>> {
    values.fold(None, |acc, v| match acc {
        None => Some(v..=v),
        Some(r) => Some(*r.start().min(&v)..=*r.end().max(&v)),
    })
}
