use reqwest::Client;
use tokio::task::spawn_blocking;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::property::{MunicipalityCodes, Property, Street};
use crate::{parse, Config, Error, Result, DEFAULT_STREET_KIND, USER_AGENT};

/// Talks to the OVC Callejero service and the Sede Electrónica viewer.
/// Every request is sequential; failed attempts are retried after a fixed pause.
#[derive(Debug, Clone)]
pub struct CatastroClient {
    // Client uses Arc so we can clone cheaply
    client: Client,
    api_url: String,
    sede_url: String,
    retries: u32,
    retry_delay: Duration,
}

impl CatastroClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            sede_url: config.sede_url.clone(),
            retries: config.retries.max(1),
            retry_delay: config.retry_delay,
        })
    }

    /// Looks up the delegation and municipality codes the viewer page needs.
    pub async fn municipality_codes(
        &self,
        province: &str,
        municipality: &str,
    ) -> Option<MunicipalityCodes> {
        let url = format!("{}/ConsultaMunicipio", self.api_url);
        let xml = self
            .fetch_or_warn(&url, &[("Provincia", province), ("Municipio", municipality)])
            .await?;
        parse::municipality_codes(&xml)
    }

    /// Finds the street sections matching `query`. Never empty.
    pub async fn streets(&self, province: &str, municipality: &str, query: &str) -> Vec<Street> {
        let url = format!("{}/ConsultaVia", self.api_url);
        let params = [
            ("Provincia", province),
            ("Municipio", municipality),
            ("TipoVia", ""),
            ("NombreVia", query),
        ];
        match self.fetch_or_warn(&url, &params).await {
            Some(xml) => parse::streets(&xml, query),
            None => vec![Street::new(DEFAULT_STREET_KIND, query)],
        }
    }

    /// Probes a single house number. `None` is a miss.
    pub async fn property(
        &self,
        province: &str,
        municipality: &str,
        street: &Street,
        number: u32,
    ) -> Option<Property> {
        let url = format!("{}/Consulta_DNPLOC", self.api_url);
        let number_str = number.to_string();
        let params = [
            ("Provincia", province),
            ("Municipio", municipality),
            ("Sigla", street.kind.as_str()),
            ("Calle", street.name.as_str()),
            ("Numero", number_str.as_str()),
            ("Bloque", ""),
            ("Escalera", ""),
            ("Planta", ""),
            ("Puerta", ""),
        ];
        let xml = self.fetch_or_warn(&url, &params).await?;
        parse::property(&xml, number, street)
    }

    /// Reads the plot surface of `reference` from the viewer page.
    pub async fn plot_surface(&self, reference: &str, codes: &MunicipalityCodes) -> Option<u64> {
        let params = [
            ("UrbRus", "U"),
            ("RefC", reference),
            ("from", "OVCBusqueda"),
            ("pest", "rc"),
            ("RCCompleta", reference),
            ("final", ""),
            ("del", codes.delegation.as_str()),
            ("mun", codes.municipality.as_str()),
        ];
        let html = self.fetch_or_warn(&self.sede_url, &params).await?;

        // Parse on the blocking pool.
        match spawn_blocking(move || parse::plot_surface(&html)).await {
            Ok(surface) => surface,
            Err(err) => {
                warn!("Couldn't parse the viewer page for {reference}: {err}");
                None
            }
        }
    }

    async fn fetch_or_warn(&self, url: &str, query: &[(&str, &str)]) -> Option<String> {
        match self.fetch_text(url, query).await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!("Failed to fetch: {err}");
                None
            }
        }
    }

    /// Requests a page and returns its body, decoded lossily as UTF-8.
    pub async fn fetch_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut attempt = 1;
        loop {
            match self.request_once(url, query).await {
                Ok(body) => return Ok(body),
                Err(source) if attempt >= self.retries => {
                    return Err(Error::Fetch {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    debug!("Attempt {attempt}/{} for {url} failed: {err}", self.retries);
                    attempt += 1;
                    sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn request_once(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> core::result::Result<String, reqwest::Error> {
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        let bytes = res.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
