use std::sync::OnceLock;

use regex::Regex;
use roxmltree::Document;
use scraper::Html;

use crate::property::{MunicipalityCodes, Property, Street};
use crate::DEFAULT_STREET_KIND;

/// Extracts the delegation and municipality codes from a `ConsultaMunicipio` answer.
///
/// The codes live in `<locat><cd/><cmc/></locat>`, with `<loine><cp/><cm/></loine>`
/// as fallback. Returns `None` unless both are found.
pub fn municipality_codes(xml: &str) -> Option<MunicipalityCodes> {
    let doc = Document::parse(xml).ok()?;

    let delegation = digits_of(&doc, "cd").or_else(|| digits_of(&doc, "cp"))?;
    let municipality = digits_of(&doc, "cmc").or_else(|| digits_of(&doc, "cm"))?;

    Some(MunicipalityCodes {
        delegation: delegation.to_string(),
        municipality: municipality.to_string(),
    })
}

/// Lists the streets of a `ConsultaVia` answer.
/// Falls back to a single `CL <query>` street so the scan always has something to probe.
pub fn streets(xml: &str, query: &str) -> Vec<Street> {
    let Ok(doc) = Document::parse(xml) else {
        return vec![Street::new(DEFAULT_STREET_KIND, query)];
    };

    let mut streets = Vec::new();
    for name_node in doc.descendants().filter(|n| n.has_tag_name("nv")) {
        let Some(name) = non_empty(name_node.text()) else {
            continue;
        };
        let kind = name_node
            .parent()
            .and_then(|p| p.children().find(|c| c.has_tag_name("tv")))
            .and_then(|tv| non_empty(tv.text()))
            .unwrap_or(DEFAULT_STREET_KIND);
        streets.push(Street::new(kind, name));
    }

    if streets.is_empty() {
        streets.push(Street::new(DEFAULT_STREET_KIND, query));
    }
    streets
}

/// Reads a `Consulta_DNPLOC` answer for a single house number.
///
/// Returns `None` for malformed XML, a registry error (`<cuerr>` other than 0)
/// or an answer without parcel reference. Only the first property is taken.
pub fn property(xml: &str, number: u32, street: &Street) -> Option<Property> {
    let doc = Document::parse(xml).ok()?;

    // An empty <cuerr/> is an error too.
    let has_error = doc
        .descendants()
        .filter(|n| n.has_tag_name("cuerr"))
        .any(|n| !n.text().unwrap_or_default().starts_with('0'));
    if has_error {
        return None;
    }

    let pc1 = text_of(&doc, "pc1")?;
    let pc2 = text_of(&doc, "pc2")?;
    let parcel_ref = format!("{pc1}{pc2}");

    let mut reference = parcel_ref.clone();
    for tag in ["car", "cc1", "cc2"] {
        if let Some(part) = text_of(&doc, tag) {
            reference.push_str(part);
        }
    }

    let built_surface = digits_of(&doc, "sfc")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let year = digits_of(&doc, "ant").unwrap_or_default().to_string();
    let usage = text_of(&doc, "luso").unwrap_or_default().to_string();

    Some(Property {
        number,
        street: street.to_string(),
        reference,
        parcel_ref,
        built_surface,
        year,
        usage,
        plot_surface: None,
    })
}

/// Finds the "Superficie gráfica" value on the viewer page.
///
/// The value is the first text after the label that looks like `1.052 m`;
/// dots are thousands separators. Zero is treated as missing.
pub fn plot_surface(html: &str) -> Option<u64> {
    let doc = Html::parse_document(html);
    let mut texts = doc
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    texts.find(|t| label_regex().is_match(t))?;

    let value = texts.find_map(|t| {
        value_regex()
            .captures(t)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().replace('.', ""))
    })?;

    value.parse::<u64>().ok().filter(|v| *v > 0)
}

fn label_regex() -> &'static Regex {
    static LABEL_REGEX: OnceLock<Regex> = OnceLock::new();
    LABEL_REGEX.get_or_init(|| Regex::new(r"(?i)superficie\s+gr.fica").expect("Invalid label regex"))
}

fn value_regex() -> &'static Regex {
    static VALUE_REGEX: OnceLock<Regex> = OnceLock::new();
    VALUE_REGEX.get_or_init(|| Regex::new(r"^([\d.]+)\s*m").expect("Invalid value regex"))
}

/// Trimmed text of the first `tag` element that has any.
fn text_of<'a>(doc: &'a Document, tag: &str) -> Option<&'a str> {
    doc.descendants()
        .filter(|n| n.has_tag_name(tag))
        .find_map(|n| non_empty(n.text()))
}

/// Like [`text_of`], but only accepts all-digit text.
fn digits_of<'a>(doc: &'a Document, tag: &str) -> Option<&'a str> {
    doc.descendants()
        .filter(|n| n.has_tag_name(tag))
        .filter_map(|n| non_empty(n.text()))
        .find(|t| t.bytes().all(|b| b.is_ascii_digit()))
}

#[inline]
fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
