use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use super::AltoError;
use crate::store::{Contact, Property};

/// Prefix for ids of properties that came from the Alto feed.
pub const ID_PREFIX: &str = "alto";

const ROOT_ELEMENT: &[u8] = b"branches";

// Upstream collapses a one-element list to a bare element. Every repeated
// element below deserializes straight into a `Vec`, so one `<property>` and
// many `<property>` siblings come out the same shape. Siblings need not be
// adjacent: the `overlapped-lists` feature gathers them across other elements.

#[derive(Debug, Default, Deserialize)]
struct BranchesXml {
    #[serde(rename = "branch", default)]
    branches: Vec<BranchXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BranchXml {
    name: Option<String>,
    email: Option<String>,
    tel: Option<String>,
    properties: Option<PropertiesXml>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertiesXml {
    #[serde(rename = "property", default)]
    items: Vec<PropertyXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PropertyXml {
    #[serde(rename = "@id")]
    id_attr: Option<String>,
    id: Option<String>,
    address: Option<AddressXml>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddressXml {
    display: Option<String>,
}

/// Flattens an Alto branch feed into dashboard properties.
///
/// Name and address both come from the property's `address/display`; the
/// contact comes from the owning branch. Ids are `alto-<upstream id>`.
///
/// Branches without a `properties` element contribute nothing. An empty body,
/// `<branches/>`, or a document rooted at anything other than `<branches>`
/// yields an empty list.
///
/// # Errors
///
/// [`AltoError::Parse`] if the markup is malformed.
pub fn parse_feed(raw: &str) -> Result<Vec<Property>, AltoError> {
    if raw.trim().is_empty() {
        tracing::debug!("Empty Alto feed body");
        return Ok(Vec::new());
    }

    if !has_branches_root(raw)? {
        tracing::info!("No branches found in the Alto XML feed");
        return Ok(Vec::new());
    }

    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations. Only the
    // five XML builtins resolve; any other reference is an UnrecognizedEntity error.
    let doc: BranchesXml =
        quick_xml::de::from_str(raw).map_err(|e| AltoError::Parse(e.to_string()))?;

    let mut properties = Vec::new();
    let mut skipped = 0usize;

    for branch in doc.branches {
        let Some(listing) = branch.properties else {
            continue;
        };
        let contact = Contact {
            name: text_or(&branch.name, "Branch Contact"),
            email: text_or(&branch.email, "not.provided@example.com"),
            phone: text_or(&branch.tel, "N/A"),
        };

        for item in listing.items {
            let Some(upstream_id) = non_blank(&item.id_attr).or_else(|| non_blank(&item.id))
            else {
                skipped += 1;
                continue;
            };

            let display = item.address.as_ref().and_then(|a| non_blank(&a.display));
            properties.push(Property::new(
                format!("{}-{}", ID_PREFIX, upstream_id),
                display.unwrap_or("Unnamed Property from Alto"),
                display.unwrap_or("Address not provided"),
                text_or(&item.description, "Description not provided"),
                contact.clone(),
            ));
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped = skipped, "Alto properties without an id skipped");
    }
    tracing::debug!(count = properties.len(), "Parsed Alto feed");

    Ok(properties)
}

/// Checks the document element without building the tree.
fn has_branches_root(raw: &str) -> Result<bool, AltoError> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(e.local_name().as_ref() == ROOT_ELEMENT)
            }
            Ok(Event::Eof) => return Ok(false),
            Err(e) => return Err(AltoError::Parse(e.to_string())),
            _ => {}
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    non_blank(value).unwrap_or(fallback).to_string()
}
