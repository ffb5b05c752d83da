use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by [`super::PropertyStore`] mutations.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Floor plan {plan_id} not found on property {property_id}")]
    FloorPlanNotFound {
        property_id: String,
        plan_id: String,
    },

    #[error("Image {image_id} not found on property {property_id}")]
    ImageNotFound {
        property_id: String,
        image_id: String,
    },

    /// A submitted value failed validation. Carries the field name and reason.
    #[error("Invalid {0}: {1}")]
    Invalid(&'static str, &'static str),
}

// ============================================================================
// Property Entity
// ============================================================================

/// Contact details shown on a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A hotspot linking one tour image to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePath {
    pub id: String,
    pub name: String,
    pub target_image_id: String,
}

/// Initial camera orientation for a 360° image, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewAngle {
    pub pitch: f64,
    pub yaw: f64,
}

/// A 360° tour image and its tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<ImagePath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_view: Option<ViewAngle>,
}

/// A flat (non-360°) photo, optionally with a retouched version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardImage {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// A listing managed by the dashboard.
///
/// `id` is the merge key: entries imported from a feed carry a source prefix
/// (e.g. `alto-1234`) so repeated imports line up with what is already stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub name: String,
    pub address: String,
    pub description: String,
    pub contact: Contact,
    #[serde(default)]
    pub images: Vec<PropertyImage>,
    #[serde(default)]
    pub standard_images: Vec<StandardImage>,
    #[serde(default)]
    pub floor_plans: Vec<FloorPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_image_url: Option<String>,
}

impl Property {
    /// A listing with no media attached.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        description: impl Into<String>,
        contact: Contact,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            description: description.into(),
            contact,
            images: Vec::new(),
            standard_images: Vec::new(),
            floor_plans: Vec::new(),
            tour_url: None,
            branding_logo_url: None,
            hero_image_url: None,
        }
    }
}

// ============================================================================
// Form Input
// ============================================================================

/// Values submitted from the new-property form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub name: String,
    pub address: String,
    pub description: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
}

impl NewProperty {
    /// Checks every field, reporting the first failure.
    pub fn validate(&self) -> Result<(), StoreError> {
        min_len(&self.name, 3, "name", "must be at least 3 characters")?;
        min_len(&self.address, 10, "address", "please enter a full address")?;
        min_len(
            &self.description,
            10,
            "description",
            "must be at least 10 characters",
        )?;
        min_len(&self.contact_name, 2, "contact name", "is required")?;
        if !looks_like_email(self.contact_email.trim()) {
            return Err(StoreError::Invalid(
                "contact email",
                "please enter a valid email",
            ));
        }
        min_len(
            &self.contact_phone,
            10,
            "contact phone",
            "please enter a valid phone number",
        )?;
        Ok(())
    }
}

fn min_len(
    value: &str,
    min: usize,
    field: &'static str,
    reason: &'static str,
) -> Result<(), StoreError> {
    if value.trim().chars().count() < min {
        return Err(StoreError::Invalid(field, reason));
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Edits to a 360° image. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageUpdate {
    pub tags: Option<Vec<String>>,
    pub paths: Option<Vec<ImagePath>>,
    pub starting_view: Option<ViewAngle>,
}

/// Edits to a standard photo. `None` leaves the field as it is; a blank
/// string clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardImageUpdate {
    pub instructions: Option<String>,
    pub edited_url: Option<String>,
}

/// Outcome of merging imported properties into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    /// Properties that were new and got added.
    pub added: usize,
    /// Properties whose id was already present (or repeated in the batch).
    pub skipped: usize,
}
