use chrono::Utc;
use std::collections::HashSet;

use super::sample::sample_properties;
use super::types::{
    Contact, FloorPlan, ImageUpdate, ImportSummary, NewProperty, Property, PropertyImage,
    StandardImage, StandardImageUpdate, StoreError,
};

/// In-memory property list backing the dashboard.
///
/// Single-owner state: mutations take `&mut self` and nothing is persisted.
/// The list is ordered newest-first.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    properties: Vec<Property>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the demo listings.
    pub fn with_sample_data() -> Self {
        Self::with_properties(sample_properties())
    }

    pub fn with_properties(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    pub fn list(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == id)
    }

    /// Validates form values and inserts a new listing at the front.
    pub fn add_property(&mut self, draft: NewProperty) -> Result<&Property, StoreError> {
        draft.validate()?;

        let id = self.unique_id("prop", |store, candidate| store.get(candidate).is_some());
        let property = Property::new(
            id,
            draft.name.trim(),
            draft.address.trim(),
            draft.description.trim(),
            Contact {
                name: draft.contact_name.trim().to_string(),
                email: draft.contact_email.trim().to_string(),
                phone: draft.contact_phone.trim().to_string(),
            },
        );
        tracing::debug!(id = %property.id, "Added property");
        self.properties.insert(0, property);
        Ok(&self.properties[0])
    }

    /// Merges imported listings by id.
    ///
    /// Any id already present (or seen earlier in `incoming`) is skipped, so
    /// re-importing the same feed leaves the store unchanged. New entries are
    /// placed at the front, keeping their order from `incoming`.
    pub fn import(&mut self, incoming: Vec<Property>) -> ImportSummary {
        let mut seen: HashSet<String> = self.properties.iter().map(|p| p.id.clone()).collect();
        let total = incoming.len();

        let mut fresh: Vec<Property> = incoming
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();

        let summary = ImportSummary {
            added: fresh.len(),
            skipped: total - fresh.len(),
        };
        fresh.append(&mut self.properties);
        self.properties = fresh;

        tracing::info!(
            added = summary.added,
            skipped = summary.skipped,
            total = self.properties.len(),
            "Merged imported properties"
        );
        summary
    }

    pub fn add_floor_plan(
        &mut self,
        property_id: &str,
        name: &str,
        url: &str,
    ) -> Result<&FloorPlan, StoreError> {
        let name = name.trim();
        let url = url.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid("floor plan name", "is required"));
        }
        if url.is_empty() {
            return Err(StoreError::Invalid("floor plan file", "is required"));
        }

        let id = self.unique_id("fp", |store, candidate| {
            store
                .properties
                .iter()
                .flat_map(|p| &p.floor_plans)
                .any(|fp| fp.id == candidate)
        });
        let property = self.get_mut(property_id)?;
        let index = property.floor_plans.len();
        property.floor_plans.push(FloorPlan {
            id,
            name: name.to_string(),
            url: url.to_string(),
        });
        Ok(&property.floor_plans[index])
    }

    pub fn remove_floor_plan(
        &mut self,
        property_id: &str,
        plan_id: &str,
    ) -> Result<FloorPlan, StoreError> {
        let property = self.get_mut(property_id)?;
        let index = property
            .floor_plans
            .iter()
            .position(|fp| fp.id == plan_id)
            .ok_or_else(|| StoreError::FloorPlanNotFound {
                property_id: property_id.to_string(),
                plan_id: plan_id.to_string(),
            })?;
        Ok(property.floor_plans.remove(index))
    }

    /// Attaches a 360° image. Tags are trimmed, lowercased and de-duplicated.
    pub fn add_image(
        &mut self,
        property_id: &str,
        url: &str,
        tags: &[String],
    ) -> Result<&PropertyImage, StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::Invalid("image", "is required"));
        }

        let id = self.unique_id("img", |store, candidate| {
            store
                .properties
                .iter()
                .flat_map(|p| &p.images)
                .any(|img| img.id == candidate)
        });
        let property = self.get_mut(property_id)?;
        let index = property.images.len();
        property.images.push(PropertyImage {
            id,
            url: url.to_string(),
            tags: normalize_tags(tags),
            paths: Vec::new(),
            starting_view: None,
        });
        Ok(&property.images[index])
    }

    /// Applies tag, hotspot and starting-view edits to a 360° image.
    ///
    /// Every hotspot must be named and point at another image of the same
    /// property. On error the image is left unchanged.
    pub fn update_image(
        &mut self,
        property_id: &str,
        image_id: &str,
        update: ImageUpdate,
    ) -> Result<&PropertyImage, StoreError> {
        let property = self.get_mut(property_id)?;
        let index = image_index(property, image_id)?;

        if let Some(paths) = &update.paths {
            for path in paths {
                if path.name.trim().is_empty() {
                    return Err(StoreError::Invalid("image path", "name is required"));
                }
                let target_exists = path.target_image_id != image_id
                    && property
                        .images
                        .iter()
                        .any(|img| img.id == path.target_image_id);
                if !target_exists {
                    return Err(StoreError::Invalid(
                        "image path",
                        "target must be another image of this property",
                    ));
                }
            }
        }

        let image = &mut property.images[index];
        if let Some(tags) = update.tags {
            image.tags = normalize_tags(&tags);
        }
        if let Some(paths) = update.paths {
            image.paths = paths;
        }
        if let Some(view) = update.starting_view {
            image.starting_view = Some(view);
        }
        tracing::debug!(property_id = %property_id, image_id = %image_id, "Updated image");
        Ok(&property.images[index])
    }

    /// Deletes a 360° image along with any hotspots that led to it.
    pub fn remove_image(
        &mut self,
        property_id: &str,
        image_id: &str,
    ) -> Result<PropertyImage, StoreError> {
        let property = self.get_mut(property_id)?;
        let index = image_index(property, image_id)?;
        let removed = property.images.remove(index);
        for image in &mut property.images {
            image.paths.retain(|path| path.target_image_id != image_id);
        }
        Ok(removed)
    }

    pub fn add_standard_image(
        &mut self,
        property_id: &str,
        name: &str,
        url: &str,
    ) -> Result<&StandardImage, StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::Invalid("image", "is required"));
        }

        let id = self.unique_id("std", |store, candidate| {
            store
                .properties
                .iter()
                .flat_map(|p| &p.standard_images)
                .any(|img| img.id == candidate)
        });
        let property = self.get_mut(property_id)?;
        let index = property.standard_images.len();
        property.standard_images.push(StandardImage {
            id,
            name: name.trim().to_string(),
            url: url.to_string(),
            edited_url: None,
            instructions: None,
        });
        Ok(&property.standard_images[index])
    }

    /// Records retouching instructions or the retouched result for a photo.
    pub fn update_standard_image(
        &mut self,
        property_id: &str,
        image_id: &str,
        update: StandardImageUpdate,
    ) -> Result<&StandardImage, StoreError> {
        let property = self.get_mut(property_id)?;
        let index = standard_image_index(property, image_id)?;

        let image = &mut property.standard_images[index];
        if let Some(instructions) = update.instructions {
            image.instructions = non_blank(instructions);
        }
        if let Some(edited_url) = update.edited_url {
            image.edited_url = non_blank(edited_url);
        }
        Ok(&property.standard_images[index])
    }

    pub fn remove_standard_image(
        &mut self,
        property_id: &str,
        image_id: &str,
    ) -> Result<StandardImage, StoreError> {
        let property = self.get_mut(property_id)?;
        let index = standard_image_index(property, image_id)?;
        Ok(property.standard_images.remove(index))
    }

    /// Sets the published virtual-tour link for a property.
    pub fn set_tour_url(
        &mut self,
        property_id: &str,
        url: &str,
    ) -> Result<&Property, StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::Invalid("tour url", "is required"));
        }
        let property = self.get_mut(property_id)?;
        property.tour_url = Some(url.to_string());
        Ok(property)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Property, StoreError> {
        self.properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::PropertyNotFound(id.to_string()))
    }

    /// `<prefix>-<unix millis>`, suffixed with a counter on collision.
    fn unique_id(&self, prefix: &str, taken: impl Fn(&Self, &str) -> bool) -> String {
        let base = format!("{}-{}", prefix, Utc::now().timestamp_millis());
        if !taken(self, &base) {
            return base;
        }
        (1u32..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !taken(self, candidate))
            .unwrap_or(base)
    }
}

fn image_index(property: &Property, image_id: &str) -> Result<usize, StoreError> {
    property
        .images
        .iter()
        .position(|img| img.id == image_id)
        .ok_or_else(|| StoreError::ImageNotFound {
            property_id: property.id.clone(),
            image_id: image_id.to_string(),
        })
}

fn standard_image_index(property: &Property, image_id: &str) -> Result<usize, StoreError> {
    property
        .standard_images
        .iter()
        .position(|img| img.id == image_id)
        .ok_or_else(|| StoreError::ImageNotFound {
            property_id: property.id.clone(),
            image_id: image_id.to_string(),
        })
}

/// Trimmed, lowercased, de-duplicated, in first-seen order.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ImagePath, ViewAngle};
    use pretty_assertions::assert_eq;

    fn listing(id: &str) -> Property {
        Property::new(
            id,
            format!("{} name", id),
            format!("{} address", id),
            "desc",
            Contact {
                name: "Branch".into(),
                email: "branch@example.com".into(),
                phone: "01234 567890".into(),
            },
        )
    }

    fn form() -> NewProperty {
        NewProperty {
            name: "Harbour View".into(),
            address: "12 Harbour Road, Penzance TR18 4AA".into(),
            description: "Sea views from every room.".into(),
            contact_name: "Jo Agent".into(),
            contact_email: "jo@example.com".into(),
            contact_phone: "01736 000000".into(),
        }
    }

    #[test]
    fn test_sample_data_seeded() {
        let store = PropertyStore::with_sample_data();
        assert_eq!(store.len(), 3);
        assert!(store.get("prop-1").is_some());
    }

    #[test]
    fn test_add_property_goes_first() {
        let mut store = PropertyStore::with_sample_data();
        let id = store.add_property(form()).unwrap().id.clone();

        assert!(id.starts_with("prop-"));
        assert_eq!(store.len(), 4);
        assert_eq!(store.list()[0].id, id);
        assert_eq!(store.list()[0].contact.email, "jo@example.com");
        assert!(store.list()[0].images.is_empty());
    }

    #[test]
    fn test_add_property_ids_unique() {
        let mut store = PropertyStore::new();
        let a = store.add_property(form()).unwrap().id.clone();
        let b = store.add_property(form()).unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_add_property_invalid_leaves_store_untouched() {
        let mut store = PropertyStore::new();
        let bad = NewProperty {
            address: "short".into(),
            ..form()
        };
        assert!(store.add_property(bad).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_import_adds_new_in_order() {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        let summary = store.import(vec![listing("alto-1"), listing("alto-2")]);

        assert_eq!(summary, ImportSummary { added: 2, skipped: 0 });
        let ids: Vec<&str> = store.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alto-1", "alto-2", "prop-1"]);
    }

    #[test]
    fn test_reimport_is_noop() {
        let mut store = PropertyStore::new();
        let batch = vec![listing("alto-1"), listing("alto-2"), listing("alto-3")];
        store.import(batch.clone());
        let before = store.list().to_vec();

        let summary = store.import(batch);
        assert_eq!(summary, ImportSummary { added: 0, skipped: 3 });
        assert_eq!(store.list(), before.as_slice());
    }

    #[test]
    fn test_import_keeps_existing_entry() {
        let mut store = PropertyStore::with_properties(vec![listing("alto-1")]);
        let mut changed = listing("alto-1");
        changed.name = "Changed upstream".into();

        store.import(vec![changed]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "alto-1 name");
    }

    #[test]
    fn test_import_dedupes_within_batch() {
        let mut store = PropertyStore::new();
        let summary = store.import(vec![listing("alto-7"), listing("alto-7")]);
        assert_eq!(summary, ImportSummary { added: 1, skipped: 1 });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_floor_plan_add_and_remove() {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        let plan_id = store
            .add_floor_plan("prop-1", " Ground Floor ", "https://example.com/g.png")
            .unwrap()
            .id
            .clone();
        assert!(plan_id.starts_with("fp-"));
        assert_eq!(store.get("prop-1").unwrap().floor_plans[0].name, "Ground Floor");

        let removed = store.remove_floor_plan("prop-1", &plan_id).unwrap();
        assert_eq!(removed.id, plan_id);
        assert!(store.get("prop-1").unwrap().floor_plans.is_empty());

        assert_eq!(
            store.remove_floor_plan("prop-1", &plan_id),
            Err(StoreError::FloorPlanNotFound {
                property_id: "prop-1".into(),
                plan_id: plan_id.clone(),
            })
        );
    }

    #[test]
    fn test_floor_plan_requires_name_and_property() {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        assert!(matches!(
            store.add_floor_plan("prop-1", "  ", "https://example.com/g.png"),
            Err(StoreError::Invalid(..))
        ));
        assert_eq!(
            store
                .add_floor_plan("missing", "Ground", "https://example.com/g.png")
                .map(|fp| fp.id.clone()),
            Err(StoreError::PropertyNotFound("missing".into()))
        );
    }

    #[test]
    fn test_add_image_normalizes_tags() {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        let tags = vec![
            "Kitchen".to_string(),
            " kitchen ".to_string(),
            "".to_string(),
            "Granite Worktops".to_string(),
        ];
        let image = store
            .add_image("prop-1", "https://example.com/360.jpg", &tags)
            .unwrap();
        assert!(image.id.starts_with("img-"));
        assert_eq!(image.tags, vec!["kitchen", "granite worktops"]);
    }

    fn with_two_images() -> (PropertyStore, String, String) {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        let living = store
            .add_image("prop-1", "https://example.com/living.jpg", &[])
            .unwrap()
            .id
            .clone();
        let kitchen = store
            .add_image("prop-1", "https://example.com/kitchen.jpg", &[])
            .unwrap()
            .id
            .clone();
        (store, living, kitchen)
    }

    fn path_to(target: &str) -> ImagePath {
        ImagePath {
            id: "path-1".into(),
            name: "Go to Kitchen".into(),
            target_image_id: target.into(),
        }
    }

    #[test]
    fn test_update_image_applies_only_given_fields() {
        let (mut store, living, kitchen) = with_two_images();
        let view = ViewAngle { pitch: -5.0, yaw: 90.0 };

        let image = store
            .update_image(
                "prop-1",
                &living,
                ImageUpdate {
                    tags: Some(vec!["Living Room".into(), "living room".into()]),
                    paths: Some(vec![path_to(&kitchen)]),
                    starting_view: Some(view),
                },
            )
            .unwrap();
        assert_eq!(image.tags, vec!["living room"]);
        assert_eq!(image.paths, vec![path_to(&kitchen)]);
        assert_eq!(image.starting_view, Some(view));

        let image = store
            .update_image(
                "prop-1",
                &living,
                ImageUpdate {
                    tags: Some(Vec::new()),
                    ..ImageUpdate::default()
                },
            )
            .unwrap();
        assert!(image.tags.is_empty());
        assert_eq!(image.paths.len(), 1);
        assert_eq!(image.url, "https://example.com/living.jpg");
    }

    #[test]
    fn test_update_image_rejects_dangling_path() {
        let (mut store, living, _) = with_two_images();

        for target in ["img-missing", living.as_str()] {
            let result = store.update_image(
                "prop-1",
                &living,
                ImageUpdate {
                    paths: Some(vec![path_to(target)]),
                    ..ImageUpdate::default()
                },
            );
            assert!(matches!(result, Err(StoreError::Invalid("image path", _))));
        }
        assert!(store.get("prop-1").unwrap().images[0].paths.is_empty());
    }

    #[test]
    fn test_update_unknown_image_fails() {
        let (mut store, _, _) = with_two_images();
        assert_eq!(
            store
                .update_image("prop-1", "img-nope", ImageUpdate::default())
                .map(|img| img.id.clone()),
            Err(StoreError::ImageNotFound {
                property_id: "prop-1".into(),
                image_id: "img-nope".into(),
            })
        );
    }

    #[test]
    fn test_remove_image_drops_paths_to_it() {
        let (mut store, living, kitchen) = with_two_images();
        store
            .update_image(
                "prop-1",
                &living,
                ImageUpdate {
                    paths: Some(vec![path_to(&kitchen)]),
                    ..ImageUpdate::default()
                },
            )
            .unwrap();

        let removed = store.remove_image("prop-1", &kitchen).unwrap();
        assert_eq!(removed.id, kitchen);

        let images = &store.get("prop-1").unwrap().images;
        assert_eq!(images.len(), 1);
        assert!(images[0].paths.is_empty());
        assert!(store.remove_image("prop-1", &kitchen).is_err());
    }

    #[test]
    fn test_standard_image_lifecycle() {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        let id = store
            .add_standard_image("prop-1", " front.jpg ", "https://example.com/front.jpg")
            .unwrap()
            .id
            .clone();
        assert!(id.starts_with("std-"));

        let image = store
            .update_standard_image(
                "prop-1",
                &id,
                StandardImageUpdate {
                    instructions: Some("Remove the bins".into()),
                    ..StandardImageUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(image.name, "front.jpg");
        assert_eq!(image.instructions.as_deref(), Some("Remove the bins"));
        assert_eq!(image.edited_url, None);

        let image = store
            .update_standard_image(
                "prop-1",
                &id,
                StandardImageUpdate {
                    instructions: Some("  ".into()),
                    edited_url: Some("https://example.com/front-edited.jpg".into()),
                },
            )
            .unwrap();
        assert_eq!(image.instructions, None);
        assert_eq!(
            image.edited_url.as_deref(),
            Some("https://example.com/front-edited.jpg")
        );

        let removed = store.remove_standard_image("prop-1", &id).unwrap();
        assert_eq!(removed.id, id);
        assert!(store.get("prop-1").unwrap().standard_images.is_empty());
        assert_eq!(
            store.remove_standard_image("prop-1", &id),
            Err(StoreError::ImageNotFound {
                property_id: "prop-1".into(),
                image_id: id.clone(),
            })
        );
    }

    #[test]
    fn test_standard_image_requires_url_and_property() {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        assert!(matches!(
            store.add_standard_image("prop-1", "x.jpg", " "),
            Err(StoreError::Invalid(..))
        ));
        assert_eq!(
            store
                .add_standard_image("missing", "x.jpg", "https://example.com/x.jpg")
                .map(|img| img.id.clone()),
            Err(StoreError::PropertyNotFound("missing".into()))
        );
    }

    #[test]
    fn test_set_tour_url() {
        let mut store = PropertyStore::with_properties(vec![listing("prop-1")]);
        let property = store
            .set_tour_url("prop-1", "https://tours.example/abc")
            .unwrap();
        assert_eq!(property.tour_url.as_deref(), Some("https://tours.example/abc"));
        assert!(matches!(
            store.set_tour_url("prop-9", "https://tours.example/abc"),
            Err(StoreError::PropertyNotFound(_))
        ));
    }
}
