//! Demo listings used to seed a fresh dashboard.

use super::types::{Contact, FloorPlan, ImagePath, Property, PropertyImage, ViewAngle};

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| t.to_string()).collect()
}

fn floor_plan(id: &str, name: &str, url: &str) -> FloorPlan {
    FloorPlan {
        id: id.into(),
        name: name.into(),
        url: url.into(),
    }
}

pub(crate) fn sample_properties() -> Vec<Property> {
    let mut city_flat = Property::new(
        "prop-1",
        "Modern Central London Flat",
        "123 The Shard, London Bridge St, London SE1 9SG",
        "A beautiful and spacious flat in the heart of the city. Features stunning views, \
         modern amenities, and an open floor plan. Perfect for urban living.",
        Contact {
            name: "James Agent".into(),
            email: "james.agent@example.com".into(),
            phone: "020 7123 4567".into(),
        },
    );
    city_flat.tour_url = Some(
        "https://kuula.co/share/collection/7q1vF?logo=1&info=1&fs=1&vr=0&sd=1&thumbs=1".into(),
    );
    city_flat.branding_logo_url = Some("https://placehold.co/150x50.png".into());
    city_flat.images = vec![
        PropertyImage {
            id: "img-1-1".into(),
            url: "https://placehold.co/600x400.png".into(),
            tags: tags(&["living room", "modern", "city view"]),
            paths: vec![ImagePath {
                id: "path-1".into(),
                name: "Go to Kitchen".into(),
                target_image_id: "img-1-2".into(),
            }],
            starting_view: Some(ViewAngle {
                pitch: 10.0,
                yaw: -90.0,
            }),
        },
        PropertyImage {
            id: "img-1-2".into(),
            url: "https://placehold.co/600x400.png".into(),
            tags: tags(&["kitchen", "granite worktops", "stainless steel"]),
            paths: vec![ImagePath {
                id: "path-2".into(),
                name: "Go to Living Room".into(),
                target_image_id: "img-1-1".into(),
            }],
            starting_view: Some(ViewAngle {
                pitch: 0.0,
                yaw: 0.0,
            }),
        },
    ];
    city_flat.floor_plans = vec![
        floor_plan("fp-1-1", "Ground Floor", "https://placehold.co/800x600.png"),
        floor_plan("fp-1-2", "First Floor", "https://placehold.co/800x600.pdf"),
    ];

    let mut family_home = Property::new(
        "prop-2",
        "Suburban Family Home",
        "456 Oak Drive, Richmond, London TW9 1AB",
        "Charming 4-bedroom home in a quiet, family-friendly neighbourhood. Large garden, \
         newly renovated kitchen, and a two-car garage.",
        Contact {
            name: "Emily Smith".into(),
            email: "emily.smith@example.com".into(),
            phone: "07700 900123".into(),
        },
    );
    family_home.images = vec![PropertyImage {
        id: "img-2-1".into(),
        url: "https://placehold.co/600x400.png".into(),
        tags: tags(&["exterior", "suburban", "brick"]),
        paths: Vec::new(),
        starting_view: None,
    }];

    let mut cottage = Property::new(
        "prop-3",
        "Cosy Seaside Cottage",
        "789 Coastguard Cottages, Brighton, BN2 1ET",
        "A quaint cottage just steps from the beach. Enjoy sea breezes from the porch and fall \
         asleep to the sound of waves. Ideal for a holiday home or rental property.",
        Contact {
            name: "David Jones".into(),
            email: "david.jones@example.com".into(),
            phone: "07700 900456".into(),
        },
    );
    cottage.floor_plans = vec![floor_plan(
        "fp-3-1",
        "Main Floor",
        "https://placehold.co/800x600.png",
    )];

    vec![city_flat, family_home, cottage]
}
