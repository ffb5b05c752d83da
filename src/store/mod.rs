mod properties;
mod sample;
mod types;

pub use properties::PropertyStore;
pub use types::{
    Contact, FloorPlan, ImagePath, ImageUpdate, ImportSummary, NewProperty, Property,
    PropertyImage, StandardImage, StandardImageUpdate, StoreError, ViewAngle,
};
