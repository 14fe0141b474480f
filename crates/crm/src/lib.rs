pub mod cache;
pub mod odata;

pub use cache::{ReferenceCache, References};
pub use odata::{
    build_filter, CrmError, CrmSettings, OrganizationDataClient, ReferenceKind, ReferenceLookup,
};
