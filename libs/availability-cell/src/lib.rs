pub mod models;
pub mod services;

pub use models::{
    AvailabilitySlot, CatalogError, DateKey, DayPeriod, Practitioner, PractitionerFilters,
    PractitionerOrdering, ResolverError, SlotStatus, Specialty,
};
pub use services::catalog::{HttpPractitionerCatalog, PractitionerCatalog};
pub use services::resolver::{AvailabilityOverview, GroupedSlots, SlotAvailabilityResolver, WeekPage};
