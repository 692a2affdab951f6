//! Services: generic resource lifecycle, reports and referential validation.

mod reports;
mod resource;
mod validation;
pub use reports::{Rank, ReportService};
pub use resource::{not_found, ResourceService};
pub use validation::{ReferentialValidator, MAX_MARK, MIN_MARK};
