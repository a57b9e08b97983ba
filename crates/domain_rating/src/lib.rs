//! Premium Rating Domain
//!
//! This crate turns a policy configuration into a premium breakdown using
//! versioned, data-driven rate tables. Prices live in configuration, not in
//! code: a new product or a repriced tier is a table edit.
//!
//! # Architecture
//!
//! - **Tables**: [`RateTables`] is validated once at load time and is read-only afterwards
//! - **Engine**: [`rate`] is a pure function of a request and a table snapshot
//! - **Store**: [`RateTableStore`] swaps whole snapshots so reloads never tear
//! - **Service**: [`RatingService`] wraps the engine with logging for host applications
//!
//! # Rounding
//!
//! Every line item is rounded to whole currency units (half away from zero)
//! on its own before it is summed, so a displayed breakdown always adds up to
//! the displayed total.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_rating::{RateTables, RatingRequest, CoverageSelection, MemberAge, rate};
//!
//! let tables = RateTables::load_from_path("config/rate-tables.json")?;
//! let request = RatingRequest::new("family-health", CoverageSelection::Tier("5L".into()), vec![MemberAge::Age(40)])
//!     .with_rider("critical-illness")
//!     .with_tenure(2);
//!
//! let result = rate(&request, &tables)?;
//! println!("{} for {} years", result.final_premium, result.tenure_years);
//! ```

pub mod engine;
pub mod error;
pub mod loader;
pub mod request;
pub mod result;
pub mod services;
pub mod store;
pub mod tables;

pub use engine::{rate, MAX_WAITING_PERIOD_DAYS};
pub use error::{RatingError, TableError};
pub use loader::RateTableDocument;
pub use request::{CoPayment, CoPaymentKind, CoverageSelection, MemberAge, RatingRequest, RoomRentSelection};
pub use result::{LineItem, LineItemKind, RatingResult, RatingWarning};
pub use services::RatingService;
pub use store::RateTableStore;
pub use tables::{
    AgeBracket, ChronicConditionRules, ChronicPricing, CoverageTier, MemberAggregation, ProductRates,
    RateTables, RoomRentRules, TenureRules, TierCosts, MAX_INSURABLE_AGE,
};
