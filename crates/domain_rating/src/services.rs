//! Rating domain services
//!
//! [`RatingService`] is the entry point a host application calls. It pairs the
//! pure [`rate`](crate::engine::rate) function with the live table store and
//! the structured logging around a quote.

use std::sync::Arc;

use crate::engine::rate;
use crate::error::RatingError;
use crate::request::RatingRequest;
use crate::result::RatingResult;
use crate::store::RateTableStore;
use crate::tables::RateTables;

/// Service for quoting premiums against the live rate tables
#[derive(Debug, Clone)]
pub struct RatingService {
    store: Arc<RateTableStore>,
}

impl RatingService {
    /// Creates a service over a shared table store
    pub fn new(store: Arc<RateTableStore>) -> Self {
        Self { store }
    }

    /// Creates a service that owns a store holding `tables`
    pub fn from_tables(tables: RateTables) -> Self {
        Self::new(Arc::new(RateTableStore::new(tables)))
    }

    /// The store this service reads from, e.g. for publishing reloads
    pub fn store(&self) -> &Arc<RateTableStore> {
        &self.store
    }

    /// Prices a request against the current snapshot
    ///
    /// The snapshot is taken once, so a concurrent reload cannot change the
    /// tables halfway through a quote.
    ///
    /// # Errors
    ///
    /// Returns the [`RatingError`] raised by the engine. Nothing is retried:
    /// every rating error is a property of the request.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let service = RatingService::from_tables(tables);
    /// let request = RatingRequest::new("family-health", CoverageSelection::Tier("5L".into()), vec![MemberAge::Age(40)]);
    /// let result = service.quote(&request)?;
    /// assert_eq!(result.final_premium.amount(), dec!(8600));
    /// ```
    #[tracing::instrument(
        name = "rating.quote",
        skip(self, request),
        fields(product = %request.product_id, members = request.members.len(), tenure = request.tenure_years)
    )]
    pub fn quote(&self, request: &RatingRequest) -> Result<RatingResult, RatingError> {
        let tables = self.store.snapshot();

        match rate(request, &tables) {
            Ok(result) => {
                if result.is_clamped() {
                    tracing::warn!(
                        unclamped = %result.unclamped_annual(),
                        "Adjustments exceeded the premium; annual premium clamped to zero"
                    );
                }
                tracing::debug!(
                    tier = %result.coverage_tier,
                    final_premium = %result.final_premium,
                    "Quote computed"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::debug!(code = err.code(), error = %err, "Quote rejected");
                Err(err)
            }
        }
    }
}
