//! High-level service facade over a council provider.

use std::sync::Arc;

use crate::model::{Address, CouncilMeta, LookupQuery, Schedule};
use crate::ports::{AddressPort, PortError, SchedulePort};
use crate::trace::Trace;

/// Collection of ports implementing a provider for a single council.
pub struct CouncilPlugin {
    /// Static metadata describing the council.
    pub meta: CouncilMeta,
    /// Implementation for listing addresses.
    pub address_port: Arc<dyn AddressPort>,
    /// Implementation for fetching schedules.
    pub schedule_port: Arc<dyn SchedulePort>,
}

/// Public entry point for address and schedule lookups.
pub struct BindayService {
    plugin: CouncilPlugin,
}

impl BindayService {
    /// Create a new service bound to the provided plugin.
    #[must_use]
    pub fn new(plugin: CouncilPlugin) -> Self {
        Self { plugin }
    }

    /// Metadata of the council this service talks to.
    #[must_use]
    pub fn council(&self) -> &CouncilMeta {
        &self.plugin.meta
    }

    /// List candidate addresses for a postcode.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::MissingPostcode`] for an empty query, or the
    /// provider's error when the lookup fails.
    pub async fn addresses(
        &self,
        query: &LookupQuery,
        trace: &mut Trace,
    ) -> Result<Vec<Address>, PortError> {
        if query.is_empty() {
            return Err(PortError::MissingPostcode);
        }
        self.plugin.address_port.search(query, trace).await
    }

    /// Look up the collection schedule, sorted by date and bin.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::MissingPostcode`] for an empty query, or the
    /// provider's error when the lookup fails.
    pub async fn schedule(
        &self,
        query: &LookupQuery,
        trace: &mut Trace,
    ) -> Result<Schedule, PortError> {
        if query.is_empty() {
            return Err(PortError::MissingPostcode);
        }
        let schedule = self.plugin.schedule_port.schedule(query, trace).await?;
        tracing::info!(
            council = %self.plugin.meta.id,
            address = %schedule.address,
            collections = schedule.collections.len(),
            "lookup complete"
        );
        Ok(schedule.sorted())
    }
}
