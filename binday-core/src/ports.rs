//! Traits describing provider capabilities and the shared error type.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use url::ParseError as UrlParseError;

use crate::model::{Address, CouncilMeta, LookupQuery, Schedule};
use crate::trace::Trace;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while driving a council lookup.
pub enum PortError {
    /// Network layer failed or the council answered with an error status.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// A form action or lookup URL could not be resolved.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlParseError),
    /// The lookup carried no postcode.
    #[error("Missing required field: postcode")]
    MissingPostcode,
    /// The page had no form to post back.
    #[error("No <form> found on page")]
    FormNotFound,
    /// No postcode input could be located on the lookup page.
    #[error("Postcode input not found in form. The page may have changed.")]
    PostcodeFieldMissing,
    /// No address list followed the postcode or street search.
    #[error("Could not locate an address dropdown after postcode. Inspect the page to adjust selectors.")]
    AddressListMissing,
    /// The address list had nothing to select.
    #[error("No suitable address option found.")]
    NoAddressOption,
    /// The street search returned no street list.
    #[error("Street search did not return any street list to select from.")]
    StreetListMissing,
    /// The street list had nothing to select.
    #[error("Could not select a street option.")]
    NoStreetOption,
    /// The final page had no results panel.
    #[error("BinDetailsPnl not found in response")]
    ResultsPanelMissing {
        /// Leading text of the page that was reached instead.
        preview: String,
    },
    /// Internal provider error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
/// Trait for provider-specific address list backends.
pub trait AddressPort: Send + Sync {
    /// Metadata describing the council handled by this port.
    fn council(&self) -> &CouncilMeta;

    /// List the candidate addresses the council offers for a postcode.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the council request fails or the page
    /// does not contain an address list.
    async fn search(
        &self,
        query: &LookupQuery,
        trace: &mut Trace,
    ) -> Result<Vec<Address>, PortError>;
}

#[async_trait]
/// Trait for provider-specific collection schedule backends.
pub trait SchedulePort: Send + Sync {
    /// Metadata describing the council handled by this port.
    fn council(&self) -> &CouncilMeta;

    /// Run the full lookup and parse the collection schedule.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when any step of the lookup fails.
    async fn schedule(&self, query: &LookupQuery, trace: &mut Trace) -> Result<Schedule, PortError>;
}
