//! Provider implementation for Belfast City Council's "find your bin collection day" page.
//!
//! The council publishes no API: the lookup is an ASP.NET WebForms page, so
//! every step is a postback carrying the page's view state back to it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use binday_core::{
    model::{Address, CouncilId, CouncilMeta, LookupQuery, Schedule},
    ports::{AddressPort, PortError, SchedulePort},
    service::CouncilPlugin,
    trace::Trace,
};

mod flow;
mod form;
mod results;
mod select;
mod session;

use crate::session::{Page, Session};

/// Lookup page of the council's bin collection finder.
pub const BASE_URL: &str = "https://online.belfastcity.gov.uk/find-bin-collection-day/Default.aspx";

const PUBLIC_URL: &str = "online.belfastcity.gov.uk/find-bin-collection-day";
const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/126.0 Safari/537.36"
);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the Belfast lookup.
#[derive(Debug, Clone)]
pub struct BelfastConfig {
    /// Lookup page every session starts from.
    pub base_url: String,
    /// `User-Agent` sent with every request; the site may vary by agent.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for BelfastConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_owned(),
            user_agent: BROWSER_USER_AGENT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BelfastConfig {
    fn open_session(&self) -> Result<Session, PortError> {
        Session::open(&self.base_url, &self.user_agent, self.timeout)
    }
}

/// Address listing for Belfast.
pub struct BelfastAddressPort {
    config: BelfastConfig,
    meta: CouncilMeta,
}

impl BelfastAddressPort {
    /// Create a new address port using the given settings.
    #[must_use]
    pub fn new(config: BelfastConfig) -> Self {
        Self {
            config,
            meta: council_meta(),
        }
    }
}

#[async_trait]
impl AddressPort for BelfastAddressPort {
    fn council(&self) -> &CouncilMeta {
        &self.meta
    }

    async fn search(
        &self,
        query: &LookupQuery,
        trace: &mut Trace,
    ) -> Result<Vec<Address>, PortError> {
        let session = self.config.open_session()?;
        let page = flow::submit_postcode(&session, &query.postcode, trace).await?;
        let (_form, list) = flow::address_step(&page, trace)?;
        Ok(list.addresses())
    }
}

/// Collection schedule lookup for Belfast.
pub struct BelfastSchedulePort {
    config: BelfastConfig,
    meta: CouncilMeta,
}

impl BelfastSchedulePort {
    /// Create a new schedule port using the given settings.
    #[must_use]
    pub fn new(config: BelfastConfig) -> Self {
        Self {
            config,
            meta: council_meta(),
        }
    }

    /// Reach the results page, falling back to a street search when the
    /// postcode search does not lead to an address.
    async fn results_page(
        &self,
        query: &LookupQuery,
        trace: &mut Trace,
    ) -> Result<Page, PortError> {
        let session = self.config.open_session()?;
        let hint = query.address.as_deref();

        let postcode_err = match postcode_lookup(&session, query, trace).await {
            Ok(page) => return Ok(page),
            Err(err) => err,
        };

        let Some(street) = street_hint(hint) else {
            return Err(postcode_err);
        };

        tracing::warn!(
            error = %postcode_err,
            street,
            "postcode lookup failed; searching by street"
        );
        trace.record(format!(
            "postcode lookup failed ({postcode_err}); trying street-based flow with: {street}"
        ));
        flow::street_flow(&session, &street, &query.postcode, hint, trace).await
    }
}

#[async_trait]
impl SchedulePort for BelfastSchedulePort {
    fn council(&self) -> &CouncilMeta {
        &self.meta
    }

    async fn schedule(
        &self,
        query: &LookupQuery,
        trace: &mut Trace,
    ) -> Result<Schedule, PortError> {
        let page = self.results_page(query, trace).await?;
        let schedule = results::parse_schedule(&page.body)?;
        trace.record(format!(
            "results: {} collections for {:?}",
            schedule.collections.len(),
            schedule.address
        ));
        Ok(schedule)
    }
}

async fn postcode_lookup(
    session: &Session,
    query: &LookupQuery,
    trace: &mut Trace,
) -> Result<Page, PortError> {
    let page = flow::submit_postcode(session, &query.postcode, trace).await?;
    flow::select_address(session, &page, query.address.as_deref(), trace).await
}

/// Street to search for when the postcode search fails.
fn street_hint(address: Option<&str>) -> Option<String> {
    let address = address.map(str::trim).filter(|hint| !hint.is_empty())?;
    select::derive_street_hint(address).or_else(|| Some(address.to_owned()))
}

/// Build the plugin bundle for the Belfast provider.
#[must_use]
pub fn plugin(config: BelfastConfig) -> CouncilPlugin {
    let address_port = Arc::new(BelfastAddressPort::new(config.clone()));
    let schedule_port = Arc::new(BelfastSchedulePort::new(config));

    CouncilPlugin {
        meta: council_meta(),
        address_port,
        schedule_port,
    }
}

fn council_meta() -> CouncilMeta {
    CouncilMeta {
        id: CouncilId(String::from("belfast")),
        name: String::from("Belfast City Council"),
        lookup_url: String::from(PUBLIC_URL),
    }
}
