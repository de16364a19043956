//! The postback sequences the lookup page expects.
//!
//! Parsed documents are confined to the synchronous helpers below so that no
//! `Html` value lives across an `.await`.

use scraper::Html;

use binday_core::ports::PortError;
use binday_core::trace::Trace;

use crate::form::{EVENT_ARGUMENT, EVENT_TARGET, Form};
use crate::select::{
    SelectList, all_selects, choose_address, choose_street, find_address_list,
    find_street_addresses, find_street_list,
};
use crate::session::{Page, Session};

const SEARCH_BY_RADIO: &str = "ctl00$MainContent$searchBy_radio";
const POSTCODE_TEXTBOX: &str = "ctl00$MainContent$Postcode_textbox";
const ADDRESS_LOOKUP_BUTTON: &str = "ctl00$MainContent$AddressLookup_button";
const SELECT_ADDRESS_BUTTON: &str = "ctl00$MainContent$SelectAddress_button";
const ADDRESS_LIST_NAME: &str = "ctl00$MainContent$lstAddresses";
const STREET_TEXTBOX: &str = "ctl00$MainContent$Street_textbox";
const STREET_SEARCH_BUTTON: &str = "ctl00$MainContent$streetSearch_button";
const STREET_LIST_NAME: &str = "ctl00$MainContent$streets_listbox";
const SELECT_STREET_BUTTON: &str = "ctl00$MainContent$btn_selectStreet";

/// GET the lookup page and post the postcode search.
pub(crate) async fn submit_postcode(
    session: &Session,
    postcode: &str,
    trace: &mut Trace,
) -> Result<Page, PortError> {
    let landing = session.get(session.base_url()).await?;
    let mut form = Form::from_page(&landing)?;
    trace.record(format!(
        "postcode: landing page {} carries {} state fields",
        landing.url,
        form.state_fields().count()
    ));

    let Some(field) = postcode_field(&form) else {
        trace.fields("Initial page", form.field_pairs());
        return Err(PortError::PostcodeFieldMissing);
    };
    if field != POSTCODE_TEXTBOX {
        tracing::warn!(field, "postcode textbox renamed; using heuristic match");
        trace.record(format!("postcode: {POSTCODE_TEXTBOX} missing, using {field}"));
    }

    form.set(SEARCH_BY_RADIO, "P");
    form.set(&field, postcode);
    form.set(ADDRESS_LOOKUP_BUTTON, "Find address");

    let page = session.submit(&landing, &form).await?;
    trace.record(format!("postcode: submitted {postcode:?}"));
    Ok(page)
}

/// The address list on the page returned by the postcode search.
pub(crate) fn address_step(
    page: &Page,
    trace: &mut Trace,
) -> Result<(Form, SelectList), PortError> {
    let html = Html::parse_document(&page.body);
    let form = Form::from_document(&html, &page.url)?;

    let Some(list) = find_address_list(&html) else {
        trace.fields("Postcode page", form.field_pairs());
        let selects = all_selects(&html);
        if !selects.is_empty() {
            trace.record("Select elements found:");
            for select in &selects {
                trace.record(format!("  {}", select.describe()));
            }
        }
        return Err(PortError::AddressListMissing);
    };

    trace.record(format!(
        "postcode: address list has {} candidates",
        list.addresses().len()
    ));
    Ok((form, list))
}

/// Pick an address from the postcode results and post the selection.
pub(crate) async fn select_address(
    session: &Session,
    page: &Page,
    hint: Option<&str>,
    trace: &mut Trace,
) -> Result<Page, PortError> {
    let (mut form, list) = address_step(page, trace)?;
    let value = choose_address(&list, hint)
        .ok_or(PortError::NoAddressOption)?;
    trace.record(format!("postcode: selected address value {value:?}"));

    let name = list.name.as_deref().unwrap_or(ADDRESS_LIST_NAME);
    form.set(name, value);
    form.set(SELECT_ADDRESS_BUTTON, "Select");

    session.submit(page, &form).await
}

/// Search by street name, pick the street, then pick the address.
pub(crate) async fn street_flow(
    session: &Session,
    street: &str,
    postcode: &str,
    address_hint: Option<&str>,
    trace: &mut Trace,
) -> Result<Page, PortError> {
    trace.record(format!("street_flow: start street_query={street:?} postcode_hint={postcode:?}"));

    let landing = session.get(session.base_url()).await?;
    let mut form = Form::from_page(&landing)?;
    form.set(SEARCH_BY_RADIO, "S");
    form.set(STREET_TEXTBOX, street);
    form.set(STREET_SEARCH_BUTTON, "Search");
    let streets_page = session.submit(&landing, &form).await?;
    trace.record("street_flow: posted search");

    let hint = address_hint.unwrap_or(street);
    let street_form = street_selection(&streets_page, postcode, hint, trace)?;
    let addresses_page = session.submit(&streets_page, &street_form).await?;
    trace.record("street_flow: posted select");

    let address_form = street_address_selection(&addresses_page, address_hint, trace)?;
    session.submit(&addresses_page, &address_form).await
}

/// Build the postback that selects a street from the street search results.
fn street_selection(
    page: &Page,
    postcode: &str,
    hint: &str,
    trace: &mut Trace,
) -> Result<Form, PortError> {
    let html = Html::parse_document(&page.body);
    let Some(list) = find_street_list(&html) else {
        trace.record("street_flow: no streets select found");
        return Err(PortError::StreetListMissing);
    };
    trace.record(format!("street_flow: streets {}", list.describe()));

    let Some((value, text, how)) = choose_street(&list, postcode, hint) else {
        trace.record("Street options available:");
        for choice in &list.choices {
            trace.record(format!(
                "  value={:?} text={:?}",
                choice.value.as_deref().unwrap_or_default(),
                choice.text
            ));
        }
        trace.record("street_flow: could not select a street option");
        return Err(PortError::NoStreetOption);
    };
    trace.record(format!("street_flow: {how:?} match picked {text:?}"));

    let mut form = Form::from_document(&html, &page.url)?;
    let list_name = list.name.as_deref().unwrap_or(STREET_LIST_NAME);
    form.set(list_name, value);

    if let Some((button, label)) = street_button(&form) {
        form.set(&button, label);
    } else {
        let target = list.id.as_deref().unwrap_or(list_name);
        form.set(EVENT_TARGET, target);
        form.set_default(EVENT_ARGUMENT, "");
    }
    Ok(form)
}

/// Build the postback that selects an address after a street was chosen.
fn street_address_selection(
    page: &Page,
    hint: Option<&str>,
    trace: &mut Trace,
) -> Result<Form, PortError> {
    let html = Html::parse_document(&page.body);
    let list = find_street_addresses(&html)
        .ok_or(PortError::AddressListMissing)?;
    let value = choose_address(&list, hint)
        .ok_or(PortError::NoAddressOption)?;
    trace.record(format!("street_flow: selected address value {value:?}"));

    let mut form = Form::from_document(&html, &page.url)?;
    form.set(list.name.as_deref().unwrap_or(ADDRESS_LIST_NAME), value);
    form.set(SELECT_ADDRESS_BUTTON, "Select");
    Ok(form)
}

/// Name of the postcode input, tolerating renamed controls.
fn postcode_field(form: &Form) -> Option<String> {
    if form.contains(POSTCODE_TEXTBOX) {
        return Some(POSTCODE_TEXTBOX.to_owned());
    }

    let names = || form.field_pairs().map(|(name, _)| name);
    names()
        .find(|name| {
            let lower = name.to_lowercase();
            lower.contains("postcode") && !lower.contains("hidden") && !name.starts_with("__")
        })
        .or_else(|| {
            names().find(|name| {
                let lower = name.to_lowercase();
                lower.contains("$tb") || lower.contains("txt")
            })
        })
        .map(str::to_owned)
}

/// The "select street" submit button, with the label to post for it.
fn street_button(form: &Form) -> Option<(String, String)> {
    form.buttons
        .iter()
        .find(|(name, label)| {
            name == SELECT_STREET_BUTTON
                || name.to_lowercase().contains("selectstreet")
                || label.to_lowercase().contains("select street")
        })
        .map(|(name, label)| {
            let label = if label.is_empty() {
                "Select street"
            } else {
                label.as_str()
            };
            (name.clone(), label.to_owned())
        })
}
