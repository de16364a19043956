//! Locating the address and street lists and picking an entry from them.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use binday_core::model::Address;

use crate::form::{element_text, selector};

static ADDRESS_LIST: LazyLock<Selector> = LazyLock::new(|| selector("select#lstAddresses"));
static STREET_LIST: LazyLock<Selector> = LazyLock::new(|| selector("select#streets_listbox"));
static SELECT: LazyLock<Selector> = LazyLock::new(|| selector("select"));
static OPTION: LazyLock<Selector> = LazyLock::new(|| selector("option"));

/// One `<option>` of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Choice {
    /// Raw `value` attribute.
    pub(crate) value: Option<String>,
    /// Visible text.
    pub(crate) text: String,
}

impl Choice {
    /// Non-empty `value` attribute.
    fn posted_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|value| !value.is_empty())
    }

    /// Trimmed `value`, or the visible text when the value is blank.
    fn value_or_text(&self) -> &str {
        match self.value.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => self.text.as_str(),
        }
    }
}

/// A `<select>` element and its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectList {
    pub(crate) name: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) choices: Vec<Choice>,
}

impl SelectList {
    fn from_element(element: ElementRef<'_>) -> Self {
        let attr = |key| {
            element
                .value()
                .attr(key)
                .filter(|value: &&str| !value.is_empty())
                .map(str::to_owned)
        };
        let choices = element
            .select(&OPTION)
            .map(|option| Choice {
                value: option.value().attr("value").map(str::to_owned),
                text: element_text(option),
            })
            .collect();
        Self {
            name: attr("name"),
            id: attr("id"),
            choices,
        }
    }

    /// Options that post a non-empty value, as `(value, text)`.
    fn valued(&self) -> impl Iterator<Item = (&str, &str)> {
        self.choices
            .iter()
            .filter_map(|choice| Some((choice.posted_value()?, choice.text.as_str())))
    }

    /// Candidate addresses offered by this list.
    pub(crate) fn addresses(&self) -> Vec<Address> {
        self.valued()
            .map(|(value, label)| Address {
                value: value.to_owned(),
                label: label.to_owned(),
            })
            .collect()
    }

    /// One-line description for the diagnostic trace.
    pub(crate) fn describe(&self) -> String {
        format!(
            "select name={:?} id={:?} options={}",
            self.name.as_deref().unwrap_or_default(),
            self.id.as_deref().unwrap_or_default(),
            self.choices.len()
        )
    }
}

/// The address list shown after a postcode search.
///
/// Prefers `#lstAddresses`; otherwise any named list with more than one option.
pub(crate) fn find_address_list(html: &Html) -> Option<SelectList> {
    let explicit = html
        .select(&ADDRESS_LIST)
        .map(SelectList::from_element)
        .find(|list| list.name.is_some());
    explicit.or_else(|| {
        all_selects(html)
            .into_iter()
            .find(|list| list.name.is_some() && list.choices.len() > 1)
    })
}

/// The address list shown after a street has been picked; no fallback.
pub(crate) fn find_street_addresses(html: &Html) -> Option<SelectList> {
    html.select(&ADDRESS_LIST)
        .next()
        .map(SelectList::from_element)
}

/// The street list shown after a street search.
///
/// Prefers `#streets_listbox`; otherwise any list whose id or name mentions a
/// street and that has more than one option.
pub(crate) fn find_street_list(html: &Html) -> Option<SelectList> {
    html.select(&STREET_LIST)
        .next()
        .map(SelectList::from_element)
        .or_else(|| {
            all_selects(html)
                .into_iter()
                .find(|list| mentions_street(list) && list.choices.len() > 1)
        })
}

fn mentions_street(list: &SelectList) -> bool {
    [&list.id, &list.name]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains("street"))
}

/// Every list on the page, for diagnostics.
pub(crate) fn all_selects(html: &Html) -> Vec<SelectList> {
    html.select(&SELECT)
        .map(SelectList::from_element)
        .collect()
}

/// Pick an address value: first option whose text contains the hint
/// (case-insensitive), otherwise the first option with a value.
pub(crate) fn choose_address(list: &SelectList, hint: Option<&str>) -> Option<String> {
    let by_hint = hint.and_then(|fragment| {
        let needle = fragment.to_lowercase();
        list.valued()
            .find(|(_, text)| text.to_lowercase().contains(&needle))
            .map(|(value, _)| value)
    });
    by_hint
        .or_else(|| list.valued().next().map(|(value, _)| value))
        .map(str::to_owned)
}

/// How a street entry was chosen, for the diagnostic trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreetMatch {
    /// Postcode outward code found in the option.
    Outward,
    /// Street or address hint found in the option text.
    Hint,
    /// First usable option.
    Fallback,
}

/// Pick a street value, trying the postcode's outward code, then the hint,
/// then the first non-empty option.
pub(crate) fn choose_street(
    list: &SelectList,
    postcode: &str,
    hint: &str,
) -> Option<(String, String, StreetMatch)> {
    let usable = || {
        list.choices
            .iter()
            .map(|choice| (choice.value_or_text(), choice.text.as_str()))
            .filter(|(value, _)| !value.is_empty())
    };

    let outward = postcode
        .split_whitespace()
        .next()
        .map(str::to_uppercase)
        .filter(|code| !code.is_empty());
    let by_outward = outward.and_then(|code| {
        usable()
            .find(|(value, text)| {
                value.to_uppercase().contains(&code) || text.to_uppercase().contains(&code)
            })
            .map(|(value, text)| (value, text, StreetMatch::Outward))
    });

    let needle = hint.trim().to_lowercase();
    let by_hint = || {
        if needle.is_empty() {
            return None;
        }
        usable()
            .find(|(_, text)| text.to_lowercase().contains(&needle))
            .map(|(value, text)| (value, text, StreetMatch::Hint))
    };

    by_outward
        .or_else(by_hint)
        .or_else(|| {
            usable()
                .next()
                .map(|(value, text)| (value, text, StreetMatch::Fallback))
        })
        .map(|(value, text, how)| (value.to_owned(), text.to_owned(), how))
}

/// Street fragment from an address hint: leading house numbers and flat
/// markers (`Flat`, `Apt`, `Appt`) are dropped.
pub(crate) fn derive_street_hint(address: &str) -> Option<String> {
    let words: Vec<&str> = address
        .split_whitespace()
        .skip_while(|word| {
            let marker = word.trim_end_matches('.').to_uppercase();
            matches!(marker.as_str(), "FLAT" | "APPT" | "APT")
                || word.chars().any(|ch| ch.is_ascii_digit())
        })
        .collect();
    (!words.is_empty()).then(|| words.join(" "))
}
