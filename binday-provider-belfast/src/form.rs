//! ASP.NET WebForms state extraction.
//!
//! WebForms pages carry their state in hidden inputs (`__VIEWSTATE`,
//! `__EVENTVALIDATION`, ...) that must be posted back with every request,
//! together with every other successful control of the form.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use binday_core::ports::PortError;

use crate::session::Page;

static FORM_WITH_ID: LazyLock<Selector> = LazyLock::new(|| selector("form[id]"));
static FORM_WITH_NAME: LazyLock<Selector> = LazyLock::new(|| selector("form[name]"));
static FORM: LazyLock<Selector> = LazyLock::new(|| selector("form"));
static INPUT: LazyLock<Selector> = LazyLock::new(|| selector("input"));
static TEXTAREA: LazyLock<Selector> = LazyLock::new(|| selector("textarea"));
static SELECT: LazyLock<Selector> = LazyLock::new(|| selector("select"));
static OPTION: LazyLock<Selector> = LazyLock::new(|| selector("option"));
static SELECTED_OPTION: LazyLock<Selector> = LazyLock::new(|| selector("option[selected]"));

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector")
}

/// Event target field used when a postback is raised by a control instead of a button.
pub(crate) const EVENT_TARGET: &str = "__EVENTTARGET";
/// Event argument field paired with [`EVENT_TARGET`].
pub(crate) const EVENT_ARGUMENT: &str = "__EVENTARGUMENT";

/// The page's main form: where to post it and the values it would submit.
#[derive(Debug, Clone)]
pub(crate) struct Form {
    pub(crate) action: Url,
    /// Successful controls in document order. Submit buttons are excluded.
    pub(crate) fields: Vec<(String, String)>,
    /// Submit buttons as `(name, label)`, available for simulating a click.
    pub(crate) buttons: Vec<(String, String)>,
}

impl Form {
    pub(crate) fn from_page(page: &Page) -> Result<Self, PortError> {
        let html = Html::parse_document(&page.body);
        Self::from_document(&html, &page.url)
    }

    pub(crate) fn from_document(html: &Html, page_url: &Url) -> Result<Self, PortError> {
        let form = main_form(html).ok_or(PortError::FormNotFound)?;

        let action = match form.value().attr("action").map(str::trim) {
            Some(action) if !action.is_empty() => page_url.join(action)?,
            _ => page_url.clone(),
        };

        let mut fields = Vec::new();
        let mut buttons = Vec::new();

        for input in form.select(&INPUT) {
            let Some(name) = named(input) else {
                continue;
            };
            let kind = input
                .value()
                .attr("type")
                .unwrap_or_default()
                .to_ascii_lowercase();
            let value = input.value().attr("value");
            match kind.as_str() {
                "submit" => buttons.push((name.to_owned(), value.unwrap_or_default().to_owned())),
                "checkbox" | "radio" => {
                    if input.value().attr("checked").is_some() {
                        fields.push((name.to_owned(), value.unwrap_or("on").to_owned()));
                    }
                }
                _ => fields.push((name.to_owned(), value.unwrap_or_default().to_owned())),
            }
        }

        for textarea in form.select(&TEXTAREA) {
            if let Some(name) = named(textarea) {
                fields.push((name.to_owned(), textarea.text().collect()));
            }
        }

        for select in form.select(&SELECT) {
            let Some(name) = named(select) else {
                continue;
            };
            let value = select
                .select(&SELECTED_OPTION)
                .next()
                .or_else(|| select.select(&OPTION).next())
                .map(option_value)
                .unwrap_or_default();
            fields.push((name.to_owned(), value));
        }

        Ok(Self {
            action,
            fields,
            buttons,
        })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field, replacing an existing value in place.
    pub(crate) fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.fields.iter_mut().find(|(field, _)| field == name) {
            existing.1 = value;
        } else {
            self.fields.push((name.to_owned(), value));
        }
    }

    /// Set a field only when the form does not already carry it.
    pub(crate) fn set_default(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.fields.push((name.to_owned(), value.into()));
        }
    }

    /// Hidden WebForms state (`__VIEWSTATE`, `__EVENTVALIDATION`, ...).
    pub(crate) fn state_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.field_pairs()
            .filter(|(name, _)| name.starts_with("__"))
    }

    pub(crate) fn field_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

fn main_form(html: &Html) -> Option<ElementRef<'_>> {
    html.select(&FORM_WITH_ID)
        .next()
        .or_else(|| html.select(&FORM_WITH_NAME).next())
        .or_else(|| html.select(&FORM).next())
}

fn named(element: ElementRef<'_>) -> Option<&str> {
    element
        .value()
        .attr("name")
        .filter(|value| !value.is_empty())
}

/// Value an `<option>` submits: its `value` attribute, or its text.
pub(crate) fn option_value(option: ElementRef<'_>) -> String {
    option
        .value()
        .attr("value")
        .map_or_else(|| element_text(option), str::to_owned)
}

/// Text of an element with each text node trimmed and blank nodes dropped.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
