use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::HttpClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMethod {
    Get,
    Post,
}

impl FormMethod {
    /// Anything other than `post` (any casing) is treated as GET.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(m) if m.trim().eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FormMethod::Get => "get",
            FormMethod::Post => "post",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormInput {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub input_type: String,
    pub value: String,
}

/// A form as discovered on a page. `action` is always absolute and never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDescriptor {
    pub action: String,
    pub method: FormMethod,
    pub inputs: Vec<FormInput>,
}

/// One `<form>` element as it appeared on the page, with the inputs it owns.
/// Attributes are kept raw; `extract_form` normalizes them.
#[derive(Debug, Clone, PartialEq)]
pub struct FormNode {
    pub action: Option<String>,
    pub method: Option<String>,
    pub inputs: Vec<FormInput>,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Fetches `url` and returns every form on the page. Network failures yield
/// an empty list so the scan continues without forms.
pub async fn fetch_forms(client: &HttpClient, url: &str, timeout: Duration) -> Vec<FormNode> {
    let body = match client.get(url, timeout).await {
        Ok(response) => match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read {}: {}", url, e);
                return Vec::new();
            }
        },
        Err(e) => {
            warn!("Connection error while crawling {}: {}", url, e);
            return Vec::new();
        }
    };

    let nodes = parse_forms(&body);
    debug!("Found {} form(s) on {}", nodes.len(), url);
    nodes
}

/// Splits a page into its forms and assigns every `<input>` to its owner.
///
/// The owner is, in order: the form named by the input's `form="id"`
/// attribute, the enclosing `<form>` element, or the last form opened before
/// the input. The last rule covers markup such as `<table><form><tr>...`,
/// where the tree builder closes the form before its inputs.
pub fn parse_forms(body: &str) -> Vec<FormNode> {
    let document = Html::parse_document(body);

    let mut nodes = Vec::new();
    let mut forms: Vec<ElementRef<'_>> = Vec::new();
    let mut by_html_id: HashMap<String, usize> = HashMap::new();

    for form in document.select(&selector("form")) {
        if let Some(id) = form.value().attr("id") {
            by_html_id.entry(id.to_string()).or_insert(nodes.len());
        }
        forms.push(form);
        nodes.push(FormNode {
            action: form.value().attr("action").map(str::to_string),
            method: form.value().attr("method").map(str::to_string),
            inputs: Vec::new(),
        });
    }

    let mut last_opened: Option<usize> = None;
    for element in document.select(&selector("form, input")) {
        if element.value().name() == "form" {
            last_opened = forms.iter().position(|f| *f == element);
            continue;
        }

        let owner = element
            .value()
            .attr("form")
            .and_then(|id| by_html_id.get(id).copied())
            .or_else(|| {
                element
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|e| e.value().name() == "form")
                    .and_then(|form| forms.iter().position(|f| *f == form))
            })
            .or(last_opened);

        if let Some(index) = owner {
            nodes[index].inputs.push(read_input(element));
        }
    }

    nodes
}

fn read_input(input: ElementRef<'_>) -> FormInput {
    let attrs = input.value();
    FormInput {
        name: attrs.attr("name").map(|n| n.to_string()),
        input_type: attrs.attr("type").unwrap_or("text").to_string(),
        value: attrs.attr("value").unwrap_or("").to_string(),
    }
}

/// Resolves a possibly relative reference against the page URL. An empty
/// or unresolvable reference falls back to the page URL itself.
pub fn resolve_action(page_url: &str, action: Option<&str>) -> String {
    let action = match action.map(str::trim) {
        Some(a) if !a.is_empty() => a,
        _ => return page_url.to_string(),
    };

    Url::parse(page_url)
        .and_then(|base| base.join(action))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| page_url.to_string())
}

/// Turns a raw form node into a descriptor.
pub fn extract_form(node: &FormNode, page_url: &str) -> FormDescriptor {
    FormDescriptor {
        action: resolve_action(page_url, node.action.as_deref()),
        method: FormMethod::parse(node.method.as_deref()),
        inputs: node.inputs.clone(),
    }
}
