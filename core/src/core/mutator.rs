use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use url::form_urlencoded;
use url::Url;

use crate::error::ProbeError;
use crate::http::HttpRequest;
use crate::modules::crawler::{FormDescriptor, FormInput, FormMethod};

/// Submit buttons are left out so the submission does not trigger an
/// unrelated action.
fn is_injectable(input: &FormInput) -> bool {
    !input.input_type.eq_ignore_ascii_case("submit")
}

/// Field/value pairs where every named, non-submit input carries `payload`.
pub fn build_submission(form: &FormDescriptor, payload: &str) -> Vec<(String, String)> {
    form.inputs
        .iter()
        .filter(|input| is_injectable(input))
        .filter_map(|input| input.name.as_ref())
        .map(|name| (name.clone(), payload.to_string()))
        .collect()
}

/// Builds the request that submits `payload` through `form` using its
/// declared method: query parameters for GET, an urlencoded body for POST.
pub fn build_form_request(form: &FormDescriptor, payload: &str) -> Result<HttpRequest, ProbeError> {
    let mut url = Url::parse(&form.action)
        .map_err(|_| ProbeError::InvalidUrl(form.action.clone()))?;
    let fields = build_submission(form, payload);

    match form.method {
        FormMethod::Get => {
            if !fields.is_empty() {
                let mut query = url.query_pairs_mut();
                for (name, value) in &fields {
                    query.append_pair(name, value);
                }
            }
            Ok(HttpRequest::new(Method::GET, url, HeaderMap::new(), String::new()))
        }
        FormMethod::Post => {
            let body = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields.iter())
                .finish();
            let mut headers = HeaderMap::new();
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
            Ok(HttpRequest::new(Method::POST, url, headers, body))
        }
    }
}
