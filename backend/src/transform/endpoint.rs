//! Endpoint resolution from data-source descriptors.
//!
//! Two strategies, picked by the caller from the record kind:
//!
//! - [`resolve_endpoint`] - direct records: `bean!method.m?k=v&...`
//! - [`resolve_query_endpoint`] - query records: `bean!method.m`, plus the
//!   query text buried in `options.extraParamFields.queryString`

use serde_json::{Map, Value};

use crate::error::ParseResult;
use crate::parser::{coerce_string, parse_json_object, ValueExt};

/// Build `bean!method.m` when both parts are present.
pub fn endpoint_identifier(descriptor: &Map<String, Value>) -> Option<String> {
    let bean = descriptor.string_field("bean")?;
    let method = descriptor.string_field("method")?;
    Some(format!("{}!{}.m", bean, method))
}

/// Join `params` as `k=v&k=v` in descriptor order.
///
/// `None` when there are no params. A `null` value renders as `null`.
pub fn param_string(descriptor: &Map<String, Value>) -> ParseResult<Option<String>> {
    let params = match descriptor.embedded_field("params")? {
        Some(Value::Object(params)) => params,
        _ => return Ok(None),
    };

    let joined = params
        .iter()
        .map(|(key, value)| {
            let value = coerce_string(value).unwrap_or_else(|| "null".to_string());
            format!("{}={}", key, value)
        })
        .collect::<Vec<_>>()
        .join("&");

    Ok(Some(joined).filter(|s| !s.is_empty()))
}

/// Resolve the endpoint of a direct-invocation record.
///
/// Returns `Ok(None)` when `bean` or `method` is missing.
pub fn resolve_endpoint(descriptor: &Map<String, Value>) -> ParseResult<Option<String>> {
    let mut url = match endpoint_identifier(descriptor) {
        Some(url) => url,
        None => return Ok(None),
    };

    if let Some(params) = param_string(descriptor)? {
        url.push('?');
        url.push_str(&params);
    }

    Ok(Some(url))
}

/// Endpoint and query text of a query-based record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryEndpoint {
    pub url: Option<String>,
    pub query_string: Option<String>,
}

impl QueryEndpoint {
    /// Store the extracted query text in the descriptor under `queryString`.
    pub fn merge_into(&self, descriptor: &mut Map<String, Value>) {
        if let Some(ref query) = self.query_string {
            descriptor.insert("queryString".to_string(), Value::String(query.clone()));
        }
    }
}

/// Resolve the endpoint of a query-based record.
///
/// `params` are not read for this kind.
pub fn resolve_query_endpoint(
    descriptor: &Map<String, Value>,
    options_text: Option<&str>,
) -> ParseResult<QueryEndpoint> {
    Ok(QueryEndpoint {
        url: endpoint_identifier(descriptor),
        query_string: extract_query_string(options_text)?,
    })
}

/// Follow `options` → `extraParamFields` → `queryString`.
///
/// Any missing link yields `None`; malformed text at any link is an error.
pub fn extract_query_string(options_text: Option<&str>) -> ParseResult<Option<String>> {
    let options = match parse_json_object("options", options_text)? {
        Some(options) => options,
        None => return Ok(None),
    };

    match options.embedded_field("extraParamFields")? {
        Some(Value::Object(extra)) => Ok(extra.string_field("queryString")),
        _ => Ok(None),
    }
}
