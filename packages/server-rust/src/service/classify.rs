//! Request classification: converts raw call inputs into a typed
//! [`ImageRequest`].
//!
//! Classification resolves the operation name and parses its parameters
//! before any stage runs, so every request entering the chain carries
//! well-formed [`OperationParams`].

use std::collections::HashMap;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use bytes::Bytes;
use imgpipe_core::{ImageError, ImageRequest, OperationDispatcher, OperationKind, OperationParams};
use serde_json::{Map, Value};

/// Resolves `name`, parses `params` for it and builds the request.
///
/// # Errors
///
/// - `ImageError::UnsupportedOperation` for an unknown operation name or
///   output format
/// - `ImageError::Validation` for missing or malformed parameters
pub fn classify(
    dispatcher: &OperationDispatcher,
    name: &str,
    params: &Value,
    bytes: Bytes,
    token: Option<String>,
) -> Result<(OperationKind, ImageRequest), ImageError> {
    let kind = dispatcher.resolve(name)?;
    let params = OperationParams::parse(kind, params)?;
    let mut request = ImageRequest::new(bytes, params);
    request.token = token;
    Ok((kind, request))
}

/// Extracts the credential from an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, uses another scheme, or
/// carries an empty token.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Converts query-string pairs into a parameter object.
///
/// Values that parse as JSON scalars (numbers, booleans, null) keep that
/// type; everything else stays a string. Empty values are treated as
/// absent. `operations` is parsed as JSON so pipelines can be passed inline.
#[must_use]
pub fn query_to_params(query: &HashMap<String, String>) -> Value {
    let mut params = Map::new();
    for (key, raw) in query {
        if raw.is_empty() {
            continue;
        }
        let parsed = serde_json::from_str::<Value>(raw).ok();
        let value = match parsed {
            Some(value) if key == "operations" => value,
            Some(value @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => value,
            _ => Value::String(raw.clone()),
        };
        params.insert(key.clone(), value);
    }
    Value::Object(params)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use imgpipe_core::{ErrorKind, FilterKind, Rotation};
    use serde_json::json;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn query_values_keep_scalar_types() {
        let params = query_to_params(&query(&[
            ("width", "300"),
            ("fit", "contain"),
            ("flag", "true"),
        ]));
        assert_eq!(params, json!({"width": 300, "fit": "contain", "flag": true}));
    }

    #[test]
    fn empty_query_values_are_dropped() {
        let params = query_to_params(&query(&[("width", ""), ("height", "40")]));
        assert_eq!(params, json!({"height": 40}));

        let (_, req) = classify(
            &OperationDispatcher::default(),
            "resize",
            &params,
            Bytes::from_static(b"img"),
            None,
        )
        .unwrap();
        assert!(matches!(
            req.params,
            OperationParams::Resize(imgpipe_core::ResizeParams {
                width: None,
                height: Some(40),
                ..
            })
        ));
    }

    #[test]
    fn query_operations_parse_as_json() {
        let params = query_to_params(&query(&[(
            "operations",
            r#"[{"type":"rotate","params":{"angle":90}}]"#,
        )]));
        assert_eq!(
            params["operations"],
            json!([{"type": "rotate", "params": {"angle": 90}}])
        );
    }

    #[test]
    fn quoted_and_structured_values_stay_strings() {
        let params = query_to_params(&query(&[("filter", "blur"), ("meta", "{\"a\":1}")]));
        assert_eq!(params["filter"], "blur");
        assert_eq!(params["meta"], "{\"a\":1}");
    }

    #[test]
    fn classify_builds_typed_request() {
        let dispatcher = OperationDispatcher::default();
        let (kind, req) = classify(
            &dispatcher,
            "rotate",
            &json!({"angle": 270}),
            Bytes::from_static(b"img"),
            Some("tok".into()),
        )
        .unwrap();

        assert_eq!(kind, OperationKind::Rotate);
        assert_eq!(req.token.as_deref(), Some("tok"));
        assert!(req.identity().is_none());
        assert_eq!(
            req.params,
            OperationParams::Rotate(imgpipe_core::RotateParams {
                angle: Rotation::Deg270
            })
        );
    }

    #[test]
    fn classify_rejects_unknown_operation() {
        let err = classify(
            &OperationDispatcher::default(),
            "sepia",
            &json!({}),
            Bytes::new(),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(err.to_string(), "Unknown operation type: sepia");
    }

    #[test]
    fn classify_rejects_bad_filter() {
        let err = classify(
            &OperationDispatcher::default(),
            "filter",
            &json!({"filter": "sepia"}),
            Bytes::new(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, ImageError::Validation("Unsupported filter: sepia".into()));
        let ok = classify(
            &OperationDispatcher::default(),
            "filter",
            &json!({"filter": "blur"}),
            Bytes::new(),
            None,
        )
        .unwrap();
        assert!(matches!(
            ok.1.params,
            OperationParams::Filter(imgpipe_core::FilterParams {
                filter: FilterKind::Blur
            })
        ));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer   ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));
    }
}
