use axum::Json;
use axum::http::header::{LOCATION, REFERER};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use gridform_application::ItemResponse;
use gridform_core::AppError;

use crate::error::ApiError;

/// Header naming the fragments a request asks for, or a response carries.
pub const PJAX_HEADER: HeaderName = HeaderName::from_static("x-pjax");

const REQUESTED_WITH_HEADER: HeaderName = HeaderName::from_static("x-requested-with");

/// How the client asked for the response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentRequest {
    pub is_fragment: bool,
    pub fragments: Vec<String>,
    pub referer: Option<String>,
}

impl FragmentRequest {
    /// Reads fragment hints: `X-Requested-With: XMLHttpRequest` or any
    /// `X-Pjax` header, whose value lists the wanted fragments.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let fragments: Vec<String> = headers
            .get(PJAX_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let is_xhr = headers
            .get(REQUESTED_WITH_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.eq_ignore_ascii_case("XMLHttpRequest"));
        let referer = headers
            .get(REFERER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned);

        Self {
            is_fragment: is_xhr || headers.contains_key(PJAX_HEADER),
            fragments,
            referer,
        }
    }
}

/// Converts an item outcome into an HTTP response.
pub fn into_http_response(response: ItemResponse) -> Result<Response, ApiError> {
    match response {
        ItemResponse::Content { body, fragment } => {
            let mut http_response = Html(body).into_response();
            if let Some(fragment) = fragment {
                http_response
                    .headers_mut()
                    .insert(PJAX_HEADER, header_value(&fragment)?);
            }
            Ok(http_response)
        }
        ItemResponse::Fragments(fragments) => Ok(Json(fragments).into_response()),
        ItemResponse::Redirect {
            location,
            refresh_fragment,
        } => {
            let mut http_response = StatusCode::SEE_OTHER.into_response();
            let headers = http_response.headers_mut();
            headers.insert(LOCATION, header_value(&location)?);
            if let Some(fragment) = refresh_fragment {
                headers.insert(PJAX_HEADER, header_value(&fragment)?);
            }
            Ok(http_response)
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|error| {
        AppError::Internal(format!("invalid response header value '{value}': {error}")).into()
    })
}
