//! Credential extraction.
//!
//! Precedence: `Authorization: Bearer <token>` header, then the `token` cookie,
//! then the `?token=` query parameter. The first non-empty one wins.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query},
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};
use serde::Deserialize;

use crate::{domain::UserId, ui::state::AppState};

/// Name of the cookie (and query parameter) carrying the access token.
pub const TOKEN_COOKIE: &str = "token";

/// Query parameters accepted for authentication
#[derive(Debug, Default, Deserialize)]
pub struct CredentialQuery {
    pub token: Option<String>,
}

/// Pick the credential from a request according to the precedence rule.
pub fn extract_credential(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    bearer_token(headers)
        .or_else(|| cookie_token(headers))
        .or_else(|| non_empty(query_token))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    non_empty(value.strip_prefix("Bearer "))
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name.trim() == TOKEN_COOKIE).then_some(value)
        })
        .find_map(|value| non_empty(Some(value)))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extractor for HTTP endpoints that require an authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let query = Query::<CredentialQuery>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .unwrap_or_default();
        let credential = extract_credential(&parts.headers, query.token.as_deref());

        state
            .authenticate_usecase
            .execute(credential.as_deref())
            .map(AuthenticatedUser)
            .map_err(|e| {
                tracing::warn!("Rejected HTTP request: {}", e);
                StatusCode::UNAUTHORIZED
            })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_bearer_header_wins() {
        // テスト項目: Authorization ヘッダーが cookie とクエリより優先される
        // given (前提条件):
        let headers = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "token=from-cookie"),
        ]);

        // when (操作):
        let result = extract_credential(&headers, Some("from-query"));

        // then (期待する結果):
        assert_eq!(result.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_used_when_header_missing() {
        // テスト項目: ヘッダーがない場合は cookie が使われる
        // given (前提条件):
        let headers = headers(&[("cookie", "theme=dark; token=from-cookie; lang=ja")]);

        // when (操作):
        let result = extract_credential(&headers, Some("from-query"));

        // then (期待する結果):
        assert_eq!(result.as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_query_used_as_last_resort() {
        // テスト項目: ヘッダーも cookie もない場合はクエリパラメータが使われる
        // given (前提条件):
        let headers = headers(&[("cookie", "theme=dark")]);

        // when (操作):
        let result = extract_credential(&headers, Some("from-query"));

        // then (期待する結果):
        assert_eq!(result.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_empty_values_are_skipped() {
        // テスト項目: 空の値は無視され、次の候補が使われる
        // given (前提条件):
        let headers = headers(&[("authorization", "Bearer "), ("cookie", "token=")]);

        // when (操作):
        let result = extract_credential(&headers, Some("from-query"));

        // then (期待する結果):
        assert_eq!(result.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_non_bearer_scheme_is_ignored() {
        // テスト項目: Bearer 以外の Authorization スキームは無視される
        // given (前提条件):
        let headers = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);

        // when (操作):
        let result = extract_credential(&headers, None);

        // then (期待する結果):
        assert_eq!(result, None);
    }
}
