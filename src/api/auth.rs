//! Caller identity extraction.
//!
//! Token validation happens in the upstream auth gateway, which forwards
//! the authenticated caller in the `x-user-id` and `x-user-role` headers.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::response::ApiErrorResponse;
use crate::models::Role;
use crate::services::{Actor, ClientInfo};

/// Header carrying the caller's employee id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the caller's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiErrorResponse::unauthorized("Authentication required"))?;
        let role: Role = header_value(parts, USER_ROLE_HEADER)
            .ok_or_else(|| ApiErrorResponse::unauthorized("Authentication required"))?
            .parse()
            .map_err(ApiErrorResponse::unauthorized)?;
        Ok(Actor::new(user_id, role))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = header_value(parts, "x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next())
            .map(|ip| ip.trim().to_string())
            .or_else(|| header_value(parts, "x-real-ip").map(str::to_string));
        let user_agent = header_value(parts, "user-agent").map(str::to_string);
        Ok(ClientInfo {
            ip_address,
            user_agent,
        })
    }
}
