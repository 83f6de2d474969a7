// Actor identity extractor
//
// Identity is injected by the upstream authentication layer as headers on
// every request; this service trusts it for history attribution only and
// never issues or validates tokens itself.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use flowgate_contracts::{Actor, ErrorBody};
use uuid::Uuid;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const COMPANY_ID_HEADER: &str = "x-company-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Extracts the authenticated actor from request headers
pub struct ActorIdentity(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for ActorIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_actor(&parts.headers).map(ActorIdentity).ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: "missing_identity".to_string(),
                message: format!(
                    "{ACTOR_ID_HEADER}, {COMPANY_ID_HEADER}, {ACTOR_NAME_HEADER} and {ACTOR_ROLE_HEADER} headers are required"
                ),
                current_status: None,
                expected_step_id: None,
            }),
        ))
    }
}

fn parse_actor(headers: &HeaderMap) -> Option<Actor> {
    let id = header_uuid(headers, ACTOR_ID_HEADER)?;
    let company_id = header_uuid(headers, COMPANY_ID_HEADER)?;
    let name = header_str(headers, ACTOR_NAME_HEADER)?;
    let role = header_str(headers, ACTOR_ROLE_HEADER)?;
    Some(Actor::new(id, company_id, name, role))
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Option<Uuid> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(with_role: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACTOR_ID_HEADER,
            HeaderValue::from_str(&Uuid::now_v7().to_string()).unwrap(),
        );
        headers.insert(
            COMPANY_ID_HEADER,
            HeaderValue::from_str(&Uuid::now_v7().to_string()).unwrap(),
        );
        headers.insert(ACTOR_NAME_HEADER, HeaderValue::from_static("Dana"));
        if with_role {
            headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("hr_manager"));
        }
        headers
    }

    #[test]
    fn parses_complete_identity() {
        let actor = parse_actor(&headers(true)).unwrap();
        assert_eq!(actor.name, "Dana");
        assert_eq!(actor.role, "hr_manager");
    }

    #[test]
    fn rejects_missing_role() {
        assert!(parse_actor(&headers(false)).is_none());
    }

    #[test]
    fn rejects_malformed_uuid() {
        let mut h = headers(true);
        h.insert(ACTOR_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert!(parse_actor(&h).is_none());
    }
}
