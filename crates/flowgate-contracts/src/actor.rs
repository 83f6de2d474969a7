// Caller identity, supplied by the upstream authentication collaborator.
// The engine trusts it for history attribution only; authorization
// (who may act on a step) is layered on top by the caller.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    #[schema(example = "hr_manager")]
    pub role: String,
}

impl Actor {
    pub fn new(id: Uuid, company_id: Uuid, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id,
            company_id,
            name: name.into(),
            role: role.into(),
        }
    }
}
