use gridform_core::UserIdentity;
use gridform_domain::Breadcrumb;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for development sign-in.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dev-login-request.ts"
)]
pub struct DevLoginRequest {
    pub subject: String,
    pub display_name: Option<String>,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl From<UserIdentity> for UserIdentityResponse {
    fn from(identity: UserIdentity) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(ToOwned::to_owned),
        }
    }
}

/// One entry of a record's navigation trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/breadcrumb-response.ts"
)]
pub struct BreadcrumbResponse {
    pub title: String,
    pub link: Option<String>,
}

impl From<&Breadcrumb> for BreadcrumbResponse {
    fn from(breadcrumb: &Breadcrumb) -> Self {
        Self {
            title: breadcrumb.title().to_owned(),
            link: breadcrumb.link().map(ToOwned::to_owned),
        }
    }
}
