pub mod access;
pub mod auth;
pub mod extract;
pub mod response;
pub mod tenant;

pub use access::{authorize, AccessError, OrgAccess};
pub use auth::{require_session, AuthUser, MaybeUser};
pub use extract::{ApiJson, ApiPath};
pub use response::{ApiResponse, ApiResult};
pub use tenant::{request_host, subdomain_from_host};
