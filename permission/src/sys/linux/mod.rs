//! Linux permission implementation.
//!
//! Desktop Linux has no runtime location prompt. GeoClue2 decides per
//! desktop id when the client starts, so the gate reports a grant and any
//! refusal surfaces later as a provider error.

use crate::{Permission, PermissionError, PermissionStatus};

pub(crate) async fn check(permission: Permission) -> PermissionStatus {
    match permission {
        Permission::Location => PermissionStatus::Granted,
    }
}

pub(crate) async fn request(permission: Permission) -> Result<PermissionStatus, PermissionError> {
    Ok(check(permission).await)
}
