// SPDX-License-Identifier: MIT

//! User reference data (owned by the identity/profile feature).

use serde::{Deserialize, Serialize};

/// User profile record. Read-only for this service; written by the
/// identity layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also the document ID)
    pub id: String,
    pub display_name: String,
    /// School the user belongs to, when known
    pub school_id: Option<String>,
    /// Team memberships
    #[serde(default)]
    pub team_ids: Vec<String>,
}
