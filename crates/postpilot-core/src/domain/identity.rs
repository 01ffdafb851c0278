use serde::{Deserialize, Serialize};

/// Identity asserted by the external identity provider for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub username: String,
}
