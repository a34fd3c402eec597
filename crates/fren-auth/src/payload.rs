use serde::{Deserialize, Serialize};

/// Payload carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// User id.
    pub id: i64,
    /// Expiry as a Unix timestamp in seconds.
    pub exp: i64,
    /// Issue time as a Unix timestamp in seconds.
    pub iat: i64,
    /// Unique token id; two tokens issued in the same second still differ.
    pub jti: String,
}
