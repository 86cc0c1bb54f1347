use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::session::Token;

/// JWT payload: registered claims plus the identity snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
    #[serde(flatten)]
    pub token: Token,
}
