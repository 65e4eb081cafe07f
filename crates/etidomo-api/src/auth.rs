use secrecy::SecretString;

/// Username/password pair for the session-layer registration exchange.
///
/// Distinct from the static access token, which authorises the HTTP
/// request itself and lives in the client's default headers.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}
