// Session layer: registration and application-message wrapping.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::DomoClient;
use crate::error::Error;
use crate::models::{Reply, SessionRequest};

impl DomoClient {
    /// Register a session with the gateway.
    ///
    /// A no-op while a session id is held. On success the new id is
    /// stored and the session epoch advances.
    pub async fn login(&self) -> Result<(), Error> {
        if self.is_connected() {
            debug!("session already established");
            return Ok(());
        }

        debug!(user = %self.credentials.username, "registering session");
        let request: SessionRequest<'_, Value> = SessionRequest::Registration {
            sl_login: &self.credentials.username,
            sl_pwd: self.credentials.password.expose_secret(),
        };
        let reply = self.post(&request, Some("sl_registration_ack"), None).await?;

        let client_id = match reply.get("sl_client_id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                warn!("registration reply carries no client id");
                return Err(Error::MissingClientId);
            }
        };

        let mut session = self.session_write();
        session.client_id = Some(client_id);
        session.epoch += 1;
        info!(epoch = session.epoch, "session registered");
        Ok(())
    }

    /// Send an application command inside an `sl_data_req` envelope.
    ///
    /// Logs in first if needed. `expected` is the `cmd_name` the reply
    /// must carry; `None` skips the check. A connection error drops the
    /// session so the next call registers again.
    pub async fn application_request<T: Serialize + ?Sized>(
        &self,
        command: &T,
        expected: Option<&str>,
    ) -> Result<Reply, Error> {
        self.application_request_with_wait(command, expected, None)
            .await
    }

    pub(crate) async fn application_request_with_wait<T: Serialize + ?Sized>(
        &self,
        command: &T,
        expected: Option<&str>,
        extra_wait: Option<Duration>,
    ) -> Result<Reply, Error> {
        self.login().await?;

        let Some(client_id) = self.client_id() else {
            return Err(Error::MissingClientId);
        };
        let request = SessionRequest::Data {
            sl_client_id: &client_id,
            sl_appl_msg: command,
        };

        let reply = match self.post(&request, None, extra_wait).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_connection_error() {
                    self.invalidate_session();
                }
                return Err(e);
            }
        };

        if let Some(expected) = expected
            && reply.cmd_name() != Some(expected)
        {
            warn!(expected, actual = ?reply.cmd_name(), "unexpected application reply");
            return Err(Error::UnexpectedResponse {
                expected: expected.to_owned(),
                actual: reply.cmd_name().map(str::to_owned),
            });
        }

        Ok(reply)
    }
}
