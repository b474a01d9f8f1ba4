use crate::{
    devices::hardware::camera::IpCamera,
    error::{Error, Result},
    messages::api::{envelope::first_reply, login::TokenValue},
};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

/// Credential returned by a successful login and presented on later
/// calls. Its name is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken {
    name: String,
    /// Seconds the device promised to keep the token alive.
    lease_time: u64,
}

impl SessionToken {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_time)
    }
}

/// Decode a login reply into a token. Anything other than a first
/// envelope carrying a non-empty token name is an authentication failure,
/// a partial token is never returned.
///
/// * `body`: raw reply of the login command.
pub fn parse_login_reply(body: &[u8]) -> Result<SessionToken> {
    let envelope = first_reply::<TokenValue>(body)
        .map_err(|e| Error::Auth(format!("malformed login reply: {e}")))?
        .ok_or_else(|| Error::Auth(String::from("login reply was empty")))?;

    let record = envelope.into_value().map_err(Error::Auth)?.token;
    if record.name.is_empty() {
        return Err(Error::Auth(String::from("login reply carried an empty token")));
    }

    Ok(SessionToken {
        name: record.name,
        lease_time: record.lease_time,
    })
}

/// Log in to the camera once and return the session token.
///
/// * `camera`: device to authenticate against.
pub async fn login(camera: &IpCamera) -> Result<SessionToken> {
    let body = camera.login_raw().await.map_err(|e| match e {
        Error::Http { status, .. } => Error::Auth(format!("login rejected with status {status}")),
        other => other,
    })?;

    parse_login_reply(&body)
}

/// Holds the camera together with the session token obtained for it so
/// the token is requested once and reused.
///
/// Tokens are never renewed. The lease runs out silently once
/// `lease_time` has passed and later authorised calls will fail.
pub struct SessionManager {
    camera: Arc<IpCamera>,
    session: Option<(SessionToken, Instant)>,
}

impl SessionManager {
    /// Create a manager for a camera without logging in yet.
    ///
    /// * `camera`: device the session belongs to.
    pub fn new(camera: IpCamera) -> Self {
        Self {
            camera: Arc::new(camera),
            session: None,
        }
    }

    pub fn camera(&self) -> &IpCamera {
        &self.camera
    }

    /// Handle to the camera for tasks outliving this borrow, such as a
    /// motion poller.
    pub fn shared_camera(&self) -> Arc<IpCamera> {
        self.camera.clone()
    }

    /// Log in and keep the token, replacing any previous one. On failure
    /// the previous token is dropped as well.
    pub async fn login(&mut self) -> Result<&SessionToken> {
        self.session = None;
        let token = login(&self.camera).await?;

        tracing::info!(
            camera = %self.camera.get_uuid(),
            lease_seconds = token.lease_time,
            "Logged in to camera"
        );
        Ok(&self.session.insert((token, Instant::now())).0)
    }

    /// Token obtained by the last successful login.
    pub fn token(&self) -> Result<&SessionToken> {
        self.session
            .as_ref()
            .map(|(token, _)| token)
            .ok_or_else(|| Error::Auth(String::from("not logged in")))
    }

    /// Token held, logging in first when there is none.
    pub async fn ensure_token(&mut self) -> Result<&SessionToken> {
        if self.session.is_none() {
            self.login().await?;
        }
        self.token()
    }

    /// Lease time left on the held token, zero once it has run out.
    pub fn lease_remaining(&self) -> Option<Duration> {
        self.session
            .as_ref()
            .map(|(token, obtained)| token.lease().saturating_sub(obtained.elapsed()))
    }

    /// Whether the held token is expected to outlast `window`. False when
    /// no token is held.
    ///
    /// * `window`: time the token still has to be valid for.
    pub fn lease_covers(&self, window: Duration) -> bool {
        self.lease_remaining()
            .map_or(false, |remaining| remaining >= window)
    }
}
