use crate::{
    error::{Error, Result},
    messages::api::{
        envelope::first_reply,
        login::LoginRequest,
        motion::{MotionState, MotionStateValue},
    },
};
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsStr,
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};
use uuid::Uuid;

/// Random string the snapshot command expects in its `rs` parameter.
const SNAPSHOT_RS: &str = "wuuPhkmUCeI9WG7C";
/// Snapshot dimensions requested from the device.
const SNAPSHOT_WIDTH: u32 = 640;
const SNAPSHOT_HEIGHT: u32 = 480;

/// Per call timeout used in place of a configured zero.
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("snapshot.jpg")
}

/// Camera configuration, holding what is needed to reach the device and
/// how the motion watch built on top of it should run. Immutable once
/// loaded, components borrow it.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct IpCameraConfig {
    /// Host (optionally with port) or full base URL of the camera.
    device_address: String,
    /// Account used for every command.
    username: String,
    /// Password of the account, empty on cameras left on default credentials.
    #[serde(default)]
    password: String,
    /// How long motion detection is polled for, in minutes.
    motion_duration_minutes: u64,
    /// Gap between two motion state checks, in seconds.
    motion_check_interval_seconds: u64,
    /// Upper bound for any single HTTP call to the device.
    #[serde(default = "default_request_timeout_seconds")]
    request_timeout_seconds: u64,
    /// Where the snapshot is written.
    #[serde(default = "default_snapshot_path")]
    snapshot_path: PathBuf,
}

impl IpCameraConfig {
    /// Create a new camera configuration polling for one minute at one
    /// second intervals.
    ///
    /// * `device_address`: host, host:port or base URL of the camera.
    /// * `username`: account on the device.
    /// * `password`: password of the account, can be empty.
    pub fn new(
        device_address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            device_address: device_address.into(),
            username: username.into(),
            password: password.into(),
            motion_duration_minutes: 1,
            motion_check_interval_seconds: 1,
            request_timeout_seconds: default_request_timeout_seconds(),
            snapshot_path: default_snapshot_path(),
        }
    }

    /// Set how long and how often motion detection is polled.
    ///
    /// * `duration_minutes`: length of the polling window.
    /// * `interval_seconds`: gap between checks.
    pub fn with_motion_window(mut self, duration_minutes: u64, interval_seconds: u64) -> Self {
        self.motion_duration_minutes = duration_minutes;
        self.motion_check_interval_seconds = interval_seconds;
        self
    }

    /// Set the per call timeout, rounded up to whole seconds.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        let partial = u64::from(timeout.subsec_nanos() > 0);
        self.request_timeout_seconds = timeout.as_secs().saturating_add(partial);
        self
    }

    /// Set where the snapshot is written.
    pub fn with_snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = path.into();
        self
    }

    /// Generates a camera config from a file, with `VIGIL_*` environment
    /// variables taking precedence over the file contents. The format
    /// follows the extension, json and yaml are both understood.
    ///
    /// * `filepath`: path to config file.
    pub fn from_file<F: AsRef<OsStr>>(filepath: F) -> Result<Self> {
        let file = Path::new(&filepath);
        if !file.is_file() {
            return Err(Error::ConfigNotFound(file.to_path_buf()));
        }

        let config_file = config::Config::builder()
            .add_source(config::File::from(file))
            .add_source(config::Environment::with_prefix("VIGIL").try_parsing(true))
            .build()?;

        Ok(config_file.try_deserialize::<IpCameraConfig>()?)
    }

    pub fn device_address(&self) -> &str {
        &self.device_address
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Length of the motion polling window.
    pub fn motion_duration(&self) -> Duration {
        Duration::from_secs(self.motion_duration_minutes.saturating_mul(60))
    }

    /// Gap between motion checks.
    pub fn motion_check_interval(&self) -> Duration {
        Duration::from_secs(self.motion_check_interval_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

/// Anything that can be asked for the current motion detection state.
/// Implementations never fail, a reading that could not be obtained is
/// reported as [`MotionState::Unknown`].
pub trait MotionSource: Send + Sync {
    fn motion_state(&self) -> impl Future<Output = MotionState> + Send;
}

/// A network camera reachable through its HTTP control endpoint. Each
/// device gets a UUID so log lines from several cameras can be told apart.
pub struct IpCamera {
    /// Unique identifier, helpful for trouble shooting and logging.
    uuid: Uuid,
    /// Scheme, host and port, without a trailing slash.
    base_url: String,
    username: String,
    password: String,
    /// HTTP client carrying the per call timeout.
    client: reqwest::Client,
}

impl IpCamera {
    /// Create a new camera handle from a config.
    ///
    /// * `config`: set of parameters describing the camera.
    pub fn new(config: &IpCameraConfig) -> Result<Self> {
        let timeout = config.request_timeout();
        let timeout = if timeout.is_zero() {
            tracing::warn!("Request timeout of zero raised to one second");
            MIN_REQUEST_TIMEOUT
        } else {
            timeout
        };
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            uuid: Uuid::new_v4(),
            base_url: base_url(&config.device_address),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    /// Create a camera handle by reading a config file.
    ///
    /// * `filepath`: path to the parameter file.
    pub fn from_config_file<F: AsRef<OsStr>>(filepath: F) -> Result<Self> {
        Self::new(&IpCameraConfig::from_file(filepath)?)
    }

    /// Return the unique identifier of the camera.
    pub fn get_uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post the login command and return the raw reply body.
    pub async fn login_raw(&self) -> Result<Vec<u8>> {
        let body = LoginRequest::new(&self.username, &self.password).body()?;

        tracing::debug!(camera = %self.uuid, url = %self.base_url, "Sending login");
        let response = self
            .client
            .post(format!("{}/api.cgi", self.base_url))
            .query(&[("cmd", "Login")])
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;

        Self::read_success(response, "Login").await
    }

    /// Fetch one still image, presenting the session token as a cookie.
    ///
    /// * `token`: session token name obtained through login.
    pub async fn snapshot_raw(&self, token: &str) -> Result<Vec<u8>> {
        let width = SNAPSHOT_WIDTH.to_string();
        let height = SNAPSHOT_HEIGHT.to_string();

        tracing::debug!(camera = %self.uuid, "Requesting snapshot");
        let response = self
            .client
            .get(format!("{}/cgi-bin/api.cgi", self.base_url))
            .query(&[
                ("cmd", "Snap"),
                ("channel", "0"),
                ("rs", SNAPSHOT_RS),
                ("user", self.username.as_str()),
                ("password", self.password.as_str()),
                ("width", width.as_str()),
                ("height", height.as_str()),
            ])
            .header(reqwest::header::COOKIE, format!("name={token}"))
            .send()
            .await?;

        Self::read_success(response, "Snap").await
    }

    /// Query the motion detection state, surfacing why a reading failed.
    pub async fn try_motion_state(&self) -> Result<MotionState> {
        let response = self
            .client
            .get(format!("{}/api.cgi", self.base_url))
            .query(&[
                ("cmd", "GetMdState"),
                ("user", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        let body = Self::read_success(response, "GetMdState").await?;
        let value = first_reply::<MotionStateValue>(&body)?
            .ok_or_else(|| malformed("GetMdState reply array was empty"))?
            .into_value()
            .map_err(malformed)?;

        Ok(MotionState::from_reported(value.state))
    }

    /// Check the status and read the whole body.
    async fn read_success(response: reqwest::Response, endpoint: &'static str) -> Result<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http { endpoint, status });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl MotionSource for IpCamera {
    /// Query the motion detection state. Any failure is logged and
    /// reported as `Unknown`.
    async fn motion_state(&self) -> MotionState {
        match self.try_motion_state().await {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(camera = %self.uuid, error = %e, "Motion state request failed");
                MotionState::Unknown
            }
        }
    }
}

/// Parse failure for a reply that is valid JSON but not a usable answer.
fn malformed<T: std::fmt::Display>(reason: T) -> Error {
    Error::Parse(<serde_json::Error as serde::de::Error>::custom(reason))
}

/// Normalise a configured address into a base URL. Bare hosts get the
/// `http` scheme the device serves its API on.
fn base_url(device_address: &str) -> String {
    let address = device_address.trim().trim_end_matches('/');
    if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}
