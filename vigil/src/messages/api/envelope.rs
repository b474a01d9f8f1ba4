use serde::{de::DeserializeOwned, Deserialize};

/// Reply wrapper used by the camera for every command. The device always
/// answers with a JSON array of these, one per command in the request.
#[derive(Deserialize, Debug, PartialEq, Clone)]
pub struct Envelope<T> {
    /// Command the reply belongs to, e.g. `Login`.
    pub cmd: String,
    /// Zero on success.
    #[serde(default)]
    pub code: i64,
    /// Command specific payload, absent when the command failed.
    pub value: Option<T>,
    /// Failure detail, present instead of `value` when the command failed.
    pub error: Option<ApiError>,
}

/// Error record the device places in an envelope when a command fails.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct ApiError {
    /// Device specific response code.
    #[serde(rename = "rspCode", default)]
    pub rsp_code: i64,
    /// Short description, e.g. `login failed`.
    #[serde(default)]
    pub detail: String,
}

impl<T> Envelope<T> {
    /// Consume the envelope returning the payload, or a description of
    /// why there is none.
    pub fn into_value(self) -> Result<T, String> {
        match (self.value, self.error) {
            (Some(value), _) => Ok(value),
            (None, Some(error)) => Err(format!(
                "{} failed with code {} ({}): {}",
                self.cmd, self.code, error.rsp_code, error.detail
            )),
            (None, None) => Err(format!("{} reply carried no value", self.cmd)),
        }
    }
}

/// Decode a reply array and return its first envelope. An empty array is
/// not an error at this level, callers decide what it means.
pub fn first_reply<T: DeserializeOwned>(body: &[u8]) -> serde_json::Result<Option<Envelope<T>>> {
    let replies: Vec<Envelope<T>> = serde_json::from_slice(body)?;
    Ok(replies.into_iter().next())
}
