use serde::{Deserialize, Serialize};

/// Login command sent to the camera. The device expects a JSON array
/// holding one of these, posted as `text/plain`.
#[derive(Serialize, Debug, PartialEq)]
pub struct LoginRequest<'a> {
    cmd: &'static str,
    param: LoginParam<'a>,
}

#[derive(Serialize, Debug, PartialEq)]
struct LoginParam<'a> {
    #[serde(rename = "User")]
    user: LoginUser<'a>,
}

#[derive(Serialize, Debug, PartialEq)]
struct LoginUser<'a> {
    #[serde(rename = "Version")]
    version: &'static str,
    #[serde(rename = "userName")]
    user_name: &'a str,
    /// May be empty, cameras on default credentials have no password.
    password: &'a str,
}

impl<'a> LoginRequest<'a> {
    /// Create a login command for the given credentials.
    ///
    /// * `user_name`: account on the device.
    /// * `password`: password for the account, can be empty.
    pub fn new(user_name: &'a str, password: &'a str) -> Self {
        Self {
            cmd: "Login",
            param: LoginParam {
                user: LoginUser {
                    version: "0",
                    user_name,
                    password,
                },
            },
        }
    }

    /// Render the request body, the single command wrapped in an array.
    pub fn body(&self) -> serde_json::Result<String> {
        serde_json::to_string(&[self])
    }
}

/// Payload of a successful login reply.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TokenValue {
    #[serde(rename = "Token")]
    pub token: TokenRecord,
}

/// Session token as issued by the device.
#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct TokenRecord {
    /// Seconds the device keeps the token alive.
    #[serde(rename = "leaseTime", default)]
    pub lease_time: u64,
    /// Opaque token presented on subsequent calls.
    pub name: String,
}
