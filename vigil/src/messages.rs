/// Standardise how replies from the camera control endpoint are
/// decoded. Every command answers with the same envelope shape,
/// only the `value` payload differs. Provide test suite to
/// ensure the device interface is respected.
pub mod api {
    /// Reply envelope shared by every command.
    pub mod envelope;
    /// Login request body and the session token reply.
    pub mod login;
    /// Motion detection state reply and its classification.
    pub mod motion;
}
