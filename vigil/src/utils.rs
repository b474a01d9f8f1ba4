/// Tracing subscriber set up for binaries.
pub mod logging;
/// In process stand in for a camera's HTTP control endpoint.
#[cfg(test)]
pub mod mock_camera;
