/// Components built on a single network camera.
pub mod camera {
    /// Login and session token handling.
    pub mod session;
    /// One shot still image capture.
    pub mod snapshot;
    /// Time boxed, cancellable motion detection polling.
    pub mod motion_poller;
}

/// Helpful prelude when working with components.
pub mod prelude {
    pub use crate::components::camera::motion_poller::*;
    pub use crate::components::camera::session::*;
    pub use crate::components::camera::snapshot::*;
}
