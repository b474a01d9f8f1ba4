/// Devices are the atomic units that components are built from.
/// Their core responsibilities do not change based on location,
/// name etc.
pub mod hardware {
    /// Device interface for network cameras speaking the HTTP
    /// control API.
    pub mod camera;
}
