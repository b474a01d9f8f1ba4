/**
The vigil control system talks to network cameras over their HTTP control API.
Following the same split as the other control systems, devices wrap a single
piece of hardware, components compose devices into something that performs a
function, and binaries under `systems/` wire components together.
*/

/// Components in the system are created by grouping together
/// devices into a logical unit that performs some function
/// for the overall control system.
pub mod components;
/// Devices that are an atomic unit, and can be composed
/// with other devices into components to perform some function.
pub mod devices;
/// Failures shared by devices and components.
pub mod error;
/// Message structure for communication with the devices, such as
/// the JSON envelopes of the camera control API.
pub mod messages;
/// Development utilities for logging and tests.
pub mod utils;
