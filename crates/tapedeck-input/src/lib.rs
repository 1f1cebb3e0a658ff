//! Audio input devices for tapedeck.
//!
//! - [`list_input_devices`] / [`InputDeviceInfo`]: enumeration
//! - [`InputStream`]: a running CPAL capture stream that feeds the render
//!   domain through a [`tapedeck_core::InputFeed`]

pub mod error;
pub use error::{Error, Result};

mod device;
pub use device::{list_input_devices, InputDeviceInfo};

mod stream;
pub use stream::InputStream;
