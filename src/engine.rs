//! Locating the external capture and analysis engine (`tshark`).

pub mod locator;

pub use locator::locate;
