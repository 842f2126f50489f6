//! Request and response types for the layout API

pub mod request;
pub mod response;

pub use request::LayoutRequest;
pub use response::{LabeledPoint, LayoutResponse};
