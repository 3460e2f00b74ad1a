//! Test doubles for the LearnHub API surface.

mod model;

pub use model::{MockApi, MockCall, MockResult};
