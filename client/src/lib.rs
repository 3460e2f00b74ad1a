mod api;
mod errors;
mod http;
pub mod learnhub_client_test;
mod rest;
mod types;

pub use api::LearningApi;
pub use errors::*;
pub use rest::{RestApi, RestApiOptions};
pub use types::*;
