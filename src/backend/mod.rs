pub mod api;
pub mod client;
pub mod wire;

pub use api::HrApi;
pub use client::BackendClient;
