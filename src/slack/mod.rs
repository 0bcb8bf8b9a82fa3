mod api;
mod api_types;
mod client;
mod types;

pub use api::SlackApi;
pub use client::SlackApiClient;
pub use types::{Actor, ChannelInfo};
