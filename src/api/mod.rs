pub mod client;

pub use client::{ApiClient, HttpReply, PageSource};
