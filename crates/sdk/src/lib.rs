//! Facebatch SDK - Rust Client Library
//!
//! Submit face-swap tasks to a running `facebatchd` and poll them to completion.
//!
//! # Example
//!
//! ```no_run
//! use facebatch_sdk::{FacebatchClient, TaskOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FacebatchClient::connect("http://127.0.0.1:9527").await?;
//!
//!     let options = TaskOptions {
//!         keep_audio: Some(false),
//!         ..Default::default()
//!     };
//!     let task = client.submit("face.png", "clip.mp4", Some(options)).await?;
//!
//!     let done = client
//!         .wait_for_terminal(&task.task_id, Duration::from_secs(2), Duration::from_secs(3600))
//!         .await?;
//!     println!("{:?}: {:?}", done.status, done.output_filename);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::FacebatchClient;
pub use error::{code, Result, SdkError};
pub use types::{
    FetchResponse, ResourceView, StatsResponse, StatusResponse, SubmitResponse, TaskCounts,
    TaskOptions, TaskStatus,
};
