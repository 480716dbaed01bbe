//! A minimal client for the Mailchimp v3 API: ping, audience lookup and
//! member lookup/upsert against a configured default audience.
//!
//! ## Example
//!
//! ```no_run
//! use mailchimp_client::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("api-abcd1234", "us6").with_list_id("list-id");
//!     let client = Client::new(config)?;
//!
//!     let health = client.ping().await?;
//!     println!("{health}");
//!
//!     match client.get_member("jan@example.com").await? {
//!         Some(member) => println!("Member: {member}"),
//!         None => println!("No such member"),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::Client;
pub use config::Config;
pub use error::Error;
