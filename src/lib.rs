//! # Armory XML API Client
//!
//! An async Rust client library for the World of Warcraft Armory XML service.
//!
//! The Armory exposes character sheets, guild rosters, items and arena teams as
//! XML documents. This library turns typed queries into requests against the
//! right regional host, optionally memoizes raw responses on disk, checks each
//! response for the service's embedded error codes and builds typed values
//! from what remains.
//!
//! ## Features
//!
//! - **Region routing**: `eu` locales go to the EU Armory, everything else to the US
//! - **Response cache**: optional, permanent, file-backed, safe under concurrent writers
//! - **Error Handling**: one error per service error code plus transport and parse failures
//! - **Retry**: bounded, opt-in back-off for network errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use armory_xml::{ArmoryClient, ClientDefaults, QueryOptions, SearchType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ArmoryClient::new(ClientDefaults {
//!         realm: Some("Draenor".to_string()),
//!         locale: Some("eu".to_string()),
//!         ..Default::default()
//!     })?;
//!
//!     let sheet = client
//!         .get_character_sheet(QueryOptions::new().character_name("Thrall"))
//!         .await?;
//!     println!("{} - level {:?}", sheet.character.name, sheet.character.level);
//!
//!     let results = client.search("Thunderfury", SearchType::Item).await?;
//!     println!("{} items found", results.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod query;
pub mod region;
pub mod transport;
pub mod types;
pub mod xml;

pub use client::{ArmoryClient, ArmoryClientConfig};
pub use error::{ArmoryError, Result};
pub use query::{ClientDefaults, Endpoint, QueryOptions};
pub use region::Region;
pub use types::{
    ArenaTeam, Character, CharacterClass, CharacterSheet, Gender, Guild, ItemInfo, ItemTooltip,
    Race, ResultKind, SearchItem, SearchResults, SearchType,
};
pub use xml::XmlNode;

/// Base URL of the US Armory
pub const DEFAULT_US_BASE_URL: &str = "http://www.wowarmory.com/";

/// Base URL of the EU Armory
pub const DEFAULT_EU_BASE_URL: &str = "http://eu.wowarmory.com/";

/// The Armory only serves XML to browser user agents
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 Gecko/20070219 Firefox/2.0.0.2";

/// Default response cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = "cache/";
