//! # apiconfig
//!
//! Pure Rust model of a Berkshelf API server's configuration.
//!
//! - [`EndpointDeclaration`]: one upstream source (community site, chef
//!   server, GitHub organization, or the local chef client's server)
//! - [`assemble`]: merges enabled endpoints with global and per-server
//!   override maps into the config.json document
//! - [`version`]: decides whether a requested version is a release or a
//!   git revision to build from source
//! - [`staleness`]: decides whether `bundle install` has to run
//!
//! Nothing in this crate touches the target system beyond reading file
//! metadata; writing the document is left to the caller.

pub mod assemble;
pub mod endpoint;
pub mod error;
pub mod staleness;
pub mod version;

pub use assemble::{ENDPOINTS_KEY, assemble, render};
pub use endpoint::{
    ChefClient, Contribution, DEFAULT_COMMUNITY_URL, EndpointDeclaration, EndpointDefaults,
    EndpointKind,
};
pub use error::{Error, Result};
pub use staleness::Staleness;
pub use version::install_from_source;
