//! Client for the DemocracyInAction (DIA/Salsa) CRM web service.
//!
//! ```no_run
//! use dia_api::{Client, Condition, GetQuery, Node};
//!
//! # async fn run() -> Result<(), dia_api::Error> {
//! let api = Client::builder()
//!     .username("user@example.org")
//!     .password("secret")
//!     .orgkey("962")
//!     .node(Node::Sandbox)
//!     .build()?;
//!
//! let groups = api.table("groups");
//! let warriors = groups
//!     .get(&GetQuery::new().with_condition(Condition::field("Group_Name", "Peaceful Warriors")))
//!     .await?;
//! # let _ = warriors;
//! # Ok(())
//! # }
//! ```

mod client;
mod errors;
mod nodes;
mod query;
mod table;
pub mod types;
mod xml;

pub use self::client::{Client, ClientBuilder};
pub use self::errors::Error;
pub use self::nodes::{Endpoint, EndpointSet, Node};
pub use self::query::{Condition, GetQuery, SaveRequest};
pub use self::table::Table;
