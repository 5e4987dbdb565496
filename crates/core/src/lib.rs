//! marmot: a driver-agnostic session engine for driving web applications
//! in tests.
//!
//! A [`Session`] gives test code one API — navigate, query, fill in forms,
//! click — regardless of which backend renders the page. Backends plug in
//! through the [`Driver`] capability contract and are looked up by name in
//! a [`DriverRegistry`] at session construction time.
//!
//! Pages are captured as immutable [`DocumentSnapshot`]s. Queries resolve
//! selectors (CSS, an XPath subset, or semantic locators like "the field
//! labelled City") against the current snapshot, wrapped in a bounded
//! retry loop: elements that have not appeared yet are retried until the
//! wait budget runs out, and backends that report a live, script-mutable
//! DOM are re-fetched on every poll.
//!
//! # Examples
//!
//! ## Registering a driver and driving a form
//!
//! ```ignore
//! use marmot::{DriverRegistry, Session, SessionConfig};
//!
//! DriverRegistry::global().register("rack", |config| {
//!     Ok(Box::new(MyHttpDriver::new(config)?) as Box<dyn marmot::Driver>)
//! });
//!
//! let session = Session::new("rack", SessionConfig::default())?;
//! session.visit("/form").await?;
//!
//! // Semantic locators: id, name, label text, or placeholder.
//! session.fill_in("address1_city", "Paris").await?;
//! session.select("France", "address1_country").await?;
//! session.click_button("awesome").await?;
//!
//! assert_eq!(session.current_path().as_deref(), Some("/form"));
//! ```
//!
//! ## Querying with wait semantics
//!
//! ```ignore
//! use marmot::Selector;
//!
//! // Retries until the element appears or the wait budget runs out.
//! let heading = session.find(Selector::xpath(".//h1")).await?;
//! assert_eq!(heading.text().await?, "This is a test");
//!
//! // Predicates use a shorter budget and never raise on absence.
//! assert!(session.has_css("#results").await?);
//! assert!(session.has_no_selector(Selector::css(".spinner")).await?);
//! ```
//!
//! ## Scoped queries
//!
//! ```ignore
//! session
//!     .within("#signup", |s| async move {
//!         s.fill_in("Email", "user@example.com").await?;
//!         s.click_button("Register").await
//!     })
//!     .await?;
//! ```

pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod node;
pub mod query;
pub mod session;
pub mod wait;

mod xpath;

pub use config::SessionConfig;
pub use document::DocumentSnapshot;
pub use driver::{Driver, DriverFactory, DriverRegistry};
pub use error::{Error, Result};
pub use node::NodeHandle;
pub use session::Session;
pub use wait::Wait;

// Re-export the driver contract types for convenience.
pub use marmot_protocol as protocol;
pub use marmot_protocol::{
    Action, Capabilities, ControlKind, FindOptions, NodeData, NodePath, Selector, SemanticQuery,
};
