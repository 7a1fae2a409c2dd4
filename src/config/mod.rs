//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HarnessConfig (validated, immutable)
//!     → CLI arguments override the role's section
//!     → handed by value to the role being started
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a balancer's backend set changes only
//!   through the wire protocol, never through the file
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AdvisorConfig;
pub use schema::HarnessConfig;
pub use schema::ListenerConfig;
pub use schema::LoadBalancerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use schema::ServiceConfig;
pub use schema::SourceConfig;
pub use schema::TimeoutConfig;
