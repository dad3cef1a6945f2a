//! The provider capability, its registry, and the public-model resolver.
//!
//! Concrete upstream adapters (Cloud-Code-style Gemini/Claude, Z.AI, the
//! Antigravity account pool) are out of scope — this module only specifies
//! the interface they implement and the lookup structures that route
//! requests to them.

pub mod registry;
pub mod resolver;
pub mod traits;

pub use registry::ProviderRegistry;
pub use resolver::{Resolved, resolve};
pub use traits::{EventStream, Provider, ProviderStatus};
