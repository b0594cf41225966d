//! # trellis_core
//!
//! Construct tree and deferred value substrate for Trellis.
//!
//! Application code declares a tree of logical resources; this crate owns
//! the tree model, the placeholder values that stand in for runtime-assigned
//! outputs, and the identity allocation that turns tree paths into stable,
//! deploy-system-safe logical ids. Synthesis of the resolved deployment
//! document lives in `trellis_synth`.
//!
//! # Architecture
//!
//! - **Tree**: arena-owned construct nodes addressed by copyable handles
//! - **Values**: literal-or-deferred property values ("tokens")
//! - **Naming**: deterministic, collision-resistant logical id allocation
//! - **Physical names**: pinned or engine-assigned resource names
//! - **Resources**: the capability trait concrete resource kinds implement
//! - **Registry**: one-shared-instance-per-scope construct cache
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{ConstructTree, GenericResource, PhysicalName, PropValue};
//!
//! let mut tree = ConstructTree::new();
//! let cluster = tree.add_resource(
//!     tree.root(),
//!     "Cluster",
//!     Box::new(GenericResource::new("container/cluster")),
//! ).unwrap();
//!
//! let service = GenericResource::new("container/service")
//!     .with_physical_name(PhysicalName::named("my-service"))
//!     .with_property("cluster", PropValue::Ref(cluster));
//! tree.add_resource(tree.root(), "Service", Box::new(service)).unwrap();
//! ```

pub mod error;
pub mod naming;
pub mod physical;
pub mod registry;
pub mod resource;
pub mod tree;
pub mod value;

// Re-export main types for convenience
pub use error::{CoreError, CoreResult};
pub use naming::{IdAllocator, MAX_ID_LEN};
pub use physical::PhysicalName;
pub use registry::ScopeRegistry;
pub use resource::{GenericResource, ResourceKind};
pub use tree::{ConstructNode, ConstructTree, NodeId};
pub use value::PropValue;
