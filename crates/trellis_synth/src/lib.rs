//! # trellis_synth
//!
//! Validation aggregation and deployment document synthesis for Trellis.
//!
//! This crate consumes a construct tree built with `trellis_core` and
//! produces the flat, fully-resolved document the external provisioning
//! engine deploys: validation runs first and collects every self-check
//! failure; synthesis then allocates logical ids and reduces every
//! deferred value to a literal or a tagged reference expression.
//!
//! # Architecture
//!
//! - **Validator**: post-order walk collecting all self-check failures
//! - **Resolver**: recursive token resolution with per-chain cycle guard
//! - **Document**: the logical-id-keyed output mapping and its JSON writer
//! - **Synthesizer**: the pass tying the three together
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{ConstructTree, GenericResource, PropValue};
//! use trellis_synth::Synthesizer;
//!
//! let mut tree = ConstructTree::new();
//! let cluster = tree.add_resource(
//!     tree.root(),
//!     "Cluster",
//!     Box::new(GenericResource::new("container/cluster")),
//! ).unwrap();
//! tree.add_resource(
//!     tree.root(),
//!     "Service",
//!     Box::new(GenericResource::new("container/service")
//!         .with_property("cluster", PropValue::Ref(cluster))),
//! ).unwrap();
//!
//! let document = Synthesizer::synthesize(&tree).unwrap();
//! assert_eq!(document.get("Service").unwrap().properties["cluster"].as_ref_id(), Some("Cluster"));
//! ```

pub mod document;
pub mod error;
pub mod resolver;
pub mod synthesizer;
pub mod validator;

// Re-export main types for convenience
pub use document::{OutputDocument, RefExpr, ResolvedValue, ResourceEntry, DOCUMENT_FILE_NAME};
pub use error::{SynthError, SynthResult};
pub use resolver::TokenResolver;
pub use synthesizer::Synthesizer;
pub use validator::{TreeValidator, ValidationReport};
