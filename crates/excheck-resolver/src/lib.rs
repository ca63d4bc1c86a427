//! Fixed-point configuration resolver.
//!
//! This crate computes, for every program element and every expression, a
//! recursive [`Configuration`] describing what evaluating the thing may
//! throw right now, what invoking the resulting value may throw, and what
//! awaiting it may throw. Configurations come from four sources combined
//! with fixed precedence: an external override table, explicit
//! annotations, type-derived information, and inference over bodies and
//! initializers, intersected with inherited configurations from overridden
//! members.
//!
//! The element/expression graph is cyclic (mutually recursive methods,
//! getters returning calls of each other), so evaluation is a fixed-point
//! computation: memo tables, a dependents graph, a dirty set, and a settle
//! loop that re-runs dependents until nothing changes. See
//! [`ResolverSession`].

pub mod throws;
pub use throws::Throws;

pub mod configuration;
pub use configuration::{Configuration, PromotionKind, PromotionMap};

pub mod lattice;
pub use lattice::{intersect, union};

pub mod annotations;
pub use annotations::{AnnotationSummary, declared_throws, read_annotations};

pub mod type_config;
pub use type_config::type_configuration;

pub mod throw_finder;

pub mod expr_config;

pub mod element_config;
pub use element_config::{adapt, equivalent_annotation_configuration};

pub mod inheritance;

pub mod overrides;
pub use overrides::OverrideTable;

pub mod session;
pub use session::{CancellationToken, ResolverSession, SessionStats};
