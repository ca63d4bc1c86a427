//! Centralized limits and thresholds for the configuration resolver.
//!
//! Centralizing these values prevents duplicate definitions with
//! inconsistent values and documents the rationale for each limit.

/// Maximum number of settle-loop iterations per session request.
///
/// The configuration lattice has finite height per program (antichains are
/// bounded by the declared type universe, value-slot depth by type
/// nesting), so the loop terminates on well-formed input. The cap guards
/// resolver bugs: when exceeded the session logs a warning and serves the
/// last computed state rather than spinning.
pub const MAX_SETTLE_ITERATIONS: u32 = 1_000;

/// Maximum promotion depth (`invoke`/`await` nesting) the lattice
/// operations recurse into.
///
/// Typed code never exceeds a handful of layers (a future of a function of
/// a future...); at this depth the operations treat the inner slot as
/// empty. Prevents stack overflow on pathological hand-built
/// configurations.
pub const MAX_PROMOTION_DEPTH: u32 = 64;

/// Maximum supertype-walk queue length for the inherited-configuration
/// breadth-first search.
///
/// Class hierarchies are shallow in practice; this bounds malformed cyclic
/// hierarchies fed in by a host without its own cycle check.
pub const MAX_SUPERTYPE_QUEUE: usize = 4_096;
