//! Workspace root crate.
//!
//! Carries no runtime code of its own — it exists so the end-to-end scenario
//! tests under `tests/` can depend on every published crate in this workspace
//! the way an external integrator would, rather than reaching into internals.
