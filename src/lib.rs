//! Workspace-level tooling package. Carries the pre-commit hook configuration
//! and has no code of its own; see the crates under `crates/`.
