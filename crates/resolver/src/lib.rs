#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package resolution and multi-architecture lock unification
//!
//! Resolution itself is delegated to a [`PackageResolver`] implementation,
//! invoked once per target architecture and concurrently by [`resolve_all`].
//! The per-architecture results are then folded by [`unify`] into one
//! package list that pins every package to a version usable on all
//! architectures, with diagnostics for the ones that cannot be pinned.

mod fanout;
mod provides;
mod recorded;
mod resolver;
pub mod unify;

pub use fanout::resolve_all;
pub use provides::{capability_name, clean_provides};
pub use recorded::RecordedResolver;
pub use resolver::{PackageResolver, ResolveRequest};
pub use unify::{unify, Unified, UnifiedState};
