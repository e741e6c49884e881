//! Process specifications and the validated store that owns them.
//!
//! A [`ProcessSpec`] describes one supervised process declaratively: what
//! to run, where, with which environment, how many instances, and under
//! which restart/memory/log policies. Specs are built with
//! [`ProcessSpec::builder`], validated in a batch by [`SpecStore::load`],
//! and immutable afterwards.

mod process;
mod store;

pub use process::{ExecMode, LogPaths, ProcessSpec, ProcessSpecBuilder, ReadyPolicy};
pub use store::SpecStore;
