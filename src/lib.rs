//! Grove: simulation core of a tree-keeping game.
//!
//! `session::Session` owns the world and is the only entry point a front end
//! needs. `gardener` is a scripted player for headless runs.

pub mod config;
pub mod ecs;
pub mod gardener;
pub mod session;
pub mod tree;
