//! Resolve routing keys to registered handlers.
//!
//! Resolution semantics:
//! 1. The registry is populated once at startup with key → factory bindings
//! 2. First lookup of a key runs its factory
//! 3. Success and failure are both cached under the key, so a failing key
//!    never re-attempts its load
//! 4. Keys with no registration cache a NotFound error
//!
//! Resolution only locates the handler; it never invokes it.

pub mod error;
pub mod handler;
pub mod resolve;

pub use {
    error::{Error, Result},
    handler::{Handler, HandlerContext},
    resolve::{HandlerFactory, HandlerRegistry, Resolver},
};
