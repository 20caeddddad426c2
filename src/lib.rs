//! Purpose: Shared library crate used by the `bookshelf` CLI, server, and tests.
//! Exports: `core` (library service, latency, errors) and `api` (public surface + client).
//! Role: Keeps request validation independent of the HTTP transport.
//! Invariants: Service state is an owned `Library` value; there is no global state.
pub mod api;
pub mod core;
