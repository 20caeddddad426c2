// Core modules implementing the library service, latency simulation, and errors.
pub mod error;
pub mod latency;
pub mod library;
