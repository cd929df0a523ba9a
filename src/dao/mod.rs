/// Models exchanged with the remote venue backend.
pub mod models;
/// Backend-agnostic error type for remote calls.
pub mod remote;
/// Access to the venue backend holding the authoritative queue.
pub mod venue_api;
