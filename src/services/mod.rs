/// Serial execution of mutating venue backend calls.
pub mod command_queue;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Once-per-second stopwatch broadcast of the running match.
pub mod match_clock;
/// Match lifecycle: start, end, close and match type.
pub mod match_service;
/// Periodic refresh of the queue mirror and degraded flag.
pub mod queue_poller;
/// Queue mirror operations mirrored to the venue backend.
pub mod queue_service;
/// Result validation and submission.
pub mod result_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Page configuration and admin mode.
pub mod view_service;
