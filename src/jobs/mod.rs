//! Asynchronous job tracking

pub mod poller;

pub use poller::JobPoller;
