//! Queue backend adapters.

pub mod mock_queue;
pub mod queue_api;

pub use mock_queue::MockQueueBackend;
pub use queue_api::QueueApiClient;
