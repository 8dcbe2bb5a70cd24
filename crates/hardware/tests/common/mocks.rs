//! `mockall` doubles for the hierarchy's collaborators.

use cachesim_core::common::{Request, Response};
use cachesim_core::soc::BackingStore;
use cachesim_core::stats::MemoryCounters;
use mockall::mock;

mock! {
    pub Store {}
    impl BackingStore for Store {
        fn accept_request(&mut self, request: Request) -> Response;
        fn counters(&self) -> MemoryCounters;
        fn reset(&mut self);
    }
}

/// The answer a well-behaved backing store gives.
pub fn ready(request: Request) -> Response {
    Response::ready(request.address)
}
