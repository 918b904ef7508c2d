//! Shared fakes for client integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use doomsday_client::{
    ApiRequest, ApiResponse, ApiTransport, Completion, SessionClient, TransportFailure,
};

/// Transport that answers requests synchronously from a FIFO script.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<ApiResponse, TransportFailure>>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    /// Queues one reply.
    #[allow(dead_code)]
    pub fn reply(&self, reply: Result<ApiResponse, TransportFailure>) {
        self.replies.borrow_mut().push_back(reply);
    }

    /// Queues a response with `status` and `body`.
    #[allow(dead_code)]
    pub fn respond(&self, status: u16, body: &str) {
        self.reply(Ok(ApiResponse::new(status, body)));
    }

    /// Requests seen so far.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }
}

impl ApiTransport for ScriptedTransport {
    fn send(&self, request: ApiRequest, on_complete: Completion) {
        self.requests.borrow_mut().push(request);
        let reply = self
            .replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportFailure("no scripted reply".to_string())));
        on_complete(reply);
    }
}

/// Builds a client over a fresh scripted transport.
pub fn scripted_client() -> (SessionClient, Rc<ScriptedTransport>) {
    let transport = Rc::new(ScriptedTransport::default());
    let client = SessionClient::new("https://doomsday.example.test", transport.clone())
        .expect("client should build");
    (client, transport)
}

/// Captures a callback result for later assertions.
pub fn capture<T: 'static>() -> (Rc<RefCell<Option<T>>>, impl FnOnce(T) + 'static) {
    let slot = Rc::new(RefCell::new(None));
    let writer = Rc::clone(&slot);
    (slot, move |value| *writer.borrow_mut() = Some(value))
}
