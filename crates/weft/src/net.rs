//! Network request wrapper.
//!
//! The core only depends on receiving an eventual success or failure; the
//! transport itself sits behind a trait so callers (and tests) supply the
//! wire mechanics. Success and fail handlers occupy single registration
//! slots and fire once per dispatched request, for every request the client
//! dispatches. No retry, no timeout, no cancellation.

use serde_json::Value;
use thiserror::Error;

/// Request verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: Verb,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    Failed(String),
}

/// Wire mechanics behind the client. A response may be produced whenever
/// the transport sees fit; the core tolerates store mutations driven by it
/// at any later point.
pub trait Transport {
    fn send(&mut self, request: Request) -> Result<Response, TransportError>;
}

/// Terminal state of one dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetOutcome {
    Success(Response),
    Failure(String),
}

type SuccessHandler = Box<dyn FnMut(&Response)>;
type FailHandler = Box<dyn FnMut()>;

/// Request wrapper over a [`Transport`].
pub struct NetworkClient<T: Transport> {
    transport: T,
    success: Option<SuccessHandler>,
    fail: Option<FailHandler>,
}

impl<T: Transport> NetworkClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            success: None,
            fail: None,
        }
    }

    /// Register the success handler. A later registration replaces an
    /// earlier one; the handler stays armed across dispatches.
    pub fn on_success<F>(&mut self, handler: F)
    where
        F: FnMut(&Response) + 'static,
    {
        self.success = Some(Box::new(handler));
    }

    pub fn on_fail<F>(&mut self, handler: F)
    where
        F: FnMut() + 'static,
    {
        self.fail = Some(Box::new(handler));
    }

    pub fn get(&mut self, url: &str, data: Option<Value>) -> NetOutcome {
        self.dispatch(Verb::Get, url, data)
    }

    pub fn post(&mut self, url: &str, data: Option<Value>) -> NetOutcome {
        self.dispatch(Verb::Post, url, data)
    }

    pub fn put(&mut self, url: &str, data: Option<Value>) -> NetOutcome {
        self.dispatch(Verb::Put, url, data)
    }

    pub fn delete(&mut self, url: &str, data: Option<Value>) -> NetOutcome {
        self.dispatch(Verb::Delete, url, data)
    }

    /// Send one request and deliver the outcome to the registered handlers.
    pub fn dispatch(&mut self, verb: Verb, url: &str, data: Option<Value>) -> NetOutcome {
        let body = data.as_ref().map(|value| value.to_string());
        let request = Request {
            verb,
            url: url.to_owned(),
            headers: vec![(
                "Content-Type".to_owned(),
                "application/json;charset=utf-8".to_owned(),
            )],
            body,
        };
        match self.transport.send(request) {
            Ok(response) if response.is_success() => {
                if let Some(handler) = self.success.as_mut() {
                    handler(&response);
                }
                NetOutcome::Success(response)
            }
            Ok(response) => {
                if let Some(handler) = self.fail.as_mut() {
                    handler();
                }
                NetOutcome::Failure(format!("status {}", response.status))
            }
            Err(error) => {
                if let Some(handler) = self.fail.as_mut() {
                    handler();
                }
                NetOutcome::Failure(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// In-memory transport returning a canned result per call.
    struct FakeTransport {
        result: Result<Response, TransportError>,
        seen: Vec<Request>,
    }

    impl FakeTransport {
        fn ok(status: u16, body: &str) -> Self {
            Self {
                result: Ok(Response {
                    status,
                    body: body.to_owned(),
                }),
                seen: Vec::new(),
            }
        }
    }

    impl Transport for &mut FakeTransport {
        fn send(&mut self, request: Request) -> Result<Response, TransportError> {
            self.seen.push(request);
            self.result.clone()
        }
    }

    #[test]
    fn success_handler_fires_on_every_dispatch() {
        let mut transport = FakeTransport::ok(200, "done");
        let mut client = NetworkClient::new(&mut transport);
        let fired = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&fired);
        client.on_success(move |response| {
            assert_eq!(response.body, "done");
            *counter.borrow_mut() += 1;
        });
        assert!(matches!(client.get("/api", None), NetOutcome::Success(_)));
        assert!(matches!(client.get("/api", None), NetOutcome::Success(_)));
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn non_200_status_is_a_failure() {
        let mut transport = FakeTransport::ok(404, "");
        let mut client = NetworkClient::new(&mut transport);
        let failed = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&failed);
        client.on_fail(move || *flag.borrow_mut() = true);
        assert!(matches!(client.get("/missing", None), NetOutcome::Failure(_)));
        assert!(*failed.borrow());
    }

    #[test]
    fn post_serializes_the_body_and_sets_the_content_type() {
        let mut transport = FakeTransport::ok(200, "");
        {
            let mut client = NetworkClient::new(&mut transport);
            client.post("/save", Some(json!({"a": 1})));
        }
        let request = &transport.seen[0];
        assert_eq!(request.verb, Verb::Post);
        assert_eq!(request.body.as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(
            request.headers[0],
            (
                "Content-Type".to_owned(),
                "application/json;charset=utf-8".to_owned()
            )
        );
    }

    #[test]
    fn transport_errors_reach_the_fail_handler() {
        let mut transport = FakeTransport::ok(200, "");
        transport.result = Err(TransportError::Unavailable("offline".to_owned()));
        let mut client = NetworkClient::new(&mut transport);
        let failed = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&failed);
        client.on_fail(move || *flag.borrow_mut() = true);
        let outcome = client.delete("/x", None);
        assert_eq!(
            outcome,
            NetOutcome::Failure("transport unavailable: offline".to_owned())
        );
        assert!(*failed.borrow());
    }
}
