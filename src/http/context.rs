//! Per-request context.
//!
//! Owns the request's handler chain, the decorated request and the
//! response for one request; never shared across requests.

use crate::http::handler::{Handler, Next};
use crate::http::request::Request;
use crate::http::response::Response;

#[derive(Debug)]
pub struct RequestContext {
    chain: Next,
    request: Request,
    response: Response,
}

impl RequestContext {
    pub fn new(handlers: Vec<Handler>, request: Request, response: Response) -> Self {
        Self {
            chain: Next::new(handlers),
            request,
            response,
        }
    }

    /// Run the chain from its head and hand back the response.
    pub fn run(mut self) -> Response {
        self.chain.run(&mut self.response, &mut self.request);
        self.response
    }
}
