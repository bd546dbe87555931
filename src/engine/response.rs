//! Buffered response
//!
//! Modules write status, headers and body into this buffer instead of a
//! live connection; the HTTP surface relays it onto the wire afterwards.
//! Once ended, a response is immutable.

/// A buffered HTTP response
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    ended: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
            ended: false,
        }
    }
}

impl Response {
    /// Create a new empty response
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response header. Ignored once the response has ended.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.ended {
            return;
        }
        self.headers.push((name.into(), value.into()));
    }

    /// Write the status code. Ignored once the response has ended.
    pub fn write_head(&mut self, status: u16) {
        if self.ended {
            return;
        }
        self.status = status;
    }

    /// End the response with a body. Ignored once the response has ended.
    pub fn end(&mut self, body: impl Into<Vec<u8>>) {
        if self.ended {
            return;
        }
        self.body = body.into();
        self.ended = true;
    }

    /// Whether the response has been ended
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Headers, in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the response, returning the body bytes
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}
