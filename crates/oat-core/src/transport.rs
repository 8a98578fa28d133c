//! Client-side request delivery.
//!
//! The engines never perform I/O themselves. A [`Transport`] hands a request
//! string to the server (HTTP header, extension message, in-process call)
//! and returns the server's reply.

use crate::error::TransportError;

/// Delivers one request and returns the response.
///
/// An abandoned or failed delivery must return `Err`; the client then keeps
/// its previous token and the next roll takes the resync path.
pub trait Transport {
    /// Send `request` and wait for the reply.
    fn send(&mut self, request: &str) -> Result<String, TransportError>;
}

impl<F> Transport for F
where
    F: FnMut(&str) -> Result<String, TransportError>,
{
    fn send(&mut self, request: &str) -> Result<String, TransportError> {
        self(request)
    }
}
