//! Lossy in-process link between a client and a server.
//!
//! `SimLink` plays the embedding application on the server side: it routes
//! init requests to [`OatServer::init`] and roll requests to
//! [`OatServer::roll`]. Scheduled faults drop a request before the server
//! sees it or drop the response after the server has committed.

use std::collections::VecDeque;

use oat_core::{MemoryKeyStore, OatError, OatServer, Transport, TransportError};
use oat_proto::{ClientId, InitRequest, SEPARATOR, SessionFields};
use tracing::trace;

use crate::SimEnv;

/// A fault applied to one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Deliver normally
    None,
    /// Lose the request; the server never sees it
    DropRequest,
    /// Lose the response; the server has already committed
    DropResponse,
}

/// What the server did with one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Request lost in transit
    RequestLost,
    /// Server initialized a client
    Initialized {
        /// New client
        client_id: ClientId,
    },
    /// Server rolled a client's api key
    Rolled {
        /// Rolled client
        client_id: ClientId,
        /// `false` for a resync
        valid: bool,
    },
    /// Server rejected the request
    Rejected {
        /// Error the server returned
        error: OatError,
    },
    /// Response lost in transit after the server handled the request
    ResponseLost,
}

/// In-process transport with scheduled faults.
pub struct SimLink {
    server: OatServer<SimEnv, MemoryKeyStore>,
    faults: VecDeque<Fault>,
    fields: SessionFields,
    events: Vec<LinkEvent>,
}

impl SimLink {
    /// Link to `server`. Deliveries succeed until faults are scheduled.
    pub fn new(server: OatServer<SimEnv, MemoryKeyStore>) -> Self {
        Self { server, faults: VecDeque::new(), fields: SessionFields::new(), events: Vec::new() }
    }

    /// Apply `fault` to the next delivery that has no fault scheduled.
    pub fn schedule(&mut self, fault: Fault) {
        self.faults.push_back(fault);
    }

    /// Session fields the server attaches to subsequent responses.
    pub fn set_response_fields(&mut self, fields: SessionFields) {
        self.fields = fields;
    }

    /// Every event so far, oldest first.
    pub fn events(&self) -> &[LinkEvent] {
        &self.events
    }

    /// Server behind the link.
    pub fn server(&self) -> &OatServer<SimEnv, MemoryKeyStore> {
        &self.server
    }

    fn handle(&mut self, request: &str) -> Result<String, OatError> {
        if request.contains(SEPARATOR) {
            let outcome = self.server.roll(request, &self.fields)?;
            self.events.push(LinkEvent::Rolled { client_id: outcome.client_id, valid: outcome.valid });
            Ok(outcome.token)
        } else {
            let init = InitRequest::decode(request)?;
            let issued = self.server.init(&init, &self.fields)?;
            self.events.push(LinkEvent::Initialized { client_id: issued.client_id });
            Ok(issued.token)
        }
    }
}

impl Transport for SimLink {
    fn send(&mut self, request: &str) -> Result<String, TransportError> {
        let fault = self.faults.pop_front().unwrap_or(Fault::None);
        trace!(?fault, "delivering request");

        if fault == Fault::DropRequest {
            self.events.push(LinkEvent::RequestLost);
            return Err(TransportError("request lost".into()));
        }

        let response = match self.handle(request) {
            Ok(response) => response,
            Err(error) => {
                let message = error.to_string();
                self.events.push(LinkEvent::Rejected { error });
                return Err(TransportError(message));
            },
        };

        if fault == Fault::DropResponse {
            self.events.push(LinkEvent::ResponseLost);
            return Err(TransportError("response lost".into()));
        }

        Ok(response)
    }
}
