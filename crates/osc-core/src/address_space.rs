//! Address space: pattern registration and message dispatch
//!
//! Methods are held in an immutable snapshot behind a read-write lock.
//! Registration clones the list (copy-on-write) and swaps it in; dispatch
//! takes the current snapshot and runs handlers without holding the lock, so
//! a handler may itself register new methods.

use crate::address::Pattern;
use crate::{Message, Packet, Result};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Handler invoked for every message whose address matches
pub type MethodHandler = Arc<dyn Fn(&Message) + Send + Sync>;

/// A registered address pattern and its handler
#[derive(Clone)]
pub struct Method {
    pattern: Pattern,
    handler: MethodHandler,
}

impl Method {
    /// The pattern as registered
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn matches(&self, address: &str) -> bool {
        self.pattern.matches(address)
    }

    pub fn invoke(&self, message: &Message) {
        (self.handler)(message)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Registry of OSC methods
#[derive(Default)]
pub struct AddressSpace {
    methods: RwLock<Arc<Vec<Method>>>,
}

impl AddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every address matching `pattern`
    ///
    /// The pattern is compiled here, once. Methods are dispatched in
    /// registration order.
    pub fn handle<F>(&self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        let method = Method {
            pattern: Pattern::compile(pattern)?,
            handler: Arc::new(handler),
        };

        let mut methods = self.methods.write();
        Arc::make_mut(&mut methods).push(method);
        debug!("Registered OSC method {} ({} total)", pattern, methods.len());
        Ok(())
    }

    /// Consistent view of the registered methods
    pub fn snapshot(&self) -> Arc<Vec<Method>> {
        self.methods.read().clone()
    }

    /// Registered patterns, in registration order
    pub fn methods(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|m| m.pattern().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every method whose pattern matches the message address
    ///
    /// Returns the number of handlers invoked. Handler panics are not caught.
    pub fn dispatch(&self, message: &Message) -> usize {
        let methods = self.snapshot();
        let mut invoked = 0;

        for method in methods.iter() {
            if method.matches(&message.address) {
                method.invoke(message);
                invoked += 1;
            }
        }

        trace!("Dispatched {} to {} handler(s)", message.address, invoked);
        invoked
    }

    /// Dispatch a decoded packet; bundles are not dispatched
    pub fn dispatch_packet(&self, packet: &Packet) -> usize {
        match packet {
            Packet::Message(message) => self.dispatch(message),
            Packet::Bundle(_) => 0,
        }
    }
}

impl fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressSpace")
            .field("methods", &self.methods())
            .finish()
    }
}
