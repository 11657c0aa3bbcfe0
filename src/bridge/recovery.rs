//! Failure containment for inbound handlers.
//!
//! A handler runs on the connection task that received the message. A
//! failing or panicking handler must not take that task down, so every
//! handler is wrapped with [`with_recovery`] before it is handed to a
//! network client.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{error, warn};

use crate::common::error::{RouteError, RouteResult};
use crate::common::InboundMessage;

/// A wrapped handler: it never fails and never unwinds.
pub type RecoveringHandler = Box<dyn Fn(InboundMessage) + Send + Sync>;

/// Wrap `handler` so errors are logged and panics are caught.
pub fn with_recovery<F>(name: &'static str, handler: F) -> RecoveringHandler
where
    F: Fn(&InboundMessage) -> RouteResult<()> + Send + Sync + 'static,
{
    Box::new(move |msg: InboundMessage| {
        match catch_unwind(AssertUnwindSafe(|| handler(&msg))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log_route_error(name, &msg, &e),
            Err(payload) => {
                error!(
                    handler = name,
                    "Handler panicked on message {}: {}",
                    msg,
                    panic_message(payload.as_ref())
                );
            }
        }
    })
}

fn log_route_error(name: &'static str, msg: &InboundMessage, e: &RouteError) {
    match e {
        RouteError::Send(_) => error!(handler = name, "Dropped message {}: {}", msg, e),
        _ => warn!(handler = name, "Dropped message {}: {}", msg, e),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    fn message() -> InboundMessage {
        InboundMessage::new("#dev", "alice", "hello")
    }

    #[test]
    fn test_success_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = with_recovery("test", move |_msg| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        handler(message());
        handler(message());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_is_contained() {
        let handler = with_recovery("test", |_msg| Err(RouteError::MissingTarget));
        handler(message());
    }

    #[test]
    fn test_panic_is_contained_and_handler_keeps_working() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = with_recovery("test", move |msg| {
            counter.fetch_add(1, Ordering::SeqCst);
            if msg.body == "boom" {
                panic!("unexpected message shape");
            }
            Ok(())
        });

        handler(InboundMessage::new("#dev", "alice", "boom"));
        handler(message());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panic_message_formats() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
