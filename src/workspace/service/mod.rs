//! Minimal typed message loop: a `Service` owns its state on one tokio task and
//! handles messages for which it implements `Handler<M>`.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use crate::core::{Result, TrellisError};

const MAILBOX_CAPACITY: usize = 64;

pub trait Service: Send + Sized + 'static {
    fn run(self) -> Client<Self> {
        self.spawn_with_self(|_, _| {})
    }

    /// Spawn the service, handing it its own client first so it can post to itself
    fn spawn_with_self<F>(mut self, init: F) -> Client<Self>
    where
        F: FnOnce(&mut Self, Client<Self>),
    {
        let (tx, mut rx) = mpsc::channel::<Box<dyn Envelope>>(MAILBOX_CAPACITY);
        let client = Client {
            tx,
            _phantom: PhantomData,
        };

        init(&mut self, client.clone());

        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let service = &mut self as &mut (dyn Any + Send);
                envelope.handle_envelope(service).await;
            }
        });

        client
    }
}

pub trait Handler<M>: Service
where
    M: Send + 'static,
{
    type Response: Send + 'static;

    fn handle(&mut self, msg: M) -> impl Future<Output = Self::Response> + Send;
}

trait Envelope: Send {
    fn handle_envelope(
        self: Box<Self>,
        service: &mut (dyn Any + Send),
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

struct MessageEnvelope<S, M>
where
    S: Service + Handler<M>,
    M: Send + 'static,
{
    message: M,
    response_tx: Option<oneshot::Sender<S::Response>>,
    _phantom: PhantomData<S>,
}

impl<S, M> Envelope for MessageEnvelope<S, M>
where
    S: Service + Handler<M>,
    M: Send + 'static,
{
    fn handle_envelope(
        self: Box<Self>,
        service: &mut (dyn Any + Send),
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let Some(service) = service.downcast_mut::<S>() else {
            error!("Service type mismatch in envelope");
            return Box::pin(async {});
        };

        let message = self.message;
        let response_tx = self.response_tx;

        Box::pin(async move {
            let result = Handler::<M>::handle(service, message).await;
            if let Some(tx) = response_tx {
                let _ = tx.send(result);
            }
        })
    }
}

pub struct Client<S: Service> {
    tx: mpsc::Sender<Box<dyn Envelope>>,
    _phantom: PhantomData<fn() -> S>,
}

impl<S: Service> Clone for Client<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<S: Service> Client<S> {
    /// Send `msg` and wait for the service's response
    pub async fn request<M>(&self, msg: M) -> Result<S::Response>
    where
        M: Send + 'static,
        S: Handler<M>,
    {
        let (tx, rx) = oneshot::channel();

        let envelope = Box::new(MessageEnvelope::<S, M> {
            message: msg,
            response_tx: Some(tx),
            _phantom: PhantomData,
        });

        self.tx
            .send(envelope)
            .await
            .map_err(|_| TrellisError::service("failed to send message to service"))?;

        rx.await
            .map_err(|_| TrellisError::service("service dropped the response"))
    }

    /// Post `msg` without waiting; usable from any thread.
    ///
    /// Returns false when the service is gone or its mailbox is full.
    pub fn notify<M>(&self, msg: M) -> bool
    where
        M: Send + 'static,
        S: Handler<M>,
    {
        let envelope = Box::new(MessageEnvelope::<S, M> {
            message: msg,
            response_tx: None,
            _phantom: PhantomData,
        });
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping notification: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        total: u64,
    }

    impl Service for Counter {}

    struct Add(u64);
    struct Total;

    impl Handler<Add> for Counter {
        type Response = ();

        async fn handle(&mut self, msg: Add) -> Self::Response {
            self.total += msg.0;
        }
    }

    impl Handler<Total> for Counter {
        type Response = u64;

        async fn handle(&mut self, _: Total) -> Self::Response {
            self.total
        }
    }

    /// Send but not Sync, like a service owning a `Send`-only surface
    struct Tally {
        total: std::cell::Cell<u64>,
    }

    impl Service for Tally {}

    impl Handler<Add> for Tally {
        type Response = ();

        async fn handle(&mut self, msg: Add) -> Self::Response {
            self.total.set(self.total.get() + msg.0);
        }
    }

    impl Handler<Total> for Tally {
        type Response = u64;

        async fn handle(&mut self, _: Total) -> Self::Response {
            self.total.get()
        }
    }

    #[tokio::test]
    async fn test_client_of_non_sync_service_is_shareable() {
        let client = Tally {
            total: std::cell::Cell::new(0),
        }
        .run();
        let poster = client.clone();
        let hook: std::sync::Arc<dyn Fn(u64) + Send + Sync> = std::sync::Arc::new(move |n: u64| {
            poster.notify(Add(n));
        });
        let background = hook.clone();
        tokio::spawn(async move { background(4) }).await.unwrap();
        hook(1);
        assert_eq!(client.request(Total).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_notify_then_request_is_ordered() {
        let client = Counter { total: 0 }.run();
        assert!(client.notify(Add(2)));
        client.request(Add(3)).await.unwrap();
        assert_eq!(client.request(Total).await.unwrap(), 5);
    }
}
