//! Bridge between the translation core and a network endpoint that lives on
//! the UI side of the plugin. Requests travel over an mpsc channel and each
//! carries a oneshot for its reply; readiness is a watch flag. Every wait is
//! bounded by a timeout and can be aborted through a [`Cancellation`].

use anyhow::{Result, anyhow};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use super::{ServiceFuture, ServiceResult, TranslationRequest, TranslationService};

const RELAY_QUEUE: usize = 1;

/// Shared abort flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone)]
pub struct Cancellation {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once [`Cancellation::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            let cancelled = *receiver.borrow_and_update();
            if cancelled {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// A request delivered to the endpoint, answered exactly once.
#[derive(Debug)]
pub struct RelayRequest {
    request: TranslationRequest,
    reply: oneshot::Sender<Result<Vec<ServiceResult>>>,
}

impl RelayRequest {
    pub fn request(&self) -> &TranslationRequest {
        &self.request
    }

    pub fn respond(self, result: Result<Vec<ServiceResult>>) {
        if self.reply.send(result).is_err() {
            debug!("relay reply dropped; requester is gone");
        }
    }
}

/// Core-side half of the relay. Implements [`TranslationService`].
#[derive(Debug, Clone)]
pub struct RelayService {
    sender: mpsc::Sender<RelayRequest>,
    ready: watch::Receiver<bool>,
    timeout: Duration,
    cancellation: Cancellation,
}

/// UI-side half of the relay.
#[derive(Debug)]
pub struct RelayEndpoint {
    receiver: mpsc::Receiver<RelayRequest>,
    ready: watch::Sender<bool>,
}

pub fn channel(timeout: Duration, cancellation: Cancellation) -> (RelayService, RelayEndpoint) {
    let (sender, receiver) = mpsc::channel(RELAY_QUEUE);
    let (ready_sender, ready_receiver) = watch::channel(false);
    (
        RelayService {
            sender,
            ready: ready_receiver,
            timeout,
            cancellation,
        },
        RelayEndpoint {
            receiver,
            ready: ready_sender,
        },
    )
}

impl RelayService {
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    pub async fn await_ready(&self) -> Result<()> {
        let mut ready = self.ready.clone();
        self.bounded("readiness", async move {
            loop {
                let is_ready = *ready.borrow_and_update();
                if is_ready {
                    return Ok(());
                }
                if ready.changed().await.is_err() {
                    return Err(anyhow!("relay endpoint closed before becoming ready"));
                }
            }
        })
        .await
    }

    async fn dispatch(&self, request: TranslationRequest) -> Result<Vec<ServiceResult>> {
        self.await_ready().await?;
        let (reply, response) = oneshot::channel();
        let sender = self.sender.clone();
        self.bounded("dispatch", async move {
            sender
                .send(RelayRequest { request, reply })
                .await
                .map_err(|_| anyhow!("relay endpoint is closed"))
        })
        .await?;
        self.bounded("response", async move {
            match response.await {
                Ok(result) => result,
                Err(_) => Err(anyhow!("relay endpoint dropped the request without replying")),
            }
        })
        .await
    }

    async fn bounded<T>(
        &self,
        stage: &str,
        future: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        if self.cancellation.is_cancelled() {
            return Err(anyhow!("relay {} cancelled", stage));
        }
        tokio::select! {
            result = tokio::time::timeout(self.timeout, future) => match result {
                Ok(result) => result,
                Err(_) => {
                    warn!("relay {} timed out after {:?}", stage, self.timeout);
                    Err(anyhow!("relay {} timed out after {:?}", stage, self.timeout))
                }
            },
            _ = self.cancellation.cancelled() => Err(anyhow!("relay {} cancelled", stage)),
        }
    }
}

impl TranslationService for RelayService {
    fn translate(&self, request: TranslationRequest) -> ServiceFuture {
        let relay = self.clone();
        Box::pin(async move { relay.dispatch(request).await })
    }
}

impl RelayEndpoint {
    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    pub async fn next(&mut self) -> Option<RelayRequest> {
        self.receiver.recv().await
    }

    /// Marks the endpoint ready and answers every request with `service`
    /// until the core side is dropped.
    pub async fn serve<S: TranslationService>(mut self, service: S) {
        self.mark_ready();
        while let Some(message) = self.next().await {
            let result = service.translate(message.request().clone()).await;
            message.respond(result);
        }
        debug!("relay endpoint stopped");
    }
}
