//! Request/response plumbing between the isolated contexts. Each request
//! carries its own one-shot reply slot; the receiving task answers exactly once.

use tokio::sync::{mpsc, oneshot};

use crate::error::{PipelineError, PipelineResult};

pub struct Envelope<Req, Resp> {
    pub request: Req,
    reply: oneshot::Sender<Resp>,
}

impl<Req, Resp> Envelope<Req, Resp> {
    pub fn into_parts(self) -> (Req, Responder<Resp>) {
        (self.request, Responder(self.reply))
    }
}

pub struct Responder<Resp>(oneshot::Sender<Resp>);

impl<Resp> Responder<Resp> {
    /// A caller that stopped waiting is not an error for the receiver.
    pub fn send(self, response: Resp) {
        let _ = self.0.send(response);
    }
}

pub struct RequestSender<Req, Resp> {
    tx: mpsc::Sender<Envelope<Req, Resp>>,
}

impl<Req, Resp> Clone for RequestSender<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<Req, Resp> RequestSender<Req, Resp> {
    pub async fn request(&self, request: Req) -> PipelineResult<Resp> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| PipelineError::Messaging("receiving end does not exist".into()))?;

        rx.await.map_err(|_| {
            PipelineError::Messaging("receiver dropped the request without answering".into())
        })
    }

}

pub fn request_channel<Req, Resp>(
    capacity: usize,
) -> (RequestSender<Req, Resp>, mpsc::Receiver<Envelope<Req, Resp>>) {
    let (tx, rx) = mpsc::channel(capacity);
    (RequestSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_receives_the_reply() {
        let (sender, mut rx) = request_channel::<u32, u32>(4);
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let (n, responder) = envelope.into_parts();
                responder.send(n * 2);
            }
        });

        assert_eq!(sender.request(21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn closed_receiver_is_a_messaging_error() {
        let (sender, rx) = request_channel::<u32, u32>(4);
        drop(rx);

        let err = sender.request(1).await.unwrap_err();
        assert!(matches!(err, PipelineError::Messaging(_)));
    }

    #[tokio::test]
    async fn dropped_responder_is_a_messaging_error() {
        let (sender, mut rx) = request_channel::<u32, u32>(4);
        tokio::spawn(async move {
            let envelope = rx.recv().await.unwrap();
            drop(envelope);
        });

        let err = sender.request(1).await.unwrap_err();
        assert!(matches!(err, PipelineError::Messaging(_)));
    }
}
