// Copyright (c) 2026 Crossdock Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Progress streaming over server-sent events.
//!
//! One polling connection per transfer: opening the stream (re)binds the
//! transfer's channel, and dropping the connection releases it so late
//! publishers see "no listener" instead of a dead sender. The release is
//! sequence-guarded: a reconnect that already replaced the channel keeps
//! its own even when the stale connection tears down afterwards.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::application::progress::ProgressRegistry;
use crate::presentation::api::{current_user, AppState};
use crate::presentation::error::ApiError;

/// Receiver wrapper whose `Drop` releases the registry entry it opened.
pub struct ProgressStream {
    transfer_id: String,
    seq: u64,
    registry: Arc<ProgressRegistry>,
    inner: ReceiverStream<String>,
}

impl ProgressStream {
    pub fn new(
        transfer_id: String,
        seq: u64,
        registry: Arc<ProgressRegistry>,
        receiver: mpsc::Receiver<String>,
    ) -> Self {
        Self {
            transfer_id,
            seq,
            registry,
            inner: ReceiverStream::new(receiver),
        }
    }
}

impl Stream for ProgressStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner)
            .poll_next(cx)
            .map(|message| message.map(|m| Ok(Event::default().data(m))))
    }
}

impl Drop for ProgressStream {
    fn drop(&mut self) {
        self.registry.release(&self.transfer_id, self.seq);
    }
}

pub async fn events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(transfer_id): Path<String>,
) -> Result<Sse<KeepAliveStream<ProgressStream>>, ApiError> {
    current_user(&state, &headers).await?;

    let (seq, receiver) = state.registry.open(&transfer_id);
    let stream = ProgressStream::new(transfer_id, seq, state.registry.clone(), receiver);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    fn stream(registry: &Arc<ProgressRegistry>, transfer_id: &str) -> ProgressStream {
        let (seq, receiver) = registry.open(transfer_id);
        ProgressStream::new(transfer_id.into(), seq, registry.clone(), receiver)
    }

    #[tokio::test]
    async fn dropping_the_stream_closes_the_channel() {
        let registry = Arc::new(ProgressRegistry::new());
        let mut listener = stream(&registry, "t1");

        registry.publish("t1", "25%".into()).unwrap();
        let event = listener.next().await.unwrap();
        assert!(event.is_ok());

        drop(listener);
        assert_eq!(registry.open_channels(), 0);
    }

    #[tokio::test]
    async fn reconnect_survives_the_stale_streams_teardown() {
        let registry = Arc::new(ProgressRegistry::new());
        let stale = stream(&registry, "t1");
        let mut fresh = stream(&registry, "t1");

        // The old connection tears down after the reconnect rebound the
        // channel; the live listener must keep receiving.
        drop(stale);
        registry.publish("t1", "75%".into()).unwrap();
        assert!(fresh.next().await.is_some());

        drop(fresh);
        assert_eq!(registry.open_channels(), 0);
    }
}
