use axum::{
    extract::{WebSocketUpgrade, ws::Message},
    response::Response,
};
use futures_util::{SinkExt, Stream, StreamExt};
use serde::Serialize;
use serde_json::json;

use crate::SwapError;

/// Pushes every view of `views` to the socket as one JSON text frame. A
/// failed snapshot becomes an `{"error": ..}` frame and the socket stays
/// open for the next one. Closing the socket drops the stream, which ends
/// the underlying subscription.
pub(crate) fn stream_views<S, V>(ws: WebSocketUpgrade, views: S) -> Response
where
    S: Stream<Item = Result<V, SwapError>> + Send + 'static,
    V: Serialize + Send + 'static,
{
    ws.on_upgrade(async move |socket| {
        let (mut sender, mut receiver) = socket.split();

        let mut push_task = tokio::spawn(async move {
            let mut views = std::pin::pin!(views);
            while let Some(view) = views.next().await {
                let frame = match view {
                    Ok(view) => serde_json::to_string(&view),
                    Err(e) => {
                        tracing::warn!(error = %e, "live view failed");
                        serde_json::to_string(&json!({ "error": e.public_message() }))
                    }
                };
                let Ok(frame) = frame else {
                    continue;
                };
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        });

        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(message)) = receiver.next().await {
                if let Message::Close(_) = message {
                    break;
                }
            }
        });

        tokio::select! {
            _ = &mut push_task => recv_task.abort(),
            _ = &mut recv_task => push_task.abort(),
        };
        tracing::debug!("live socket closed");
    })
}
