use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshroom_core::{ClientEvent, RelayEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::channel::SignalingChannel;
use crate::error::ChannelError;

struct WsConnection {
    outbound: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<RelayEvent>,
    reader: JoinHandle<()>,
}

/// [`SignalingChannel`] over a WebSocket to the relay's `/ws` endpoint.
pub struct WsChannel {
    url: String,
    conn: Option<WsConnection>,
}

impl WsChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            conn: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SignalingChannel for WsChannel {
    async fn connect(&mut self) -> Result<(), ChannelError> {
        if self.is_connected() {
            return Ok(());
        }

        let (socket, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        info!("Connected to relay at {}", self.url);

        let (mut sink, mut stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayEvent>(&text) {
                        Ok(event) => {
                            debug!("<- relay '{}'", event.name());
                            if in_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid RelayEvent: {:?}", e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Relay stream ended");
        });

        self.conn = Some(WsConnection {
            outbound: out_tx,
            inbound: in_rx,
            reader,
        });
        Ok(())
    }

    async fn send(&mut self, event: ClientEvent) -> Result<(), ChannelError> {
        let conn = self.conn.as_ref().ok_or(ChannelError::Closed)?;
        let json = serde_json::to_string(&event)?;
        conn.outbound
            .send(Message::Text(json.into()))
            .map_err(|_| ChannelError::Closed)
    }

    async fn recv(&mut self) -> Option<RelayEvent> {
        self.conn.as_mut()?.inbound.recv().await
    }

    async fn disconnect(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let _ = conn.outbound.send(Message::Close(None));
        conn.reader.abort();
        info!("Disconnected from relay at {}", self.url);
    }

    fn is_connected(&self) -> bool {
        self.conn
            .as_ref()
            .is_some_and(|c| !c.outbound.is_closed() && !c.reader.is_finished())
    }
}
