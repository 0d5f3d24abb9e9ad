//! Session host: drives the gateway connection and dispatches messages.

use std::sync::Arc;

use discord_gateway::{ChatMessage, GatewayConnection, GatewayEvent, MessageSink};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::CommandRouter;
use crate::{Error, Result};

/// Owns the bot identity and the in-flight message tasks.
pub struct SessionHost {
    router: Arc<CommandRouter>,
    sink: Arc<dyn MessageSink>,
    bot_user_id: Option<String>,
    tasks: JoinSet<()>,
}

impl SessionHost {
    pub fn new(router: Arc<CommandRouter>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            router,
            sink,
            bot_user_id: None,
            tasks: JoinSet::new(),
        }
    }

    /// The bot's own user id, known after `READY`.
    pub fn bot_user_id(&self) -> Option<&str> {
        self.bot_user_id.as_deref()
    }

    /// Process gateway events until cancelled or the connection ends.
    ///
    /// Returns an error if the gateway gave up (fatal close code or
    /// reconnect attempts exhausted).
    pub async fn run(
        mut self,
        mut connection: GatewayConnection,
        cancel: CancellationToken,
    ) -> Result<()> {
        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Shutdown requested, closing gateway session");
                    break Ok(());
                }
                event = connection.next_event() => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        error!("Gateway connection closed");
                        break Err(Error::Other("gateway connection closed".to_string()));
                    }
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Message task failed");
                    }
                }
            }
        };

        connection.shutdown().await;
        self.wait_idle().await;
        result
    }

    /// React to one gateway event.
    pub fn handle_event(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready(ready) => {
                info!(
                    user = %ready.user.username,
                    user_id = %ready.user.id,
                    session_id = %ready.session_id,
                    "Logged in as {}",
                    ready.user.username
                );
                self.bot_user_id = Some(ready.user.id);
            }
            GatewayEvent::MessageCreate(message) => self.handle_message(message),
        }
    }

    fn handle_message(&mut self, message: ChatMessage) {
        if self.bot_user_id.as_deref() == Some(message.author.id.as_str()) {
            return;
        }

        info!(
            content = %message.content,
            author = %message.author.username,
            channel_id = %message.channel_id,
            "Received message"
        );

        let router = self.router.clone();
        let sink = self.sink.clone();
        self.tasks.spawn(async move {
            respond(&router, sink.as_ref(), &message).await;
        });
    }

    /// Wait for every in-flight message task to finish.
    pub async fn wait_idle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Message task failed");
            }
        }
    }
}

/// Run `message` through the router and send the reply, if any.
///
/// Returns whether a reply was delivered.
pub async fn respond(
    router: &CommandRouter,
    sink: &dyn MessageSink,
    message: &ChatMessage,
) -> bool {
    let Some(reply) = router.handle(&message.content).await else {
        debug!(message_id = %message.id, "Not a command");
        return false;
    };

    match sink.send_message(&message.channel_id, &reply).await {
        Ok(()) => {
            info!(channel_id = %message.channel_id, response = %reply, "Sent response");
            true
        }
        Err(e) => {
            warn!(channel_id = %message.channel_id, error = %e, "Failed to send response");
            false
        }
    }
}
