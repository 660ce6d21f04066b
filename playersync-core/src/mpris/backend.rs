//! Player discovery on the session bus

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zbus::fdo::DBusProxy;
use zbus::Connection;

use crate::player::{MediaPlayer, PlayerBackend, PlayerError, PlayerId};
use crate::sync::EngineEvent;

use super::client::MprisPlayer;
use super::types::is_player_name;

/// MPRIS players reached through one session bus connection
pub struct MprisBackend {
    conn: Connection,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl MprisBackend {
    /// Connect to the session bus
    pub async fn connect() -> Result<Self, PlayerError> {
        let conn = Connection::session().await?;
        info!("Connected to session bus");
        Ok(Self::with_connection(conn))
    }

    pub fn with_connection(conn: Connection) -> Self {
        Self {
            conn,
            watcher: Mutex::new(None),
        }
    }
}

#[async_trait]
impl PlayerBackend for MprisBackend {
    async fn player_names(&self) -> Result<Vec<String>, PlayerError> {
        let dbus = DBusProxy::new(&self.conn).await?;
        let names = dbus
            .list_names()
            .await?
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| is_player_name(name))
            .collect::<Vec<_>>();
        debug!("Found {} players", names.len());
        Ok(names)
    }

    async fn open(
        &self,
        name: &str,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Arc<dyn MediaPlayer>, PlayerError> {
        let player = MprisPlayer::connect(&self.conn, name).await?;
        player.subscribe(events).await?;
        Ok(Arc::new(player))
    }

    async fn watch(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Result<(), PlayerError> {
        let dbus = DBusProxy::new(&self.conn).await?;
        let mut changes = dbus.receive_name_owner_changed().await?;

        let task = tokio::spawn(async move {
            while let Some(signal) = changes.next().await {
                let args = match signal.args() {
                    Ok(args) => args,
                    Err(e) => {
                        warn!("Bad NameOwnerChanged signal: {}", e);
                        continue;
                    }
                };
                let name = args.name().to_string();
                if !is_player_name(&name) {
                    continue;
                }

                // An owner handover shows up as vanish followed by appear
                let mut pending = Vec::with_capacity(2);
                if args.old_owner().is_some() {
                    pending.push(EngineEvent::PlayerVanished {
                        player: PlayerId::new(name.clone()),
                    });
                }
                if args.new_owner().is_some() {
                    pending.push(EngineEvent::PlayerAppeared { name });
                }

                for event in pending {
                    if events.send(event).is_err() {
                        debug!("Engine gone, stopping name watcher");
                        return;
                    }
                }
            }
        });

        if let Some(previous) = self.watcher.lock().replace(task) {
            previous.abort();
        }
        Ok(())
    }
}

impl Drop for MprisBackend {
    fn drop(&mut self) {
        if let Some(task) = self.watcher.lock().take() {
            task.abort();
        }
    }
}
