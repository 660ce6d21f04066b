//! MPRIS player client

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use zbus::zvariant::OwnedValue;
use zbus::{proxy, Connection};

use crate::player::{MediaPlayer, PlaybackStatus, PlayerError, PlayerId};
use crate::sync::EngineEvent;

use super::types::{length_from_metadata, parse_status, title_from_metadata};

/// D-Bus error name for a destination that no longer exists
const SERVICE_UNKNOWN: &str = "org.freedesktop.DBus.Error.ServiceUnknown";

/// `org.mpris.MediaPlayer2.Player`
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait Player {
    fn play(&self) -> zbus::Result<()>;

    fn pause(&self) -> zbus::Result<()>;

    fn stop(&self) -> zbus::Result<()>;

    fn seek(&self, offset: i64) -> zbus::Result<()>;

    #[zbus(signal)]
    fn seeked(&self, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    // Position changes continuously and never emits PropertiesChanged
    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> zbus::Result<i64>;

    #[zbus(property)]
    fn can_play(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn can_pause(&self) -> zbus::Result<bool>;
}

impl From<zbus::Error> for PlayerError {
    fn from(e: zbus::Error) -> Self {
        match &e {
            zbus::Error::MethodError(name, detail, _) if name.as_str() == SERVICE_UNKNOWN => {
                PlayerError::Gone(detail.clone().unwrap_or_default())
            }
            _ => PlayerError::Bus(e),
        }
    }
}

impl From<zbus::fdo::Error> for PlayerError {
    fn from(e: zbus::fdo::Error) -> Self {
        match e {
            zbus::fdo::Error::ZBus(e) => e.into(),
            zbus::fdo::Error::ServiceUnknown(detail) => PlayerError::Gone(detail),
            other => PlayerError::Bus(other.into()),
        }
    }
}

/// A single MPRIS player on the session bus
pub struct MprisPlayer {
    id: PlayerId,
    proxy: PlayerProxy<'static>,
    /// Signal forwarding tasks, aborted on unsubscribe
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MprisPlayer {
    /// Connect to the player owning `name`
    pub async fn connect(conn: &Connection, name: &str) -> Result<Self, PlayerError> {
        let proxy = PlayerProxy::builder(conn)
            .destination(name.to_string())?
            .build()
            .await?;

        Ok(Self {
            id: PlayerId::new(name),
            proxy,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Forward status, metadata and seek notifications to `events`
    #[instrument(skip(self, events), fields(player = %self.id))]
    pub async fn subscribe(&self, events: mpsc::UnboundedSender<EngineEvent>) -> Result<(), PlayerError> {
        let mut status_changes = self.proxy.receive_playback_status_changed().await;
        let mut metadata_changes = self.proxy.receive_metadata_changed().await;
        let mut seeks = self.proxy.receive_seeked().await?;

        let mut tasks = Vec::with_capacity(3);

        let id = self.id.clone();
        let tx = events.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(change) = status_changes.next().await {
                let status = match change.get().await {
                    Ok(status) => parse_status(&status),
                    Err(e) => {
                        debug!("Bad PlaybackStatus from {}: {}", id, e);
                        PlaybackStatus::Unknown
                    }
                };
                let event = EngineEvent::StatusChanged {
                    player: id.clone(),
                    status,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));

        let id = self.id.clone();
        let tx = events.clone();
        tasks.push(tokio::spawn(async move {
            while metadata_changes.next().await.is_some() {
                if tx.send(EngineEvent::MetadataChanged { player: id.clone() }).is_err() {
                    break;
                }
            }
        }));

        let id = self.id.clone();
        let tx = events;
        tasks.push(tokio::spawn(async move {
            while let Some(signal) = seeks.next().await {
                let position = match signal.args() {
                    Ok(args) => *args.position(),
                    Err(e) => {
                        debug!("Bad Seeked signal from {}: {}", id, e);
                        continue;
                    }
                };
                let event = EngineEvent::Seeked {
                    player: id.clone(),
                    position,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));

        self.tasks.lock().extend(tasks);
        debug!("Subscribed");
        Ok(())
    }

    async fn metadata(&self) -> Result<HashMap<String, OwnedValue>, PlayerError> {
        Ok(self.proxy.metadata().await?)
    }
}

#[async_trait]
impl MediaPlayer for MprisPlayer {
    fn id(&self) -> &PlayerId {
        &self.id
    }

    async fn status(&self) -> Result<PlaybackStatus, PlayerError> {
        Ok(parse_status(&self.proxy.playback_status().await?))
    }

    async fn title(&self) -> Result<String, PlayerError> {
        Ok(title_from_metadata(&self.metadata().await?).unwrap_or_default())
    }

    async fn position(&self) -> Result<i64, PlayerError> {
        Ok(self.proxy.position().await?)
    }

    async fn length(&self) -> Result<Option<i64>, PlayerError> {
        Ok(length_from_metadata(&self.metadata().await?))
    }

    async fn can_play(&self) -> Result<bool, PlayerError> {
        Ok(self.proxy.can_play().await?)
    }

    async fn can_pause(&self) -> Result<bool, PlayerError> {
        Ok(self.proxy.can_pause().await?)
    }

    async fn play(&self) -> Result<(), PlayerError> {
        Ok(self.proxy.play().await?)
    }

    async fn pause(&self) -> Result<(), PlayerError> {
        Ok(self.proxy.pause().await?)
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        Ok(self.proxy.stop().await?)
    }

    async fn seek(&self, offset: i64) -> Result<(), PlayerError> {
        Ok(self.proxy.seek(offset).await?)
    }

    fn unsubscribe(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

impl Drop for MprisPlayer {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_stay_bus_errors() {
        let err = PlayerError::from(zbus::Error::InvalidReply);
        assert!(matches!(err, PlayerError::Bus(zbus::Error::InvalidReply)));
    }

    #[test]
    fn test_fdo_service_unknown_means_gone() {
        let err = PlayerError::from(zbus::fdo::Error::ServiceUnknown("vlc".to_string()));
        assert!(matches!(err, PlayerError::Gone(ref name) if name == "vlc"));

        let err = PlayerError::from(zbus::fdo::Error::ZBus(zbus::Error::InvalidReply));
        assert!(matches!(err, PlayerError::Bus(zbus::Error::InvalidReply)));

        let err = PlayerError::from(zbus::fdo::Error::AccessDenied("no".to_string()));
        assert!(matches!(err, PlayerError::Bus(zbus::Error::FDO(_))));
    }
}
