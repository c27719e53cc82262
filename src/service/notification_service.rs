//! The notification bell: a 30 second refetch while someone is signed in.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::errors::{ClientError, Result};
use crate::models::Notification;
use crate::service::{replace_poller, PollerSlot};
use crate::storage::{SessionSnapshot, SessionStore};
use crate::sync::{spawn_poller, Feed, PollSource, Reconciled, VersionedList};

struct NotificationSource {
    api: ApiClient,
}

#[async_trait]
impl PollSource for NotificationSource {
    type Snapshot = Vec<Notification>;

    fn name(&self) -> &str {
        "notifications"
    }

    async fn fetch(&self) -> Result<Vec<Notification>> {
        self.api.notifications().await
    }
}

#[derive(Clone)]
pub struct NotificationService {
    api: ApiClient,
    poll_interval: Duration,
    feed: Feed<VersionedList<Notification>>,
    poller: PollerSlot,
}

impl NotificationService {
    pub fn new(api: ApiClient, config: &ClientConfig) -> Self {
        Self {
            api,
            poll_interval: config.notification_poll_interval,
            feed: Feed::new(VersionedList::default()),
            poller: PollerSlot::default(),
        }
    }

    pub fn feed(&self) -> &Feed<VersionedList<Notification>> {
        &self.feed
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.feed.read(|l| l.items().to_vec())
    }

    pub fn unread_count(&self) -> usize {
        self.feed.read(|l| l.items().iter().filter(|n| !n.is_read).count())
    }

    pub async fn is_polling(&self) -> bool {
        self.poller.lock().await.is_some()
    }

    /// (Re)starts polling for whoever is signed in now: the previous list is
    /// dropped, then one fetch now and one every interval.
    pub async fn start(&self) {
        self.stop().await;
        let source = NotificationSource { api: self.api.clone() };
        let handle = spawn_poller(source, self.feed.clone(), self.poll_interval);
        replace_poller(&self.poller, Some(handle)).await;
    }

    /// Stops polling and forgets the list.
    pub async fn stop(&self) {
        replace_poller(&self.poller, None).await;
        let ticket = self.feed.ticket();
        self.feed.update(|l| l.edit(ticket, Vec::clear));
    }

    /// Follows the signed-in identity: polling runs while a token is present and
    /// restarts whenever the user changes. Abort the returned task to unbind.
    pub fn bind_to_session(&self, store: &SessionStore) -> JoinHandle<()> {
        let service = self.clone();
        let mut rx = store.subscribe();
        tokio::spawn(async move {
            let mut identity: Option<String> = None;
            loop {
                let next = signed_in_id(&rx.borrow_and_update());
                if next != identity {
                    match &next {
                        Some(id) => {
                            info!("Notifications: polling for user {id}");
                            service.start().await;
                        }
                        None => {
                            info!("Notifications: signed out, polling idle");
                            service.stop().await;
                        }
                    }
                    identity = next;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    /// User-initiated refetch; unlike a poll tick, failures are returned.
    pub async fn refresh(&self) -> Result<Vec<Notification>> {
        let ticket = self.feed.ticket();
        let list = self.api.notifications().await?;
        self.feed.update_if(|l| l.apply_snapshot(ticket, list.clone()));
        Ok(list)
    }

    /// Flips `is_read` immediately and reverts it if the server refuses.
    pub async fn mark_read(&self, notification_id: &str) -> Result<()> {
        let known = self.feed.read(|l| l.items().iter().find(|n| n.id == notification_id).map(|n| n.is_read));
        match known {
            None => {
                return Err(ClientError::NotFound { endpoint: format!("notification {notification_id}") })
            }
            Some(true) => return Ok(()),
            Some(false) => {}
        }
        self.set_read(notification_id, true);

        if let Err(e) = self.api.mark_notification_read(notification_id).await {
            warn!("Failed to mark notification {notification_id} read, reverting: {e}");
            self.set_read(notification_id, false);
            return Err(e);
        }
        debug!("Notification {notification_id} marked read");
        Ok(())
    }

    /// Removes the entry immediately and puts it back if the server refuses.
    pub async fn delete(&self, notification_id: &str) -> Result<()> {
        let ticket = self.feed.ticket();
        let mut removed = None;
        self.feed.update(|l| {
            l.edit(ticket, |items| {
                if let Some(index) = items.iter().position(|n| n.id == notification_id) {
                    removed = Some((index, items.remove(index)));
                }
            })
        });

        if let Err(e) = self.api.delete_notification(notification_id).await {
            warn!("Failed to delete notification {notification_id}, restoring: {e}");
            if let Some((index, notification)) = removed {
                let ticket = self.feed.ticket();
                self.feed.update(|l| {
                    l.edit(ticket, |items| {
                        if !items.iter().any(|n| n.id == notification.id) {
                            let index = index.min(items.len());
                            items.insert(index, notification);
                        }
                    })
                });
            }
            return Err(e);
        }
        Ok(())
    }

    /// Avatars of the agents the current notifications point at, keyed by agent id.
    /// Lookups run concurrently; failed ones are skipped.
    pub async fn agent_avatars(&self) -> HashMap<String, String> {
        let targets: BTreeSet<String> = self.feed.read(|l| {
            l.items().iter().filter_map(|n| n.target_id.clone()).collect()
        });

        let lookups = targets.into_iter().map(|agent_id| async move {
            let result = self.api.get_agent(&agent_id).await;
            (agent_id, result)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(agent_id, result)| match result {
                Ok(agent) => agent.avatar.map(|avatar| (agent_id, avatar)),
                Err(e) => {
                    warn!("Failed to load agent {agent_id} for notification avatar: {e}");
                    None
                }
            })
            .collect()
    }

    fn set_read(&self, notification_id: &str, is_read: bool) {
        let ticket = self.feed.ticket();
        self.feed.update(|l| {
            l.edit(ticket, |items| {
                if let Some(n) = items.iter_mut().find(|n| n.id == notification_id) {
                    n.is_read = is_read;
                }
            })
        });
    }
}

fn signed_in_id(snapshot: &SessionSnapshot) -> Option<String> {
    if !snapshot.is_authenticated() {
        return None;
    }
    snapshot.user.as_ref().map(|u| u.id.clone())
}
