//! Watches NetworkMaps and feeds their names into the work queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use api::{NetworkMap, NetworkMapList};
use ip6tables::Ip6TablesClientTrait;
use machinery::controller::Controller;
use machinery::state::Client;

use crate::error::NptError;
use crate::reconciler::NptReconciler;

/// Drives the NPT reconciler from NetworkMap watch events and periodic
/// resync.
pub struct NptController {
    client: Arc<dyn Client>,
    controller: Arc<Controller>,
}

impl NptController {
    pub fn new(
        client: Arc<dyn Client>,
        ip6tables: Arc<dyn Ip6TablesClientTrait>,
        resync: Duration,
    ) -> Self {
        let reconciler = Arc::new(NptReconciler::new(
            Arc::clone(&client),
            ip6tables,
            resync,
        ));
        Self {
            client,
            controller: Arc::new(Controller::new(reconciler)),
        }
    }

    /// Runs the worker and the watch loop until `stop` flips.
    pub async fn run(&self, stop: watch::Receiver<bool>) -> Result<(), NptError> {
        let worker = {
            let controller = Arc::clone(&self.controller);
            let stop = stop.clone();
            tokio::spawn(async move { controller.run(stop).await })
        };

        // Watch before listing, so changes committed between the two are
        // not lost.
        let mut events = self.client.watch(&NetworkMap::default())?;

        let mut list = NetworkMapList::default();
        self.client.list(&mut list)?;
        for item in &list.items {
            self.controller.add(item.metadata.name.clone());
        }
        info!("seeded {} NetworkMaps", list.items.len());

        let mut stop = stop;
        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        // Hub shut down; the store is going away.
                        break;
                    };
                    if let (Some(old), Some(new)) = (&event.old, &event.new) {
                        if old.meta().generation == new.meta().generation {
                            // Status-only change, nothing to enforce.
                            continue;
                        }
                    }
                    if let Some(obj) = event.object() {
                        self.controller.add(obj.meta().name.clone());
                    }
                }
                _ = stop.changed() => break,
            }
        }

        let _ = worker.await;
        Ok(())
    }
}
