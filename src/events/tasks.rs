use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::interval;
use tokio_stream::wrappers::IntervalStream;

use crate::events::context::EventHub;

pub fn start(hub: Arc<EventHub>) {
    tokio::spawn(broadcast_clean(hub));
}

async fn broadcast_clean(hub: Arc<EventHub>) {
    IntervalStream::new(interval(Duration::from_secs(5 * 60)))
        .for_each(|_| async {
            hub.sweep().await;
            log::trace!("broadcast table sweep finished");
        })
        .await;
}
