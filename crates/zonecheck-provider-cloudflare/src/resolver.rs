// # Observed DNS Resolver
//
// A `reqwest` resolver that performs the usual system lookup and then reports
// the resolved addresses to a `RequestObserver`.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use zonecheck_core::traits::{RequestEvent, RequestObserver};

/// System resolver that reports each lookup
pub(crate) struct ObservedResolver {
    observer: Arc<dyn RequestObserver>,
}

impl ObservedResolver {
    pub(crate) fn new(observer: Arc<dyn RequestObserver>) -> Self {
        Self { observer }
    }
}

impl Resolve for ObservedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let observer = Arc::clone(&self.observer);
        Box::pin(async move {
            let host = name.as_str().to_string();
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
                .await?
                .collect();

            observer.observe(&RequestEvent::DnsResolved {
                host,
                addrs: addrs.clone(),
            });

            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<RequestEvent>>);

    impl RequestObserver for Recording {
        fn observe(&self, event: &RequestEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_resolve_reports_addresses() {
        let recording = Arc::new(Recording::default());
        let resolver = ObservedResolver::new(recording.clone());

        let name = Name::from_str("localhost").unwrap();
        let resolved: Vec<SocketAddr> = resolver.resolve(name).await.unwrap().collect();
        assert!(!resolved.is_empty());

        let events = recording.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RequestEvent::DnsResolved { host, addrs } => {
                assert_eq!(host, "localhost");
                assert_eq!(addrs, &resolved);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
