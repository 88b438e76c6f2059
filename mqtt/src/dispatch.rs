/// Routes received publications to callbacks by topic filter.
///
/// Every callback whose filter matches the publication's topic runs, in the order the filters were first registered.
#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<(String, Box<dyn FnMut(&crate::ReceivedPublication) + Send>)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers `callback` for publications whose topic matches `topic_filter`.
    ///
    /// A callback already registered for the same filter is replaced.
    pub fn register<F>(
        &mut self,
        topic_filter: impl Into<String>,
        callback: F,
    ) -> Result<(), crate::proto::InvalidTopic>
    where
        F: FnMut(&crate::ReceivedPublication) + Send + 'static,
    {
        let topic_filter = topic_filter.into();
        crate::proto::validate_topic_filter(&topic_filter)?;

        let callback: Box<dyn FnMut(&crate::ReceivedPublication) + Send> = Box::new(callback);
        match self.routes.iter_mut().find(|(existing, _)| *existing == topic_filter) {
            Some((_, existing)) => *existing = callback,
            None => self.routes.push((topic_filter, callback)),
        }

        Ok(())
    }

    /// Removes the callback for `topic_filter`. Returns whether there was one.
    pub fn unregister(&mut self, topic_filter: &str) -> bool {
        let previous_len = self.routes.len();
        self.routes.retain(|(existing, _)| existing != topic_filter);
        self.routes.len() != previous_len
    }

    /// Calls every callback whose filter matches the publication's topic, and returns how many ran.
    pub fn dispatch(&mut self, publication: &crate::ReceivedPublication) -> usize {
        let mut matched = 0;

        for (topic_filter, callback) in &mut self.routes {
            if crate::proto::topic_matches(topic_filter, &publication.topic_name) {
                callback(publication);
                matched += 1;
            }
        }

        if matched == 0 {
            log::debug!("no callback for publication on {}", publication.topic_name);
        }

        matched
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|(topic_filter, _)| topic_filter))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    fn publication(topic_name: &str, payload: &'static [u8]) -> crate::ReceivedPublication {
        crate::ReceivedPublication {
            topic_name: topic_name.to_string(),
            dup: false,
            qos: crate::proto::QoS::AtMostOnce,
            retain: false,
            payload: bytes::Bytes::from_static(payload),
        }
    }

    fn recorder() -> (
        Arc<Mutex<Vec<String>>>,
        impl FnMut(&crate::ReceivedPublication) + Send + 'static,
    ) {
        let received = Arc::new(Mutex::new(vec![]));
        let callback = {
            let received = received.clone();
            move |publication: &crate::ReceivedPublication| {
                received
                    .lock()
                    .unwrap()
                    .push(publication.topic_name.clone());
            }
        };
        (received, callback)
    }

    #[test]
    fn dispatches_to_every_matching_filter() {
        let mut dispatcher = super::Dispatcher::new();

        let (all, all_callback) = recorder();
        dispatcher.register("#", all_callback).unwrap();

        let (temperatures, temperatures_callback) = recorder();
        dispatcher
            .register("sensors/+/temperature", temperatures_callback)
            .unwrap();

        assert_eq!(dispatcher.dispatch(&publication("sensors/kitchen/temperature", b"21")), 2);
        assert_eq!(dispatcher.dispatch(&publication("sensors/kitchen/humidity", b"40")), 1);
        assert_eq!(dispatcher.dispatch(&publication("$SYS/uptime", b"5")), 0);

        assert_eq!(
            *all.lock().unwrap(),
            vec!["sensors/kitchen/temperature", "sensors/kitchen/humidity"]
        );
        assert_eq!(
            *temperatures.lock().unwrap(),
            vec!["sensors/kitchen/temperature"]
        );
    }

    #[test]
    fn register_replaces_existing_filter() {
        let mut dispatcher = super::Dispatcher::new();

        let (first, first_callback) = recorder();
        dispatcher.register("a/b", first_callback).unwrap();

        let (second, second_callback) = recorder();
        dispatcher.register("a/b", second_callback).unwrap();

        assert_eq!(dispatcher.dispatch(&publication("a/b", b"")), 1);
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(*second.lock().unwrap(), vec!["a/b"]);
    }

    #[test]
    fn register_rejects_invalid_filters() {
        let mut dispatcher = super::Dispatcher::new();

        assert_eq!(
            dispatcher.register("a/#/b", |_: &crate::ReceivedPublication| ()),
            Err(crate::proto::InvalidTopic::MisplacedWildcard)
        );
        assert_eq!(
            dispatcher.register("", |_: &crate::ReceivedPublication| ()),
            Err(crate::proto::InvalidTopic::Empty)
        );
        assert_eq!(dispatcher.dispatch(&publication("a/x/b", b"")), 0);
    }

    #[test]
    fn unregister() {
        let mut dispatcher = super::Dispatcher::new();

        let (received, callback) = recorder();
        dispatcher.register("a/+", callback).unwrap();

        assert!(dispatcher.unregister("a/+"));
        assert!(!dispatcher.unregister("a/+"));
        assert_eq!(dispatcher.dispatch(&publication("a/b", b"")), 0);
        assert!(received.lock().unwrap().is_empty());
    }
}
