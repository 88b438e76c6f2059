use std::task::{Context, Poll};

use futures::{SinkExt, StreamExt};

#[derive(Debug)]
pub(super) struct State {
    /// Subscriptions acked by the server, with their granted QoS
    subscriptions: std::collections::BTreeMap<String, crate::proto::QoS>,

    subscriptions_updated_send: futures::channel::mpsc::Sender<SubscriptionUpdate>,
    subscriptions_updated_recv: futures::channel::mpsc::Receiver<SubscriptionUpdate>,

    subscription_updates_waiting_to_be_sent: std::collections::VecDeque<SubscriptionUpdate>,

    /// SUBSCRIBE and UNSUBSCRIBE packets sent by us, in the order the server must ack them
    subscription_updates_waiting_to_be_acked:
        std::collections::VecDeque<(crate::proto::PacketIdentifier, BatchedSubscriptionUpdate)>,
}

impl State {
    pub(super) fn poll(
        &mut self,
        cx: &mut Context<'_>,
        packet: &mut Option<crate::proto::Packet>,
        packet_identifiers: &mut super::PacketIdentifiers,
    ) -> Result<(Vec<crate::proto::Packet>, Vec<SubscriptionUpdate>), super::Error> {
        let subscription_updates = match packet.take() {
            Some(crate::proto::Packet::SubAck {
                packet_identifier,
                qos,
            }) => self.sub_ack(packet_identifier, qos, packet_identifiers)?,

            Some(crate::proto::Packet::UnsubAck { packet_identifier }) => {
                self.unsub_ack(packet_identifier, packet_identifiers)?
            }

            other => {
                *packet = other;
                vec![]
            }
        };

        while let Poll::Ready(Some(subscription_update)) =
            self.subscriptions_updated_recv.poll_next_unpin(cx)
        {
            self.subscription_updates_waiting_to_be_sent
                .push_back(subscription_update);
        }

        let packets_waiting_to_be_sent = if self.subscription_updates_waiting_to_be_sent.is_empty() {
            vec![]
        } else {
            self.batch_updates(packet_identifiers)?
        };

        Ok((packets_waiting_to_be_sent, subscription_updates))
    }

    fn sub_ack(
        &mut self,
        packet_identifier: crate::proto::PacketIdentifier,
        qos: Vec<crate::proto::SubAckQos>,
        packet_identifiers: &mut super::PacketIdentifiers,
    ) -> Result<Vec<SubscriptionUpdate>, super::Error> {
        let subscribe_to = match self.subscription_updates_waiting_to_be_acked.front() {
            Some((expected, BatchedSubscriptionUpdate::Subscribe(subscribe_to)))
                if *expected == packet_identifier =>
            {
                if subscribe_to.len() != qos.len() {
                    return Err(super::Error::SubAckDoesNotContainEnoughQoS(
                        packet_identifier,
                        subscribe_to.len(),
                        qos.len(),
                    ));
                }

                match self.subscription_updates_waiting_to_be_acked.pop_front() {
                    Some((_, BatchedSubscriptionUpdate::Subscribe(subscribe_to))) => subscribe_to,
                    _ => unreachable!("front was just matched as a SUBSCRIBE"),
                }
            }

            Some((expected, BatchedSubscriptionUpdate::Subscribe(_))) => {
                return Err(super::Error::UnexpectedSubAck(
                    packet_identifier,
                    super::UnexpectedSubUnsubAckReason::Expected(*expected),
                ));
            }

            Some((expected, BatchedSubscriptionUpdate::Unsubscribe(_))) => {
                return Err(super::Error::UnexpectedSubAck(
                    packet_identifier,
                    super::UnexpectedSubUnsubAckReason::ExpectedUnsubAck(*expected),
                ));
            }

            None => {
                return Err(super::Error::UnexpectedSubAck(
                    packet_identifier,
                    super::UnexpectedSubUnsubAckReason::DidNotExpect,
                ));
            }
        };

        packet_identifiers.discard(packet_identifier);

        // A downgraded or rejected subscription is recorded with the QoS we asked for. The error resets the session,
        // which resends every recorded subscription.
        let mut err = None;
        let mut subscription_updates = vec![];

        for (crate::proto::SubscribeTo { topic_filter, qos: expected_qos }, qos) in
            subscribe_to.into_iter().zip(qos)
        {
            match qos {
                crate::proto::SubAckQos::Success(actual_qos) if actual_qos >= expected_qos => {
                    log::debug!("Subscribed to {} with {:?}", topic_filter, actual_qos);
                    self.subscriptions.insert(topic_filter.clone(), actual_qos);
                    subscription_updates.push(SubscriptionUpdate::Subscribe(
                        crate::proto::SubscribeTo {
                            topic_filter,
                            qos: actual_qos,
                        },
                    ));
                }

                crate::proto::SubAckQos::Success(actual_qos) => {
                    err.get_or_insert_with(|| {
                        super::Error::SubscriptionDowngraded(
                            topic_filter.clone(),
                            expected_qos,
                            actual_qos,
                        )
                    });
                    self.subscriptions.insert(topic_filter, expected_qos);
                }

                crate::proto::SubAckQos::Failure => {
                    err.get_or_insert(super::Error::SubscriptionRejectedByServer);
                    self.subscriptions.insert(topic_filter, expected_qos);
                }
            }
        }

        match err {
            Some(err) => Err(err),
            None => Ok(subscription_updates),
        }
    }

    fn unsub_ack(
        &mut self,
        packet_identifier: crate::proto::PacketIdentifier,
        packet_identifiers: &mut super::PacketIdentifiers,
    ) -> Result<Vec<SubscriptionUpdate>, super::Error> {
        let unsubscribe_from = match self.subscription_updates_waiting_to_be_acked.front() {
            Some((expected, BatchedSubscriptionUpdate::Unsubscribe(_)))
                if *expected == packet_identifier =>
            {
                match self.subscription_updates_waiting_to_be_acked.pop_front() {
                    Some((_, BatchedSubscriptionUpdate::Unsubscribe(unsubscribe_from))) => {
                        unsubscribe_from
                    }
                    _ => unreachable!("front was just matched as an UNSUBSCRIBE"),
                }
            }

            Some((expected, BatchedSubscriptionUpdate::Unsubscribe(_))) => {
                return Err(super::Error::UnexpectedUnsubAck(
                    packet_identifier,
                    super::UnexpectedSubUnsubAckReason::Expected(*expected),
                ));
            }

            Some((expected, BatchedSubscriptionUpdate::Subscribe(_))) => {
                return Err(super::Error::UnexpectedUnsubAck(
                    packet_identifier,
                    super::UnexpectedSubUnsubAckReason::ExpectedSubAck(*expected),
                ));
            }

            None => {
                return Err(super::Error::UnexpectedUnsubAck(
                    packet_identifier,
                    super::UnexpectedSubUnsubAckReason::DidNotExpect,
                ));
            }
        };

        packet_identifiers.discard(packet_identifier);

        Ok(unsubscribe_from
            .into_iter()
            .map(|topic_filter| {
                log::debug!("Unsubscribed from {}", topic_filter);
                self.subscriptions.remove(&topic_filter);
                SubscriptionUpdate::Unsubscribe(topic_filter)
            })
            .collect())
    }

    /// Turns the queued updates into at most one SUBSCRIBE and one UNSUBSCRIBE.
    ///
    /// The queue can hold a subscribe and a later unsubscribe of the same filter, or the reverse, so the updates are applied
    /// in order to a copy of the expected subscriptions and only the net difference is sent.
    fn batch_updates(
        &mut self,
        packet_identifiers: &mut super::PacketIdentifiers,
    ) -> Result<Vec<crate::proto::Packet>, super::Error> {
        let current_subscriptions = self.expected_subscriptions();

        let mut target_subscriptions = current_subscriptions.clone();
        for subscription_update in self.subscription_updates_waiting_to_be_sent.drain(..) {
            match subscription_update {
                SubscriptionUpdate::Subscribe(crate::proto::SubscribeTo { topic_filter, qos }) => {
                    target_subscriptions.insert(topic_filter, qos);
                }
                SubscriptionUpdate::Unsubscribe(topic_filter) => {
                    target_subscriptions.remove(&topic_filter);
                }
            }
        }

        // BTreeMap iteration keeps both lists sorted by topic filter
        let pending_subscriptions: Vec<_> = target_subscriptions
            .iter()
            .filter(|&(topic_filter, qos)| current_subscriptions.get(topic_filter) != Some(qos))
            .map(|(topic_filter, &qos)| crate::proto::SubscribeTo {
                topic_filter: topic_filter.clone(),
                qos,
            })
            .collect();

        let pending_unsubscriptions: Vec<_> = current_subscriptions
            .keys()
            .filter(|&topic_filter| !target_subscriptions.contains_key(topic_filter))
            .cloned()
            .collect();

        let mut packets_waiting_to_be_sent = vec![];

        // A failure to reserve an identifier is only returned if nothing could be sent,
        // so that a SUBSCRIBE that did get an identifier is not thrown away.
        let mut err = None;

        if !pending_subscriptions.is_empty() {
            match packet_identifiers.reserve() {
                Ok(packet_identifier) => {
                    self.subscription_updates_waiting_to_be_acked.push_back((
                        packet_identifier,
                        BatchedSubscriptionUpdate::Subscribe(pending_subscriptions.clone()),
                    ));

                    packets_waiting_to_be_sent.push(crate::proto::Packet::Subscribe {
                        packet_identifier,
                        subscribe_to: pending_subscriptions,
                    });
                }

                Err(reserve_err) => {
                    err = Some(reserve_err);
                    self.subscription_updates_waiting_to_be_sent.extend(
                        pending_subscriptions
                            .into_iter()
                            .map(SubscriptionUpdate::Subscribe),
                    );
                }
            }
        }

        if !pending_unsubscriptions.is_empty() {
            match packet_identifiers.reserve() {
                Ok(packet_identifier) => {
                    self.subscription_updates_waiting_to_be_acked.push_back((
                        packet_identifier,
                        BatchedSubscriptionUpdate::Unsubscribe(pending_unsubscriptions.clone()),
                    ));

                    packets_waiting_to_be_sent.push(crate::proto::Packet::Unsubscribe {
                        packet_identifier,
                        unsubscribe_from: pending_unsubscriptions,
                    });
                }

                Err(reserve_err) => {
                    err = Some(reserve_err);
                    self.subscription_updates_waiting_to_be_sent.extend(
                        pending_unsubscriptions
                            .into_iter()
                            .map(SubscriptionUpdate::Unsubscribe),
                    );
                }
            }
        }

        match err {
            Some(err) if packets_waiting_to_be_sent.is_empty() => Err(err),
            _ => Ok(packets_waiting_to_be_sent),
        }
    }

    /// The subscriptions the server will have once every SUBSCRIBE and UNSUBSCRIBE in flight has been acked.
    fn expected_subscriptions(&self) -> std::collections::BTreeMap<String, crate::proto::QoS> {
        let mut subscriptions = self.subscriptions.clone();

        for (_, subscription_update) in &self.subscription_updates_waiting_to_be_acked {
            match subscription_update {
                BatchedSubscriptionUpdate::Subscribe(subscribe_to) => {
                    for crate::proto::SubscribeTo { topic_filter, qos } in subscribe_to {
                        subscriptions.insert(topic_filter.clone(), *qos);
                    }
                }

                BatchedSubscriptionUpdate::Unsubscribe(unsubscribe_from) => {
                    for topic_filter in unsubscribe_from {
                        subscriptions.remove(topic_filter);
                    }
                }
            }
        }

        subscriptions
    }

    /// Packets to send at the start of a new connection.
    ///
    /// A reset session gets one SUBSCRIBE with every subscription, including requests that were never acked.
    /// A resumed session only gets the unacked SUBSCRIBE and UNSUBSCRIBE packets again.
    pub(super) fn new_connection(
        &mut self,
        reset_session: bool,
        packet_identifiers: &mut super::PacketIdentifiers,
    ) -> Result<Vec<crate::proto::Packet>, super::Error> {
        if !reset_session {
            return Ok(self
                .subscription_updates_waiting_to_be_acked
                .iter()
                .map(
                    |(packet_identifier, subscription_update)| match subscription_update {
                        BatchedSubscriptionUpdate::Subscribe(subscribe_to) => {
                            crate::proto::Packet::Subscribe {
                                packet_identifier: *packet_identifier,
                                subscribe_to: subscribe_to.clone(),
                            }
                        }

                        BatchedSubscriptionUpdate::Unsubscribe(unsubscribe_from) => {
                            crate::proto::Packet::Unsubscribe {
                                packet_identifier: *packet_identifier,
                                unsubscribe_from: unsubscribe_from.clone(),
                            }
                        }
                    },
                )
                .collect());
        }

        let mut subscriptions = std::mem::take(&mut self.subscriptions);

        // Apply the unacked changes in the order they were requested
        for (packet_identifier, subscription_update) in
            std::mem::take(&mut self.subscription_updates_waiting_to_be_acked)
        {
            packet_identifiers.discard(packet_identifier);

            match subscription_update {
                BatchedSubscriptionUpdate::Subscribe(subscribe_to) => {
                    for crate::proto::SubscribeTo { topic_filter, qos } in subscribe_to {
                        subscriptions.insert(topic_filter, qos);
                    }
                }

                BatchedSubscriptionUpdate::Unsubscribe(unsubscribe_from) => {
                    for topic_filter in unsubscribe_from {
                        subscriptions.remove(&topic_filter);
                    }
                }
            }
        }

        if subscriptions.is_empty() {
            return Ok(vec![]);
        }

        let subscribe_to: Vec<_> = subscriptions
            .into_iter()
            .map(|(topic_filter, qos)| crate::proto::SubscribeTo { topic_filter, qos })
            .collect();

        let packet_identifier = packet_identifiers.reserve()?;
        self.subscription_updates_waiting_to_be_acked.push_back((
            packet_identifier,
            BatchedSubscriptionUpdate::Subscribe(subscribe_to.clone()),
        ));

        Ok(vec![crate::proto::Packet::Subscribe {
            packet_identifier,
            subscribe_to,
        }])
    }

    pub(super) fn update_subscription(
        &mut self,
        subscription_update: SubscriptionUpdate,
    ) -> Result<(), UpdateSubscriptionError> {
        subscription_update.validate()?;
        self.subscription_updates_waiting_to_be_sent
            .push_back(subscription_update);
        Ok(())
    }

    pub(super) fn update_subscription_handle(&self) -> UpdateSubscriptionHandle {
        UpdateSubscriptionHandle(self.subscriptions_updated_send.clone())
    }
}

impl Default for State {
    fn default() -> Self {
        let (subscriptions_updated_send, subscriptions_updated_recv) =
            futures::channel::mpsc::channel(0);

        State {
            subscriptions: Default::default(),

            subscriptions_updated_send,
            subscriptions_updated_recv,

            subscription_updates_waiting_to_be_sent: Default::default(),
            subscription_updates_waiting_to_be_acked: Default::default(),
        }
    }
}

/// The kind of subscription update
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionUpdate {
    Subscribe(crate::proto::SubscribeTo),
    Unsubscribe(String),
}

impl SubscriptionUpdate {
    fn validate(&self) -> Result<(), UpdateSubscriptionError> {
        let topic_filter = match self {
            SubscriptionUpdate::Subscribe(subscribe_to) => &subscribe_to.topic_filter,
            SubscriptionUpdate::Unsubscribe(topic_filter) => topic_filter,
        };

        crate::proto::validate_topic_filter(topic_filter)
            .map_err(|err| UpdateSubscriptionError::InvalidTopicFilter(topic_filter.clone(), err))
    }
}

#[derive(Debug)]
enum BatchedSubscriptionUpdate {
    Subscribe(Vec<crate::proto::SubscribeTo>),
    Unsubscribe(Vec<String>),
}

/// Used to update subscriptions
#[derive(Clone, Debug)]
pub struct UpdateSubscriptionHandle(futures::channel::mpsc::Sender<SubscriptionUpdate>);

impl UpdateSubscriptionHandle {
    /// Subscribe to a topic with the given parameters.
    ///
    /// This resolves when the client has received the request, not when the server has acked it.
    /// The client resubscribes by itself after a reconnect that resets the session, and it batches updates,
    /// so a request may be sent several times or, if cancelled out by a later unsubscribe, never.
    ///
    /// Watch for an [`crate::Event::SubscriptionUpdates`] containing this topic filter to know when the server has acked it.
    /// The QoS in that event may be higher than the one requested here.
    pub async fn subscribe(
        &mut self,
        subscribe_to: crate::proto::SubscribeTo,
    ) -> Result<(), UpdateSubscriptionError> {
        self.send(SubscriptionUpdate::Subscribe(subscribe_to)).await
    }

    /// Unsubscribe from the given topic filter.
    ///
    /// Like [`UpdateSubscriptionHandle::subscribe`], this resolves when the client has received the request.
    pub async fn unsubscribe(
        &mut self,
        unsubscribe_from: String,
    ) -> Result<(), UpdateSubscriptionError> {
        self.send(SubscriptionUpdate::Unsubscribe(unsubscribe_from))
            .await
    }

    async fn send(
        &mut self,
        subscription_update: SubscriptionUpdate,
    ) -> Result<(), UpdateSubscriptionError> {
        subscription_update.validate()?;
        self.0
            .send(subscription_update)
            .await
            .map_err(|_| UpdateSubscriptionError::ClientDoesNotExist)
    }
}

#[derive(Clone, Debug)]
pub enum UpdateSubscriptionError {
    ClientDoesNotExist,
    InvalidTopicFilter(String, crate::proto::InvalidTopic),
}

impl std::fmt::Display for UpdateSubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateSubscriptionError::ClientDoesNotExist => f.write_str("client does not exist"),
            UpdateSubscriptionError::InvalidTopicFilter(topic_filter, _) => {
                write!(f, "invalid topic filter {:?}", topic_filter)
            }
        }
    }
}

impl std::error::Error for UpdateSubscriptionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpdateSubscriptionError::ClientDoesNotExist => None,
            UpdateSubscriptionError::InvalidTopicFilter(_, err) => Some(err),
        }
    }
}
