use std::task::{Context, Poll};

use futures::{SinkExt, StreamExt};

#[derive(Debug)]
pub(super) struct State {
    publish_request_send: futures::channel::mpsc::Sender<PublishRequest>,
    publish_request_recv: futures::channel::mpsc::Receiver<PublishRequest>,

    publish_requests_waiting_to_be_sent: std::collections::VecDeque<PublishRequest>,

    /// PUBLISH packets sent by us, waiting for a corresponding PUBACK or PUBREC
    waiting_to_be_acked: std::collections::BTreeMap<crate::proto::PacketIdentifier, InFlight>,

    /// Publications for which we sent a PUBREC, waiting for the corresponding PUBREL before they are delivered
    waiting_to_be_released:
        std::collections::BTreeMap<crate::proto::PacketIdentifier, crate::ReceivedPublication>,

    /// PUBLISH packets sent by us that were PUBREC'd, waiting for a corresponding PUBCOMP
    waiting_to_be_completed: std::collections::BTreeMap<crate::proto::PacketIdentifier, InFlight>,
}

/// An outgoing QoS 1 or 2 publication that the server has not finished acknowledging.
#[derive(Debug)]
struct InFlight {
    ack_sender: futures::channel::oneshot::Sender<()>,

    /// The PUBLISH packet to resend on reconnect, already marked DUP
    packet: crate::proto::Packet,
}

impl State {
    pub(super) fn poll(
        &mut self,
        cx: &mut Context<'_>,
        packet: &mut Option<crate::proto::Packet>,
        packet_identifiers: &mut super::PacketIdentifiers,
    ) -> Result<
        (
            Vec<crate::proto::Packet>,
            Option<crate::ReceivedPublication>,
        ),
        super::Error,
    > {
        let mut packets_waiting_to_be_sent = vec![];
        let mut publication_received = None;

        match packet.take() {
            Some(crate::proto::Packet::PubAck { packet_identifier }) => {
                match self.waiting_to_be_acked.remove(&packet_identifier) {
                    Some(in_flight) => {
                        packet_identifiers.discard(packet_identifier);
                        in_flight.ack();
                    }
                    None => log::warn!("ignoring PUBACK {} for a PUBLISH we never sent", packet_identifier),
                }
            }

            Some(crate::proto::Packet::PubRec { packet_identifier }) => {
                match self.waiting_to_be_acked.remove(&packet_identifier) {
                    Some(in_flight) => {
                        self.waiting_to_be_completed.insert(packet_identifier, in_flight);
                    }
                    None => log::warn!("ignoring PUBREC {} for a PUBLISH we never sent", packet_identifier),
                }

                packets_waiting_to_be_sent.push(crate::proto::Packet::PubRel { packet_identifier });
            }

            Some(crate::proto::Packet::PubComp { packet_identifier }) => {
                match self.waiting_to_be_completed.remove(&packet_identifier) {
                    Some(in_flight) => {
                        packet_identifiers.discard(packet_identifier);
                        in_flight.ack();
                    }
                    None => log::warn!("ignoring PUBCOMP {} for a PUBREL we never sent", packet_identifier),
                }
            }

            Some(crate::proto::Packet::Publish {
                packet_identifier_dup_qos,
                retain,
                topic_name,
                payload,
            }) => {
                let publication = |dup| crate::ReceivedPublication {
                    topic_name,
                    dup,
                    qos: packet_identifier_dup_qos.qos(),
                    retain,
                    payload,
                };

                match packet_identifier_dup_qos {
                    crate::proto::PacketIdentifierDupQoS::AtMostOnce => {
                        publication_received = Some(publication(false));
                    }

                    crate::proto::PacketIdentifierDupQoS::AtLeastOnce(packet_identifier, dup) => {
                        publication_received = Some(publication(dup));
                        packets_waiting_to_be_sent
                            .push(crate::proto::Packet::PubAck { packet_identifier });
                    }

                    crate::proto::PacketIdentifierDupQoS::ExactlyOnce(packet_identifier, dup) => {
                        match self.waiting_to_be_released.entry(packet_identifier) {
                            // Already received and PUBREC'd, but the server did not get our PUBREC. Send it again.
                            std::collections::btree_map::Entry::Occupied(_) => {
                                if !dup {
                                    return Err(super::Error::DuplicateExactlyOncePublishPacketNotMarkedDuplicate(packet_identifier));
                                }
                            }

                            // Held until PUBREL so that a redelivery after a reconnect is not delivered twice.
                            std::collections::btree_map::Entry::Vacant(entry) => {
                                entry.insert(publication(dup));
                            }
                        }

                        packets_waiting_to_be_sent
                            .push(crate::proto::Packet::PubRec { packet_identifier });
                    }
                }
            }

            Some(crate::proto::Packet::PubRel { packet_identifier }) => {
                match self.waiting_to_be_released.remove(&packet_identifier) {
                    Some(publication) => publication_received = Some(publication),
                    None => log::warn!("ignoring PUBREL {} for a PUBREC we never sent", packet_identifier),
                }

                packets_waiting_to_be_sent
                    .push(crate::proto::Packet::PubComp { packet_identifier });
            }

            other => *packet = other,
        }

        while let Poll::Ready(Some(publish_request)) = self.publish_request_recv.poll_next_unpin(cx) {
            self.publish_requests_waiting_to_be_sent
                .push_back(publish_request);
        }

        while let Some(PublishRequest {
            publication,
            ack_sender,
        }) = self.publish_requests_waiting_to_be_sent.pop_front()
        {
            let crate::proto::Publication {
                topic_name,
                qos,
                retain,
                payload,
            } = publication;

            if qos == crate::proto::QoS::AtMostOnce {
                packets_waiting_to_be_sent.push(crate::proto::Packet::Publish {
                    packet_identifier_dup_qos: crate::proto::PacketIdentifierDupQoS::AtMostOnce,
                    retain,
                    topic_name,
                    payload,
                });

                let _ = ack_sender.send(());
                continue;
            }

            let packet_identifier = match packet_identifiers.reserve() {
                Ok(packet_identifier) => packet_identifier,
                Err(err) => {
                    self.publish_requests_waiting_to_be_sent
                        .push_front(PublishRequest {
                            publication: crate::proto::Publication {
                                topic_name,
                                qos,
                                retain,
                                payload,
                            },
                            ack_sender,
                        });
                    return Err(err);
                }
            };

            let packet_identifier_dup_qos = |dup| match qos {
                crate::proto::QoS::AtLeastOnce => {
                    crate::proto::PacketIdentifierDupQoS::AtLeastOnce(packet_identifier, dup)
                }
                _ => crate::proto::PacketIdentifierDupQoS::ExactlyOnce(packet_identifier, dup),
            };

            packets_waiting_to_be_sent.push(crate::proto::Packet::Publish {
                packet_identifier_dup_qos: packet_identifier_dup_qos(false),
                retain,
                topic_name: topic_name.clone(),
                payload: payload.clone(),
            });

            self.waiting_to_be_acked.insert(
                packet_identifier,
                InFlight {
                    ack_sender,
                    packet: crate::proto::Packet::Publish {
                        packet_identifier_dup_qos: packet_identifier_dup_qos(true),
                        retain,
                        topic_name,
                        payload,
                    },
                },
            );
        }

        Ok((packets_waiting_to_be_sent, publication_received))
    }

    /// Packets to resend at the start of a new connection.
    pub(super) fn new_connection(&mut self, reset_session: bool) -> Vec<crate::proto::Packet> {
        if reset_session {
            // The server has forgotten our PUBREC'd publications, so restart their ExactlyOnce flow from PUBLISH.
            self.waiting_to_be_acked
                .append(&mut self.waiting_to_be_completed);

            // The server will send these again as new publications.
            self.waiting_to_be_released.clear();
        }

        self.waiting_to_be_acked
            .values()
            .map(|in_flight| in_flight.packet.clone())
            .chain(
                self.waiting_to_be_released
                    .keys()
                    .map(|&packet_identifier| crate::proto::Packet::PubRec { packet_identifier }),
            )
            .chain(
                self.waiting_to_be_completed
                    .keys()
                    .map(|&packet_identifier| crate::proto::Packet::PubRel { packet_identifier }),
            )
            .collect()
    }

    pub(super) fn publish(
        &mut self,
        publication: crate::proto::Publication,
    ) -> Result<futures::channel::oneshot::Receiver<()>, PublishError> {
        validate_publication(&publication)?;

        let (ack_sender, ack_receiver) = futures::channel::oneshot::channel();
        self.publish_requests_waiting_to_be_sent
            .push_back(PublishRequest {
                publication,
                ack_sender,
            });
        Ok(ack_receiver)
    }

    pub(super) fn publish_handle(&self) -> PublishHandle {
        PublishHandle(self.publish_request_send.clone())
    }
}

impl Default for State {
    fn default() -> Self {
        let (publish_request_send, publish_request_recv) = futures::channel::mpsc::channel(0);

        State {
            publish_request_send,
            publish_request_recv,

            publish_requests_waiting_to_be_sent: Default::default(),
            waiting_to_be_acked: Default::default(),
            waiting_to_be_released: Default::default(),
            waiting_to_be_completed: Default::default(),
        }
    }
}

impl InFlight {
    fn ack(self) {
        if self.ack_sender.send(()).is_err() {
            log::debug!("could not send ack for publish request because ack receiver has been dropped");
        }
    }
}

/// Used to publish messages to the server
#[derive(Clone, Debug)]
pub struct PublishHandle(futures::channel::mpsc::Sender<PublishRequest>);

impl PublishHandle {
    /// Publish the given message to the server.
    ///
    /// Resolves when the publication has been acknowledged at its QoS. For QoS 0 that is as soon as the client has queued it.
    pub async fn publish(
        &mut self,
        publication: crate::proto::Publication,
    ) -> Result<(), PublishError> {
        validate_publication(&publication)?;

        let (ack_sender, ack_receiver) = futures::channel::oneshot::channel();

        self.0
            .send(PublishRequest {
                publication,
                ack_sender,
            })
            .await
            .map_err(|_| PublishError::ClientDoesNotExist)?;

        ack_receiver
            .await
            .map_err(|_| PublishError::ClientDoesNotExist)
    }
}

fn validate_publication(publication: &crate::proto::Publication) -> Result<(), PublishError> {
    crate::proto::validate_topic_name(&publication.topic_name)
        .map_err(|err| PublishError::InvalidTopicName(publication.topic_name.clone(), err))
}

#[derive(Debug)]
pub enum PublishError {
    ClientDoesNotExist,
    InvalidTopicName(String, crate::proto::InvalidTopic),
}

impl std::fmt::Display for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishError::ClientDoesNotExist => f.write_str("client does not exist"),
            PublishError::InvalidTopicName(topic_name, _) => {
                write!(f, "cannot publish to topic {:?}", topic_name)
            }
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::ClientDoesNotExist => None,
            PublishError::InvalidTopicName(_, err) => Some(err),
        }
    }
}

#[derive(Debug)]
struct PublishRequest {
    publication: crate::proto::Publication,
    ack_sender: futures::channel::oneshot::Sender<()>,
}
