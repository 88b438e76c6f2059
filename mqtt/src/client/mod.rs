use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{SinkExt, Stream, StreamExt};

mod connect;
mod ping;
mod publish;
mod subscriptions;

pub use self::publish::{PublishError, PublishHandle};
pub use self::subscriptions::{
    SubscriptionUpdate, UpdateSubscriptionError, UpdateSubscriptionHandle,
};

/// An MQTT v3.1.1 client.
///
/// A `Client` is a [`Stream`] of [`Event`]s. Once it has connected to the server, it reconnects automatically
/// whenever the connection is broken, and keeps the session state in memory across reconnects.
///
/// If the very first connection attempt fails, or the server refuses the first CONNECT, the stream yields that error and ends.
///
/// Publish messages to the server using the handle returned by [`Client::publish_handle`].
///
/// Subscribe to and unsubscribe from topics using the handle returned by [`Client::update_subscription_handle`].
///
/// Apart from the first-connection failure above, the [`Stream`] only ends when the client hits an unrecoverable error
/// or is told to shut down gracefully using the handle returned by [`Client::shutdown_handle`].
/// The `Client` becomes unusable after it has returned `None` and should be dropped.
#[derive(Debug)]
pub struct Client<IoS>(ClientState<IoS>)
where
    IoS: IoSource;

impl<IoS> Client<IoS>
where
    IoS: IoSource,
{
    /// Create a new client with the given parameters
    ///
    /// * `client_id`
    ///
    ///     The client identifier and session mode. [`crate::proto::ClientId::IdWithCleanSession`] starts a clean session on every connection.
    ///     [`crate::proto::ClientId::IdWithExistingSession`] resumes the server-side session where possible.
    ///
    /// * `username`, `password`
    ///
    ///     Optional credentials for the server.
    ///
    /// * `will`
    ///
    ///     Optional message the server publishes if this client disconnects ungracefully.
    ///
    /// * `io_source`
    ///
    ///     The MQTT protocol is layered onto the I/O object returned by this source.
    ///
    /// * `max_reconnect_back_off`
    ///
    ///     Every reconnection failure will double the back-off period, to a maximum of this value.
    ///
    /// * `keep_alive`
    ///
    ///     The keep-alive time advertised to the server. The client will ping the server at half this interval.
    ///     Zero disables keep-alive.
    pub fn new(
        client_id: crate::proto::ClientId,
        username: Option<String>,
        password: Option<String>,
        will: Option<crate::proto::Publication>,
        io_source: IoS,
        max_reconnect_back_off: std::time::Duration,
        keep_alive: std::time::Duration,
    ) -> Self {
        let (shutdown_send, shutdown_recv) = futures::channel::mpsc::channel(0);

        Client(ClientState::Up {
            client_id,
            username,
            password,
            will,
            keep_alive,

            shutdown_send,
            shutdown_recv,

            packet_identifiers: Default::default(),

            connect: self::connect::Connect::new(io_source, max_reconnect_back_off),
            ping: self::ping::State::BeginWaitingForNextPing,
            publish: Default::default(),
            subscriptions: Default::default(),

            packets_waiting_to_be_sent: Default::default(),
        })
    }

    /// Queues a message to be published to the server.
    ///
    /// The returned future resolves when the publication has been acknowledged at its QoS.
    pub fn publish(
        &mut self,
        publication: crate::proto::Publication,
    ) -> impl Future<Output = Result<(), PublishError>> {
        let ack_receiver = match &mut self.0 {
            ClientState::Up { publish, .. } => publish.publish(publication),
            ClientState::ShuttingDown { .. } | ClientState::ShutDown { .. } => {
                Err(PublishError::ClientDoesNotExist)
            }
        };

        async move {
            match ack_receiver {
                Ok(ack_receiver) => ack_receiver
                    .await
                    .map_err(|_| PublishError::ClientDoesNotExist),
                Err(err) => Err(err),
            }
        }
    }

    /// Returns a handle that can be used to publish messages to the server
    pub fn publish_handle(&self) -> Result<PublishHandle, PublishError> {
        match &self.0 {
            ClientState::Up { publish, .. } => Ok(publish.publish_handle()),
            ClientState::ShuttingDown { .. } | ClientState::ShutDown { .. } => {
                Err(PublishError::ClientDoesNotExist)
            }
        }
    }

    /// Subscribes to a topic with the given parameters
    pub fn subscribe(
        &mut self,
        subscribe_to: crate::proto::SubscribeTo,
    ) -> Result<(), UpdateSubscriptionError> {
        match &mut self.0 {
            ClientState::Up { subscriptions, .. } => {
                subscriptions.update_subscription(SubscriptionUpdate::Subscribe(subscribe_to))
            }

            ClientState::ShuttingDown { .. } | ClientState::ShutDown { .. } => {
                Err(UpdateSubscriptionError::ClientDoesNotExist)
            }
        }
    }

    /// Unsubscribes from the given topic filter
    pub fn unsubscribe(&mut self, unsubscribe_from: String) -> Result<(), UpdateSubscriptionError> {
        match &mut self.0 {
            ClientState::Up { subscriptions, .. } => {
                subscriptions.update_subscription(SubscriptionUpdate::Unsubscribe(unsubscribe_from))
            }

            ClientState::ShuttingDown { .. } | ClientState::ShutDown { .. } => {
                Err(UpdateSubscriptionError::ClientDoesNotExist)
            }
        }
    }

    /// Returns a handle that can be used to update subscriptions
    pub fn update_subscription_handle(
        &self,
    ) -> Result<UpdateSubscriptionHandle, UpdateSubscriptionError> {
        match &self.0 {
            ClientState::Up { subscriptions, .. } => Ok(subscriptions.update_subscription_handle()),
            ClientState::ShuttingDown { .. } | ClientState::ShutDown { .. } => {
                Err(UpdateSubscriptionError::ClientDoesNotExist)
            }
        }
    }

    /// Returns a handle that can be used to signal the client to shut down
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle, ShutdownError> {
        match &self.0 {
            ClientState::Up { shutdown_send, .. } => Ok(ShutdownHandle(shutdown_send.clone())),
            ClientState::ShuttingDown { .. } | ClientState::ShutDown { .. } => {
                Err(ShutdownError::ClientDoesNotExist)
            }
        }
    }

    fn begin_shutting_down(&mut self, reason: Option<Error>) {
        self.0 = match std::mem::replace(&mut self.0, ClientState::ShutDown { reason: None }) {
            ClientState::Up { connect, .. } => {
                match &reason {
                    Some(err) => log::warn!("Shutting down because of error: {}", err),
                    None => log::info!("Shutting down..."),
                }

                ClientState::ShuttingDown {
                    connect,
                    sent_disconnect: false,
                    reason,
                }
            }

            state => state,
        };
    }
}

// The connect and timer futures are boxed, and nothing else is structurally pinned.
impl<IoS> Unpin for Client<IoS> where IoS: IoSource {}

impl<IoS> Stream for Client<IoS>
where
    IoS: IoSource,
{
    type Item = Result<Event, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.0 {
                ClientState::Up {
                    client_id,
                    username,
                    password,
                    will,
                    keep_alive,

                    shutdown_recv,

                    packet_identifiers,

                    connect,
                    ping,
                    publish,
                    subscriptions,

                    packets_waiting_to_be_sent,
                    ..
                } => {
                    if let Poll::Ready(Some(())) = shutdown_recv.poll_next_unpin(cx) {
                        this.begin_shutting_down(None);
                        continue;
                    }

                    let self::connect::Connected {
                        framed,
                        new_connection,
                        reset_session,
                    } = match connect.poll(
                        cx,
                        username.as_deref(),
                        password.as_deref(),
                        will.as_ref(),
                        client_id,
                        *keep_alive,
                    ) {
                        Poll::Ready(Ok(connected)) => connected,
                        Poll::Ready(Err(err)) => {
                            log::warn!("could not connect to server: {}", err);
                            this.0 = ClientState::ShutDown { reason: Some(err) };
                            continue;
                        }
                        Poll::Pending => return Poll::Pending,
                    };

                    if new_connection {
                        log::debug!("New connection established");

                        packets_waiting_to_be_sent.clear();

                        ping.new_connection();

                        packets_waiting_to_be_sent.extend(publish.new_connection(reset_session));

                        match subscriptions.new_connection(reset_session, packet_identifiers) {
                            Ok(packets) => packets_waiting_to_be_sent.extend(packets),
                            Err(err) => {
                                this.begin_shutting_down(Some(err));
                                continue;
                            }
                        }

                        return Poll::Ready(Some(Ok(Event::NewConnection { reset_session })));
                    }

                    match client_poll(
                        cx,
                        framed,
                        *keep_alive,
                        packets_waiting_to_be_sent,
                        packet_identifiers,
                        ping,
                        publish,
                        subscriptions,
                    ) {
                        Poll::Ready(Ok(event)) => return Poll::Ready(Some(Ok(event))),

                        Poll::Ready(Err(err)) => {
                            if err.is_user_error() {
                                this.begin_shutting_down(Some(err));
                                continue;
                            }

                            log::warn!("client will reconnect because of error: {}", err);

                            // Errors that leave the session in an unknown state force a clean session on the next connect.
                            // subscriptions::State relies on this to resend every subscription.
                            connect.reconnect(&err);

                            return Poll::Ready(Some(Ok(Event::Disconnected)));
                        }

                        Poll::Pending => return Poll::Pending,
                    }
                }

                ClientState::ShuttingDown {
                    connect,
                    sent_disconnect,
                    reason,
                } => {
                    if let Some(framed) = connect.framed() {
                        match send_disconnect(cx, framed, sent_disconnect) {
                            Poll::Ready(Ok(())) => (),
                            Poll::Ready(Err(err)) => log::warn!("couldn't send DISCONNECT: {}", err),
                            Poll::Pending => return Poll::Pending,
                        }
                    }

                    let reason = reason.take();
                    this.0 = ClientState::ShutDown { reason };
                }

                ClientState::ShutDown { reason } => {
                    return Poll::Ready(reason.take().map(Err));
                }
            }
        }
    }
}

/// This trait provides an I/O object that a [`Client`] can use.
///
/// The trait is automatically implemented for all [`FnMut`] that return a connection future.
pub trait IoSource {
    /// The I/O object
    type Io: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin;

    /// The connection future
    type Future: Future<Output = std::io::Result<Self::Io>>;

    /// Attempts the connection and returns a [`Future`] that resolves when the connection succeeds
    fn connect(&mut self) -> Self::Future;
}

impl<F, A, I> IoSource for F
where
    F: FnMut() -> A,
    A: Future<Output = std::io::Result<I>>,
    I: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    type Io = I;
    type Future = A;

    fn connect(&mut self) -> Self::Future {
        (self)()
    }
}

/// An event generated by the [`Client`]
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// The [`Client`] established a new connection to the server.
    NewConnection {
        /// Whether the session was reset as part of this new connection or not
        reset_session: bool,
    },

    /// The connection to the server was lost. The [`Client`] will reconnect.
    Disconnected,

    /// A publication received from the server
    Publication(ReceivedPublication),

    /// Subscription updates acked by the server
    SubscriptionUpdates(Vec<SubscriptionUpdate>),
}

/// A message that was received from the server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedPublication {
    pub topic_name: String,
    pub dup: bool,
    pub qos: crate::proto::QoS,
    pub retain: bool,
    pub payload: bytes::Bytes,
}

/// Used to signal the [`Client`] to shut down
#[derive(Clone, Debug)]
pub struct ShutdownHandle(futures::channel::mpsc::Sender<()>);

impl ShutdownHandle {
    /// Signals the [`Client`] to shut down.
    ///
    /// This resolves when the `Client` is guaranteed the notification,
    /// not necessarily when the `Client` has completed shutting down.
    pub async fn shutdown(&mut self) -> Result<(), ShutdownError> {
        self.0
            .send(())
            .await
            .map_err(|_| ShutdownError::ClientDoesNotExist)
    }
}

#[derive(Debug)]
enum ClientState<IoS>
where
    IoS: IoSource,
{
    Up {
        client_id: crate::proto::ClientId,
        username: Option<String>,
        password: Option<String>,
        will: Option<crate::proto::Publication>,
        keep_alive: std::time::Duration,

        shutdown_send: futures::channel::mpsc::Sender<()>,
        shutdown_recv: futures::channel::mpsc::Receiver<()>,

        packet_identifiers: PacketIdentifiers,

        connect: self::connect::Connect<IoS>,
        ping: self::ping::State,
        publish: self::publish::State,
        subscriptions: self::subscriptions::State,

        /// Packets waiting to be written to the underlying `Framed`
        packets_waiting_to_be_sent: std::collections::VecDeque<crate::proto::Packet>,
    },

    ShuttingDown {
        connect: self::connect::Connect<IoS>,

        /// If the DISCONNECT packet has already been sent
        sent_disconnect: bool,

        /// The Error that caused the Client to transition away from Up, if any
        reason: Option<Error>,
    },

    ShutDown {
        /// The Error that caused the Client to transition away from Up, if any
        reason: Option<Error>,
    },
}

#[allow(clippy::too_many_arguments)]
fn client_poll<S>(
    cx: &mut Context<'_>,
    framed: &mut crate::logging_framed::LoggingFramed<S>,
    keep_alive: std::time::Duration,
    packets_waiting_to_be_sent: &mut std::collections::VecDeque<crate::proto::Packet>,
    packet_identifiers: &mut PacketIdentifiers,
    ping: &mut self::ping::State,
    publish: &mut self::publish::State,
    subscriptions: &mut self::subscriptions::State,
) -> Poll<Result<Event, Error>>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        // Begin sending any packets waiting to be sent
        while let Some(packet) = packets_waiting_to_be_sent.pop_front() {
            match framed.poll_ready_unpin(cx).map_err(Error::EncodePacket)? {
                Poll::Ready(()) => framed.start_send_unpin(packet).map_err(Error::EncodePacket)?,

                Poll::Pending => {
                    packets_waiting_to_be_sent.push_front(packet);
                    break;
                }
            }
        }

        // Finish sending. Pending only means the write will complete on a later poll.
        let _ = framed.poll_flush_unpin(cx).map_err(Error::EncodePacket)?;

        let mut continue_loop = false;

        let mut packet = match framed.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(
                packet @ (crate::proto::Packet::ConnAck { .. }
                | crate::proto::Packet::Connect { .. }
                | crate::proto::Packet::Disconnect
                | crate::proto::Packet::PingReq
                | crate::proto::Packet::Subscribe { .. }
                | crate::proto::Packet::Unsubscribe { .. }),
            ))) => return Poll::Ready(Err(Error::UnexpectedPacket(packet))),
            Poll::Ready(Some(Ok(packet))) => {
                // May have more packets after this one, so keep looping
                continue_loop = true;
                Some(packet)
            }
            Poll::Ready(Some(Err(err))) => return Poll::Ready(Err(Error::DecodePacket(err))),
            Poll::Ready(None) => return Poll::Ready(Err(Error::ServerClosedConnection)),
            Poll::Pending => None,
        };

        let mut new_packets_to_be_sent = vec![];

        // Ping
        if let Poll::Ready(packet) = ping.poll(cx, &mut packet, keep_alive)? {
            new_packets_to_be_sent.push(packet);
        }

        // Publish
        let (new_publish_packets, publication_received) =
            publish.poll(cx, &mut packet, packet_identifiers)?;
        new_packets_to_be_sent.extend(new_publish_packets);

        // Subscriptions
        let subscription_updates = if publication_received.is_some() {
            vec![]
        } else {
            let (new_subscription_packets, subscription_updates) =
                subscriptions.poll(cx, &mut packet, packet_identifiers)?;
            new_packets_to_be_sent.extend(new_subscription_packets);
            subscription_updates
        };

        assert!(packet.is_none(), "unconsumed packet");

        if !new_packets_to_be_sent.is_empty() {
            // Have new packets to send, so keep looping
            continue_loop = true;
            packets_waiting_to_be_sent.extend(new_packets_to_be_sent);
        }

        if let Some(publication_received) = publication_received {
            return Poll::Ready(Ok(Event::Publication(publication_received)));
        }

        if !subscription_updates.is_empty() {
            return Poll::Ready(Ok(Event::SubscriptionUpdates(subscription_updates)));
        }

        if !continue_loop {
            return Poll::Pending;
        }
    }
}

fn send_disconnect<S>(
    cx: &mut Context<'_>,
    framed: &mut crate::logging_framed::LoggingFramed<S>,
    sent_disconnect: &mut bool,
) -> Poll<Result<(), crate::proto::EncodeError>>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    if !*sent_disconnect {
        futures::ready!(framed.poll_ready_unpin(cx))?;
        framed.start_send_unpin(crate::proto::Packet::Disconnect)?;
        *sent_disconnect = true;
    }

    framed.poll_flush_unpin(cx)
}

/// Allocator for the identifiers of in-flight packets.
///
/// Identifiers are handed out in increasing order, skipping any that are still in use.
struct PacketIdentifiers {
    in_use: Box<[usize; PacketIdentifiers::SIZE]>,
    previous: crate::proto::PacketIdentifier,
}

impl PacketIdentifiers {
    /// Size of a bitset for every packet identifier
    ///
    /// Packet identifiers are u16's, so the number of usize's required
    /// = number of u16's / number of bits in a usize
    /// = pow(2, number of bits in a u16) / number of bits in a usize
    const SIZE: usize = (1 << 16) / usize::BITS as usize;

    fn reserve(&mut self) -> Result<crate::proto::PacketIdentifier, Error> {
        let mut current = self.previous;

        for _ in 0..u16::MAX {
            current += 1;

            let (block, mask) = self.entry(current);
            if *block & mask == 0 {
                *block |= mask;
                self.previous = current;
                return Ok(current);
            }
        }

        Err(Error::PacketIdentifiersExhausted)
    }

    fn discard(&mut self, packet_identifier: crate::proto::PacketIdentifier) {
        let (block, mask) = self.entry(packet_identifier);
        *block &= !mask;
    }

    fn entry(&mut self, packet_identifier: crate::proto::PacketIdentifier) -> (&mut usize, usize) {
        let packet_identifier = usize::from(packet_identifier.get());
        let bits = usize::BITS as usize;
        (
            &mut self.in_use[packet_identifier / bits],
            1 << (packet_identifier % bits),
        )
    }
}

impl std::fmt::Debug for PacketIdentifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketIdentifiers")
            .field("previous", &self.previous)
            .finish()
    }
}

impl Default for PacketIdentifiers {
    fn default() -> Self {
        PacketIdentifiers {
            in_use: Box::new([0; PacketIdentifiers::SIZE]),
            previous: crate::proto::PacketIdentifier::max_value(),
        }
    }
}

#[derive(Debug)]
pub enum Error {
    ConnectionRefused(crate::proto::ConnectionRefusedReason),
    DecodePacket(crate::proto::DecodeError),
    DuplicateExactlyOncePublishPacketNotMarkedDuplicate(crate::proto::PacketIdentifier),
    EncodePacket(crate::proto::EncodeError),
    IoSource(std::io::Error),
    PacketIdentifiersExhausted,
    PingTimeout,
    ServerClosedConnection,
    SubAckDoesNotContainEnoughQoS(crate::proto::PacketIdentifier, usize, usize),
    SubscriptionDowngraded(String, crate::proto::QoS, crate::proto::QoS),
    SubscriptionRejectedByServer,
    UnexpectedPacket(crate::proto::Packet),
    UnexpectedSubAck(crate::proto::PacketIdentifier, UnexpectedSubUnsubAckReason),
    UnexpectedUnsubAck(crate::proto::PacketIdentifier, UnexpectedSubUnsubAckReason),
}

#[derive(Clone, Copy, Debug)]
pub enum UnexpectedSubUnsubAckReason {
    DidNotExpect,
    Expected(crate::proto::PacketIdentifier),
    ExpectedSubAck(crate::proto::PacketIdentifier),
    ExpectedUnsubAck(crate::proto::PacketIdentifier),
}

impl Error {
    /// Errors caused by the caller's input rather than the connection. These end the client.
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::EncodePacket(err) => err.is_user_error(),
            _ => false,
        }
    }

    /// Whether the server-side session can still be trusted after this error.
    pub fn session_is_resumable(&self) -> bool {
        match self {
            Error::DecodePacket(crate::proto::DecodeError::Io(err)) => {
                err.kind() == std::io::ErrorKind::TimedOut
            }
            Error::PingTimeout | Error::ServerClosedConnection => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConnectionRefused(reason) => {
                write!(f, "server refused connection: {}", reason)
            }

            Error::DecodePacket(err) => write!(f, "could not decode packet: {}", err),

            Error::DuplicateExactlyOncePublishPacketNotMarkedDuplicate(packet_identifier) => write!(
                f,
                "server sent a new ExactlyOnce PUBLISH packet {} with the same packet identifier as another unacknowledged ExactlyOnce PUBLISH packet",
                packet_identifier,
            ),

            Error::EncodePacket(err) => write!(f, "could not encode packet: {}", err),

            Error::IoSource(err) => write!(f, "could not open connection to server: {}", err),

            Error::PacketIdentifiersExhausted => f.write_str("all packet identifiers exhausted"),

            Error::PingTimeout => f.write_str("server did not respond to PINGREQ"),

            Error::ServerClosedConnection => f.write_str("connection closed by server"),

            Error::SubAckDoesNotContainEnoughQoS(packet_identifier, expected, actual) => write!(
                f,
                "expected SUBACK {} to contain {} QoS's but it actually contained {}",
                packet_identifier, expected, actual,
            ),

            Error::SubscriptionDowngraded(topic_name, expected, actual) => write!(
                f,
                "server downgraded subscription for topic filter {:?} with QoS {:?} to {:?}",
                topic_name, expected, actual,
            ),

            Error::SubscriptionRejectedByServer => {
                f.write_str("server rejected one or more subscriptions")
            }

            Error::UnexpectedPacket(packet) => {
                write!(f, "server sent unexpected packet {:?}", packet)
            }

            Error::UnexpectedSubAck(packet_identifier, reason) => {
                write!(f, "received SUBACK {} but {}", packet_identifier, reason)
            }

            Error::UnexpectedUnsubAck(packet_identifier, reason) => {
                write!(f, "received UNSUBACK {} but {}", packet_identifier, reason)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DecodePacket(err) => Some(err),
            Error::EncodePacket(err) => Some(err),
            Error::IoSource(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for UnexpectedSubUnsubAckReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnexpectedSubUnsubAckReason::DidNotExpect => f.write_str("did not expect it"),
            UnexpectedSubUnsubAckReason::Expected(packet_identifier) => {
                write!(f, "expected {}", packet_identifier)
            }
            UnexpectedSubUnsubAckReason::ExpectedSubAck(packet_identifier) => {
                write!(f, "expected SUBACK {}", packet_identifier)
            }
            UnexpectedSubUnsubAckReason::ExpectedUnsubAck(packet_identifier) => {
                write!(f, "expected UNSUBACK {}", packet_identifier)
            }
        }
    }
}

#[derive(Debug)]
pub enum ShutdownError {
    ClientDoesNotExist,
}

impl std::fmt::Display for ShutdownError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownError::ClientDoesNotExist => f.write_str("client does not exist"),
        }
    }
}

impl std::error::Error for ShutdownError {}
