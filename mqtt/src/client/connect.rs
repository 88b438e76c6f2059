use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{SinkExt, StreamExt};

pub(super) struct Connect<IoS>
where
    IoS: super::IoSource,
{
    io_source: IoS,
    max_back_off: std::time::Duration,
    current_back_off: std::time::Duration,

    /// Set once a CONNACK has been accepted. Until then every failure is returned to the caller.
    has_connected: bool,

    /// Send the next CONNECT with the clean session flag even if the client ID asks to resume the session
    force_clean_session: bool,

    state: State<IoS>,
}

enum State<IoS>
where
    IoS: super::IoSource,
{
    BeginBackOff,
    EndBackOff(Pin<Box<tokio::time::Sleep>>),
    BeginConnecting,
    WaitingForIoToConnect(Pin<Box<<IoS as super::IoSource>::Future>>),
    Framed(
        crate::logging_framed::LoggingFramed<<IoS as super::IoSource>::Io>,
        FramedState,
    ),
}

#[derive(Clone, Copy, Debug)]
enum FramedState {
    BeginSendingConnect,
    EndSendingConnect,
    WaitingForConnAck,
    Connected {
        new_connection: bool,
        reset_session: bool,
    },
}

impl<IoS> std::fmt::Debug for Connect<IoS>
where
    IoS: super::IoSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connect")
            .field("max_back_off", &self.max_back_off)
            .field("current_back_off", &self.current_back_off)
            .field("has_connected", &self.has_connected)
            .field("force_clean_session", &self.force_clean_session)
            .field("state", &self.state)
            .finish()
    }
}

impl<IoS> std::fmt::Debug for State<IoS>
where
    IoS: super::IoSource,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::BeginBackOff => f.write_str("BeginBackOff"),
            State::EndBackOff(_) => f.write_str("EndBackOff"),
            State::BeginConnecting => f.write_str("BeginConnecting"),
            State::WaitingForIoToConnect(_) => f.write_str("WaitingForIoToConnect"),
            State::Framed(_, framed_state) => f.debug_tuple("Framed").field(framed_state).finish(),
        }
    }
}

impl<IoS> Connect<IoS>
where
    IoS: super::IoSource,
{
    pub(super) fn new(io_source: IoS, max_back_off: std::time::Duration) -> Self {
        Connect {
            io_source,
            max_back_off,
            current_back_off: std::time::Duration::from_secs(0),
            has_connected: false,
            force_clean_session: false,
            state: State::BeginConnecting,
        }
    }

    /// Drops the current connection, if any, and starts connecting again after the back-off.
    ///
    /// A connection that was merely lost reconnects at once. Any other error leaves the back-off growing,
    /// so a server that keeps rejecting the session is not reconnected to in a tight loop.
    pub(super) fn reconnect(&mut self, err: &super::Error) {
        if err.session_is_resumable() {
            self.current_back_off = std::time::Duration::from_secs(0);
        } else {
            self.force_clean_session = true;
        }
        self.state = State::BeginBackOff;
    }

    /// The current connection, if the server has accepted it.
    pub(super) fn framed(
        &mut self,
    ) -> Option<&mut crate::logging_framed::LoggingFramed<<IoS as super::IoSource>::Io>> {
        match &mut self.state {
            State::Framed(framed, FramedState::Connected { .. }) => Some(framed),
            _ => None,
        }
    }

    pub(super) fn poll<'a>(
        &'a mut self,
        cx: &mut Context<'_>,
        username: Option<&str>,
        password: Option<&str>,
        will: Option<&crate::proto::Publication>,
        client_id: &crate::proto::ClientId,
        keep_alive: std::time::Duration,
    ) -> Poll<Result<Connected<'a, IoS>, super::Error>> {
        let state = &mut self.state;

        loop {
            log::trace!("    {:?}", state);

            let err = match state {
                State::BeginBackOff => {
                    let back_off = self.current_back_off;
                    if back_off.as_secs() == 0 {
                        self.current_back_off =
                            std::cmp::min(self.max_back_off, std::time::Duration::from_secs(1));
                        *state = State::BeginConnecting;
                    } else {
                        log::debug!("Backing off for {:?}", back_off);
                        self.current_back_off = std::cmp::min(self.max_back_off, back_off * 2);
                        *state = State::EndBackOff(Box::pin(tokio::time::sleep(back_off)));
                    }
                    continue;
                }

                State::EndBackOff(back_off_timer) => match back_off_timer.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        *state = State::BeginConnecting;
                        continue;
                    }
                    Poll::Pending => return Poll::Pending,
                },

                State::BeginConnecting => {
                    let io = self.io_source.connect();
                    *state = State::WaitingForIoToConnect(Box::pin(io));
                    continue;
                }

                State::WaitingForIoToConnect(io) => match io.as_mut().poll(cx) {
                    Poll::Ready(Ok(io)) => {
                        let framed = crate::logging_framed::LoggingFramed::new(io);
                        *state = State::Framed(framed, FramedState::BeginSendingConnect);
                        continue;
                    }
                    Poll::Ready(Err(err)) => super::Error::IoSource(err),
                    Poll::Pending => return Poll::Pending,
                },

                State::Framed(framed, framed_state @ FramedState::BeginSendingConnect) => {
                    let client_id = match client_id {
                        crate::proto::ClientId::IdWithExistingSession(id)
                            if self.force_clean_session =>
                        {
                            crate::proto::ClientId::IdWithCleanSession(id.clone())
                        }
                        client_id => client_id.clone(),
                    };

                    let packet = crate::proto::Packet::Connect {
                        username: username.map(ToOwned::to_owned),
                        password: password.map(ToOwned::to_owned),
                        will: will.cloned(),
                        client_id,
                        keep_alive,
                    };

                    match framed.poll_ready_unpin(cx) {
                        Poll::Ready(Ok(())) => match framed.start_send_unpin(packet) {
                            Ok(()) => {
                                *framed_state = FramedState::EndSendingConnect;
                                continue;
                            }
                            Err(err) => super::Error::EncodePacket(err),
                        },
                        Poll::Ready(Err(err)) => super::Error::EncodePacket(err),
                        Poll::Pending => return Poll::Pending,
                    }
                }

                State::Framed(framed, framed_state @ FramedState::EndSendingConnect) => {
                    match framed.poll_flush_unpin(cx) {
                        Poll::Ready(Ok(())) => {
                            *framed_state = FramedState::WaitingForConnAck;
                            continue;
                        }
                        Poll::Ready(Err(err)) => super::Error::EncodePacket(err),
                        Poll::Pending => return Poll::Pending,
                    }
                }

                State::Framed(framed, framed_state @ FramedState::WaitingForConnAck) => {
                    match framed.poll_next_unpin(cx) {
                        Poll::Ready(Some(Ok(crate::proto::Packet::ConnAck {
                            session_present,
                            return_code: crate::proto::ConnectReturnCode::Accepted,
                        }))) => {
                            let clean_session =
                                client_id.clean_session() || self.force_clean_session;

                            self.has_connected = true;
                            self.force_clean_session = false;

                            *framed_state = FramedState::Connected {
                                new_connection: true,
                                reset_session: clean_session || !session_present,
                            };
                            continue;
                        }

                        Poll::Ready(Some(Ok(crate::proto::Packet::ConnAck {
                            return_code: crate::proto::ConnectReturnCode::Refused(reason),
                            ..
                        }))) => super::Error::ConnectionRefused(reason),

                        Poll::Ready(Some(Ok(packet))) => super::Error::UnexpectedPacket(packet),

                        Poll::Ready(Some(Err(err))) => super::Error::DecodePacket(err),

                        Poll::Ready(None) => super::Error::ServerClosedConnection,

                        Poll::Pending => return Poll::Pending,
                    }
                }

                State::Framed(
                    framed,
                    FramedState::Connected {
                        new_connection,
                        reset_session,
                    },
                ) => {
                    let result = Connected {
                        framed,
                        new_connection: *new_connection,
                        reset_session: *reset_session,
                    };
                    *new_connection = false;
                    *reset_session = false;
                    return Poll::Ready(Ok(result));
                }
            };

            *state = State::BeginBackOff;

            if !self.has_connected {
                return Poll::Ready(Err(err));
            }

            log::warn!("could not connect to server: {}", err);
        }
    }
}

pub(super) struct Connected<'a, IoS>
where
    IoS: super::IoSource,
{
    pub(super) framed: &'a mut crate::logging_framed::LoggingFramed<<IoS as super::IoSource>::Io>,
    pub(super) new_connection: bool,
    pub(super) reset_session: bool,
}
