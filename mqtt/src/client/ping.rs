use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

pub(super) enum State {
    BeginWaitingForNextPing,
    WaitingForNextPing {
        ping_timer: Pin<Box<tokio::time::Sleep>>,

        /// A PINGREQ has been sent and its PINGRESP has not arrived yet
        awaiting_response: bool,
    },
}

impl State {
    pub(super) fn poll(
        &mut self,
        cx: &mut Context<'_>,
        packet: &mut Option<crate::proto::Packet>,
        keep_alive: std::time::Duration,
    ) -> Poll<Result<crate::proto::Packet, super::Error>> {
        if let Some(crate::proto::Packet::PingResp) = packet {
            let _ = packet.take();

            if let State::WaitingForNextPing {
                ping_timer,
                awaiting_response,
            } = self
            {
                ping_timer
                    .as_mut()
                    .reset(tokio::time::Instant::now() + interval(keep_alive));
                *awaiting_response = false;
            }
        }

        // Ref: 3.1.2.10 Keep Alive. A value of zero turns the mechanism off.
        if keep_alive.as_secs() == 0 {
            return Poll::Pending;
        }

        loop {
            log::trace!("    {:?}", self);

            match self {
                State::BeginWaitingForNextPing => {
                    *self = State::WaitingForNextPing {
                        ping_timer: Box::pin(tokio::time::sleep(interval(keep_alive))),
                        awaiting_response: false,
                    };
                }

                State::WaitingForNextPing {
                    ping_timer,
                    awaiting_response,
                } => match ping_timer.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        if *awaiting_response {
                            return Poll::Ready(Err(super::Error::PingTimeout));
                        }

                        let next_deadline = ping_timer.deadline() + interval(keep_alive);
                        ping_timer.as_mut().reset(next_deadline);
                        *awaiting_response = true;
                        return Poll::Ready(Ok(crate::proto::Packet::PingReq));
                    }

                    Poll::Pending => return Poll::Pending,
                },
            }
        }
    }

    pub(super) fn new_connection(&mut self) {
        *self = State::BeginWaitingForNextPing;
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::BeginWaitingForNextPing => f.write_str("BeginWaitingForNextPing"),
            State::WaitingForNextPing {
                awaiting_response, ..
            } => f
                .debug_struct("WaitingForNextPing")
                .field("awaiting_response", awaiting_response)
                .finish(),
        }
    }
}

fn interval(keep_alive: std::time::Duration) -> std::time::Duration {
    keep_alive / 2
}
