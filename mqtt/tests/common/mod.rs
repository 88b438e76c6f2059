#![allow(dead_code)]

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{FutureExt, StreamExt, TryFutureExt};

/// Polls `client` and asserts that it emits exactly the `expected` events, in order,
/// before every connection of its [`IoSource`] has run out of steps.
pub(crate) async fn verify_client_events(
    client: &mut mqtt::Client<IoSource>,
    done: impl std::future::Future<Output = Result<(), futures::channel::oneshot::Canceled>>,
    expected: Vec<mqtt::Event>,
) {
    let mut expected = expected.into_iter();

    futures::pin_mut!(done);

    loop {
        tokio::select! {
            biased;

            result = &mut done => {
                result.expect("connection broken while there were still steps remaining on the server");
                break;
            }

            event = client.next() => match event {
                Some(Ok(event)) => assert_eq!(expected.next(), Some(event)),
                Some(Err(err)) => panic!("client failed: {:?}", err),
                None => {
                    (&mut done)
                        .await
                        .expect("connection broken while there were still steps remaining on the server");
                    break;
                }
            },
        }
    }

    assert_eq!(expected.next(), None, "client did not emit every expected event");
}

/// An `mqtt::IoSource` impl suitable for use with an `mqtt::Client`. The IoSource pretends to provide connections
/// to a real MQTT server.
#[derive(Debug)]
pub(crate) struct IoSource(std::vec::IntoIter<TestConnection>);

impl IoSource {
    /// Each element of `server_steps` represents a single connection between the client and server. The element contains
    /// an ordered sequence of what packets the server expects to send or receive in that connection.
    ///
    /// When the client reconnects, it is served based on the next element.
    ///
    /// The second value returned by this function is a future that resolves when every connection has used up its steps.
    /// If any connection is dropped before its steps have been used up, the future resolves to an error.
    pub(crate) fn new(
        server_steps: Vec<Vec<TestConnectionStep<mqtt::proto::Packet, mqtt::proto::Packet>>>,
    ) -> (
        Self,
        impl std::future::Future<Output = Result<(), futures::channel::oneshot::Canceled>>,
    ) {
        use tokio_util::codec::Encoder;

        let mut connections = Vec::with_capacity(server_steps.len());
        let mut done_recvs = Vec::with_capacity(server_steps.len());

        for server_steps in server_steps {
            let steps = server_steps
                .into_iter()
                .map(|step| match step {
                    TestConnectionStep::Receives(packet) => {
                        TestConnectionStep::Receives((packet, bytes::BytesMut::new()))
                    }

                    TestConnectionStep::Sends(packet) => {
                        let mut packet_codec: mqtt::proto::PacketCodec = Default::default();
                        let mut bytes = bytes::BytesMut::new();
                        packet_codec.encode(packet.clone(), &mut bytes).unwrap();
                        TestConnectionStep::Sends((packet, bytes))
                    }

                    TestConnectionStep::Unresponsive => TestConnectionStep::Unresponsive,
                })
                .collect();

            let (done_send, done_recv) = futures::channel::oneshot::channel();

            connections.push(TestConnection {
                steps,
                done_send: Some(done_send),
            });

            done_recvs.push(done_recv);
        }

        let done = futures::future::try_join_all(done_recvs).map_ok(|_| ());

        (IoSource(connections.into_iter()), done)
    }
}

impl mqtt::IoSource for IoSource {
    type Io = TestConnection;
    type Future = Pin<Box<dyn std::future::Future<Output = std::io::Result<Self::Io>> + Send>>;

    fn connect(&mut self) -> Self::Future {
        println!("client is creating new connection");

        match self.0.next() {
            Some(io) => futures::future::ok(io).boxed(),

            // Every connection has been handed out. The last one has already signaled the test,
            // or dropped its sender with steps remaining, so the test is about to finish either way.
            None => futures::future::pending::<std::io::Result<TestConnection>>().boxed(),
        }
    }
}

/// A single connection between a client and a server
#[derive(Debug)]
pub(crate) struct TestConnection {
    steps: std::collections::VecDeque<
        TestConnectionStep<(mqtt::proto::Packet, bytes::BytesMut), (mqtt::proto::Packet, bytes::BytesMut)>,
    >,
    done_send: Option<futures::channel::oneshot::Sender<()>>,
}

/// A single step in the connection between a client and a server
#[derive(Debug)]
pub(crate) enum TestConnectionStep<TReceives, TSends> {
    Receives(TReceives),
    Sends(TSends),

    /// The server neither reads nor writes anything more on this connection.
    /// Must be the last step.
    Unresponsive,
}

impl TestConnection {
    fn signal_done(&mut self) {
        if let Some(done_send) = self.done_send.take() {
            let _ = done_send.send(());
        }
    }
}

impl tokio::io::AsyncRead for TestConnection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = &mut *self;

        let step_done = match this.steps.front_mut() {
            Some(TestConnectionStep::Receives(_)) => {
                println!("client is reading from server but server wants to receive something first");

                // The client always makes progress with either a read or a write, so no wakeup is registered here.
                return Poll::Pending;
            }

            Some(TestConnectionStep::Unresponsive) => {
                println!("client is reading from server but server is unresponsive");
                return Poll::Pending;
            }

            Some(TestConnectionStep::Sends((packet, bytes))) => {
                println!("server sends {:?}", packet);
                let read = std::cmp::min(buf.remaining(), bytes.len());
                buf.put_slice(&bytes.split_to(read));
                println!("client read {} bytes from server", read);
                bytes.is_empty()
            }

            None => {
                println!("server has no more steps, so it closes the connection");
                this.signal_done();
                false
            }
        };

        if step_done {
            let _ = this.steps.pop_front();
        }

        Poll::Ready(Ok(()))
    }
}

impl tokio::io::AsyncWrite for TestConnection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        use tokio_util::codec::Decoder;

        let this = &mut *self;

        let (written, step_done) = match this.steps.front_mut() {
            Some(TestConnectionStep::Receives((expected_packet, bytes))) => {
                println!("server expects to receive {:?}", expected_packet);

                let previous_bytes_len = bytes.len();

                bytes.extend_from_slice(buf);

                let mut packet_codec: mqtt::proto::PacketCodec = Default::default();
                match packet_codec.decode(bytes) {
                    Ok(Some(actual_packet)) => {
                        // Codec will remove the bytes it's parsed successfully, so whatever's left is what didn't get parsed
                        let written = previous_bytes_len + buf.len() - bytes.len();

                        println!("server received {:?}", actual_packet);
                        assert_eq!(*expected_packet, actual_packet);

                        (written, true)
                    }

                    Ok(None) => (buf.len(), false),

                    Err(err) => panic!("{:?}", err),
                }
            }

            Some(TestConnectionStep::Sends(_)) => {
                println!("client is writing to server but server wants to send something first");
                return Poll::Pending;
            }

            Some(TestConnectionStep::Unresponsive) => {
                println!("client is writing to server but server is unresponsive");
                return Poll::Pending;
            }

            None => {
                println!("server has no more steps, so it closes the connection");
                this.signal_done();
                (0, false)
            }
        };

        if step_done {
            let _ = this.steps.pop_front();
        }

        println!("client wrote {} bytes to server", written);

        Poll::Ready(Ok(written))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl Drop for TestConnection {
    fn drop(&mut self) {
        // A connection the client abandons is done if nothing but an unresponsive server was left on it.
        // Otherwise the sender is dropped and the test sees `Canceled`.
        if self
            .steps
            .iter()
            .all(|step| matches!(step, TestConnectionStep::Unresponsive))
        {
            self.signal_done();
        }
    }
}
