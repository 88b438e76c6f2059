use std::pin::Pin;
use std::task::{Context, Poll};

/// A framed connection that logs every packet sent and received at trace level.
#[derive(Debug)]
pub(crate) struct LoggingFramed<T>(tokio_util::codec::Framed<T, crate::proto::PacketCodec>);

impl<T> LoggingFramed<T>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    pub(crate) fn new(io: T) -> Self {
        LoggingFramed(tokio_util::codec::Framed::new(io, Default::default()))
    }
}

impl<T> futures::Sink<crate::proto::Packet> for LoggingFramed<T>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    type Error = crate::proto::EncodeError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.0).poll_ready(cx)
    }

    fn start_send(mut self: Pin<&mut Self>, item: crate::proto::Packet) -> Result<(), Self::Error> {
        log::trace!(">>> {:?}", item);
        Pin::new(&mut self.0).start_send(item)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.0).poll_close(cx)
    }
}

impl<T> futures::Stream for LoggingFramed<T>
where
    T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    type Item = Result<crate::proto::Packet, crate::proto::DecodeError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let result = Pin::new(&mut self.0).poll_next(cx);
        if let Poll::Ready(Some(Ok(item))) = &result {
            log::trace!("<<< {:?}", item);
        }
        result
    }
}
