/*!
 * MQTT protocol types.
 */

use bytes::{Buf, BufMut};

mod packet;

pub use self::packet::{
    Packet, PacketCodec, PacketIdentifierDupQoS, Publication, QoS, SubAckQos, SubscribeTo,
};

pub mod topic;
pub use self::topic::{topic_matches, validate_topic_filter, validate_topic_name, InvalidTopic};

/// The largest value that can be encoded as a remaining length.
///
/// Ref: 2.2.3 Remaining Length
pub const MAX_REMAINING_LENGTH: usize = 0x0FFF_FFFF;

/// The client ID
///
/// Refs:
/// - 3.1.3.1 Client Identifier
/// - 3.1.2.4 Clean Session
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientId {
    /// Empty client identifier. The server assigns one, and the session is always clean.
    ServerGenerated,

    /// Every connection starts a new session, and the server discards it when the connection ends.
    IdWithCleanSession(String),

    /// The server resumes the previous session for this ID, if it has one.
    IdWithExistingSession(String),
}

impl ClientId {
    /// Whether the CONNECT packet for this client ID has the clean session flag set.
    pub fn clean_session(&self) -> bool {
        match self {
            ClientId::ServerGenerated | ClientId::IdWithCleanSession(_) => true,
            ClientId::IdWithExistingSession(_) => false,
        }
    }

    /// The client identifier string sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            ClientId::ServerGenerated => "",
            ClientId::IdWithCleanSession(id) | ClientId::IdWithExistingSession(id) => id,
        }
    }
}

/// The return code for a connection attempt
///
/// Ref: 3.2.2.3 Connect Return code
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectReturnCode {
    Accepted,
    Refused(ConnectionRefusedReason),
}

/// The reason the connection was refused by the server
///
/// Ref: 3.2.2.3 Connect Return code
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionRefusedReason {
    UnacceptableProtocolVersion,
    IdentifierRejected,
    ServerUnavailable,
    BadUserNameOrPassword,
    NotAuthorized,
    Other(u8),
}

impl From<u8> for ConnectReturnCode {
    fn from(code: u8) -> Self {
        let reason = match code {
            0x00 => return ConnectReturnCode::Accepted,
            0x01 => ConnectionRefusedReason::UnacceptableProtocolVersion,
            0x02 => ConnectionRefusedReason::IdentifierRejected,
            0x03 => ConnectionRefusedReason::ServerUnavailable,
            0x04 => ConnectionRefusedReason::BadUserNameOrPassword,
            0x05 => ConnectionRefusedReason::NotAuthorized,
            code => ConnectionRefusedReason::Other(code),
        };
        ConnectReturnCode::Refused(reason)
    }
}

impl From<ConnectReturnCode> for u8 {
    fn from(code: ConnectReturnCode) -> Self {
        match code {
            ConnectReturnCode::Accepted => 0x00,
            ConnectReturnCode::Refused(reason) => match reason {
                ConnectionRefusedReason::UnacceptableProtocolVersion => 0x01,
                ConnectionRefusedReason::IdentifierRejected => 0x02,
                ConnectionRefusedReason::ServerUnavailable => 0x03,
                ConnectionRefusedReason::BadUserNameOrPassword => 0x04,
                ConnectionRefusedReason::NotAuthorized => 0x05,
                ConnectionRefusedReason::Other(code) => code,
            },
        }
    }
}

impl std::fmt::Display for ConnectionRefusedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionRefusedReason::UnacceptableProtocolVersion => {
                f.write_str("unacceptable protocol version")
            }
            ConnectionRefusedReason::IdentifierRejected => f.write_str("identifier rejected"),
            ConnectionRefusedReason::ServerUnavailable => f.write_str("server unavailable"),
            ConnectionRefusedReason::BadUserNameOrPassword => {
                f.write_str("bad user name or password")
            }
            ConnectionRefusedReason::NotAuthorized => f.write_str("not authorized"),
            ConnectionRefusedReason::Other(code) => write!(f, "return code 0x{:02X}", code),
        }
    }
}

/// A tokio codec that encodes and decodes MQTT-format "remaining length" numbers.
///
/// These numbers are encoded with a variable-length scheme that uses the MSB of each byte as a continuation bit.
/// The decoder keeps its partial result between calls, so it can be fed one byte at a time.
///
/// Ref: 2.2.3 Remaining Length
#[derive(Debug, Default)]
pub struct RemainingLengthCodec {
    result: usize,
    num_bytes_read: usize,
}

impl tokio_util::codec::Decoder for RemainingLengthCodec {
    type Item = usize;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut bytes::BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            let encoded_byte = src.get_u8();

            self.result |= usize::from(encoded_byte & 0x7F) << (self.num_bytes_read * 7);
            self.num_bytes_read += 1;

            if encoded_byte & 0x80 == 0 {
                let result = self.result;
                *self = Default::default();
                return Ok(Some(result));
            }

            if self.num_bytes_read == 4 {
                return Err(DecodeError::RemainingLengthTooHigh);
            }
        }

        Ok(None)
    }
}

impl tokio_util::codec::Encoder<usize> for RemainingLengthCodec {
    type Error = EncodeError;

    fn encode(&mut self, item: usize, dst: &mut bytes::BytesMut) -> Result<(), Self::Error> {
        if item > MAX_REMAINING_LENGTH {
            return Err(EncodeError::RemainingLengthTooHigh(item));
        }

        dst.reserve(4);

        let mut remaining = item;
        loop {
            #[allow(clippy::cast_possible_truncation)]
            let mut encoded_byte = (remaining & 0x7F) as u8;
            remaining >>= 7;

            if remaining > 0 {
                encoded_byte |= 0x80;
            }

            dst.put_u8(encoded_byte);

            if remaining == 0 {
                return Ok(());
            }
        }
    }
}

/// A packet identifier. Two-byte unsigned integer that cannot be zero.
///
/// Ref: 2.3.1 Packet Identifier
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PacketIdentifier(u16);

impl PacketIdentifier {
    /// Returns the largest value that is a valid packet identifier.
    pub const fn max_value() -> Self {
        PacketIdentifier(u16::MAX)
    }

    /// Convert the given raw packet identifier into this type.
    pub fn new(raw: u16) -> Option<Self> {
        match raw {
            0 => None,
            raw => Some(PacketIdentifier(raw)),
        }
    }

    /// Get the raw packet identifier.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for PacketIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::ops::Add<u16> for PacketIdentifier {
    type Output = Self;

    fn add(self, other: u16) -> Self::Output {
        PacketIdentifier(match self.0.wrapping_add(other) {
            0 => 1,
            value => value,
        })
    }
}

impl std::ops::AddAssign<u16> for PacketIdentifier {
    fn add_assign(&mut self, other: u16) {
        *self = *self + other;
    }
}

#[derive(Debug)]
pub enum DecodeError {
    ConnectPasswordWithoutUserName,
    ConnectReservedSet,
    IncompletePacket,
    InvalidTopicName(InvalidTopic),
    Io(std::io::Error),
    NoTopics,
    PublishDupAtMostOnce,
    RemainingLengthTooHigh,
    StringNotUtf8(std::str::Utf8Error),
    UnrecognizedConnAckFlags(u8),
    UnrecognizedPacket {
        packet_type: u8,
        flags: u8,
        remaining_length: usize,
    },
    UnrecognizedProtocolLevel(u8),
    UnrecognizedProtocolName(String),
    UnrecognizedQoS(u8),
    ZeroPacketIdentifier,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ConnectPasswordWithoutUserName => {
                f.write_str("the CONNECT flags have a password but no user name")
            }
            DecodeError::ConnectReservedSet => {
                f.write_str("the reserved bit of the CONNECT flags is set")
            }
            DecodeError::IncompletePacket => f.write_str("packet is truncated"),
            DecodeError::InvalidTopicName(err) => write!(f, "PUBLISH has {}", err),
            DecodeError::Io(err) => write!(f, "I/O error: {}", err),
            DecodeError::NoTopics => f.write_str("expected at least one topic but there were none"),
            DecodeError::PublishDupAtMostOnce => {
                f.write_str("PUBLISH packet has DUP flag set and QoS 0")
            }
            DecodeError::RemainingLengthTooHigh => {
                f.write_str("remaining length is too high to be decoded")
            }
            DecodeError::StringNotUtf8(err) => std::fmt::Display::fmt(err, f),
            DecodeError::UnrecognizedConnAckFlags(flags) => {
                write!(f, "could not parse CONNACK flags 0x{:02X}", flags)
            }
            DecodeError::UnrecognizedPacket {
                packet_type,
                flags,
                remaining_length,
            } => write!(
                f,
                "could not identify packet with type 0x{:02X}, flags 0x{:1X} and remaining length {}",
                packet_type, flags, remaining_length,
            ),
            DecodeError::UnrecognizedProtocolLevel(level) => {
                write!(f, "unexpected protocol level {}", level)
            }
            DecodeError::UnrecognizedProtocolName(name) => {
                write!(f, "unexpected protocol name {:?}", name)
            }
            DecodeError::UnrecognizedQoS(qos) => write!(f, "could not parse QoS 0x{:02X}", qos),
            DecodeError::ZeroPacketIdentifier => f.write_str("packet identifier is 0"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidTopicName(err) => Some(err),
            DecodeError::Io(err) => Some(err),
            DecodeError::StringNotUtf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        DecodeError::Io(err)
    }
}

#[derive(Debug)]
pub enum EncodeError {
    Io(std::io::Error),
    KeepAliveTooHigh(std::time::Duration),
    PasswordWithoutUserName,
    RemainingLengthTooHigh(usize),
    StringTooLarge(usize),
    WillTooLarge(usize),
}

impl EncodeError {
    /// Whether the error was caused by the contents of the packet rather than the connection.
    pub fn is_user_error(&self) -> bool {
        match self {
            EncodeError::Io(_) => false,
            EncodeError::KeepAliveTooHigh(_)
            | EncodeError::PasswordWithoutUserName
            | EncodeError::RemainingLengthTooHigh(_)
            | EncodeError::StringTooLarge(_)
            | EncodeError::WillTooLarge(_) => true,
        }
    }
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::Io(err) => write!(f, "I/O error: {}", err),
            EncodeError::KeepAliveTooHigh(keep_alive) => {
                write!(f, "keep-alive {:?} is too high", keep_alive)
            }
            EncodeError::PasswordWithoutUserName => {
                f.write_str("a password cannot be sent without a user name")
            }
            EncodeError::RemainingLengthTooHigh(len) => {
                write!(f, "remaining length {} is too high to be encoded", len)
            }
            EncodeError::StringTooLarge(len) => {
                write!(f, "string of length {} is too large to be encoded", len)
            }
            EncodeError::WillTooLarge(len) => write!(
                f,
                "will payload of length {} is too large to be encoded",
                len
            ),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::Io(err)
    }
}

/// Checked reads and length-prefixed writes over a packet body.
trait BytesMutExt {
    fn try_get_u8(&mut self) -> Result<u8, DecodeError>;
    fn try_get_u16_be(&mut self) -> Result<u16, DecodeError>;
    fn try_get_packet_identifier(&mut self) -> Result<PacketIdentifier, DecodeError>;
    fn try_get_utf8_string(&mut self) -> Result<String, DecodeError>;
    fn try_get_binary(&mut self) -> Result<bytes::Bytes, DecodeError>;

    fn append_u8(&mut self, n: u8);
    fn append_u16_be(&mut self, n: u16);
    fn append_packet_identifier(&mut self, packet_identifier: PacketIdentifier);
    fn append_utf8_string(&mut self, s: &str) -> Result<(), EncodeError>;
}

impl BytesMutExt for bytes::BytesMut {
    fn try_get_u8(&mut self) -> Result<u8, DecodeError> {
        if self.remaining() < std::mem::size_of::<u8>() {
            return Err(DecodeError::IncompletePacket);
        }

        Ok(self.get_u8())
    }

    fn try_get_u16_be(&mut self) -> Result<u16, DecodeError> {
        if self.remaining() < std::mem::size_of::<u16>() {
            return Err(DecodeError::IncompletePacket);
        }

        Ok(self.get_u16())
    }

    fn try_get_packet_identifier(&mut self) -> Result<PacketIdentifier, DecodeError> {
        let raw = self.try_get_u16_be()?;
        PacketIdentifier::new(raw).ok_or(DecodeError::ZeroPacketIdentifier)
    }

    /// Ref: 1.5.3 UTF-8 encoded strings
    fn try_get_utf8_string(&mut self) -> Result<String, DecodeError> {
        let len = usize::from(self.try_get_u16_be()?);
        if self.len() < len {
            return Err(DecodeError::IncompletePacket);
        }

        let s = self.split_to(len);
        match std::str::from_utf8(&s) {
            Ok(s) => Ok(s.to_owned()),
            Err(err) => Err(DecodeError::StringNotUtf8(err)),
        }
    }

    fn try_get_binary(&mut self) -> Result<bytes::Bytes, DecodeError> {
        let len = usize::from(self.try_get_u16_be()?);
        if self.len() < len {
            return Err(DecodeError::IncompletePacket);
        }

        Ok(self.split_to(len).freeze())
    }

    fn append_u8(&mut self, n: u8) {
        self.reserve(std::mem::size_of::<u8>());
        self.put_u8(n);
    }

    fn append_u16_be(&mut self, n: u16) {
        self.reserve(std::mem::size_of::<u16>());
        self.put_u16(n);
    }

    fn append_packet_identifier(&mut self, packet_identifier: PacketIdentifier) {
        self.append_u16_be(packet_identifier.0);
    }

    fn append_utf8_string(&mut self, s: &str) -> Result<(), EncodeError> {
        let len = u16::try_from(s.len()).map_err(|_| EncodeError::StringTooLarge(s.len()))?;
        self.reserve(std::mem::size_of::<u16>() + s.len());
        self.put_u16(len);
        self.put_slice(s.as_bytes());
        Ok(())
    }
}
