use tokio_util::codec::{Decoder, Encoder};

use super::{BytesMutExt, ClientId, DecodeError, EncodeError, PacketIdentifier};

/// An MQTT packet
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Packet {
    /// Ref: 3.2 CONNACK – Acknowledge connection request
    ConnAck {
        session_present: bool,
        return_code: super::ConnectReturnCode,
    },

    /// Ref: 3.1 CONNECT – Client requests a connection to a Server
    Connect {
        username: Option<String>,
        password: Option<String>,
        will: Option<Publication>,
        client_id: ClientId,
        keep_alive: std::time::Duration,
    },

    /// Ref: 3.14 DISCONNECT – Disconnect notification
    Disconnect,

    /// Ref: 3.12 PINGREQ – PING request
    PingReq,

    /// Ref: 3.13 PINGRESP – PING response
    PingResp,

    /// Ref: 3.4 PUBACK – Publish acknowledgement
    PubAck { packet_identifier: PacketIdentifier },

    /// Ref: 3.7 PUBCOMP – Publish complete (QoS 2 publish received, part 3)
    PubComp { packet_identifier: PacketIdentifier },

    /// Ref: 3.3 PUBLISH – Publish message
    Publish {
        packet_identifier_dup_qos: PacketIdentifierDupQoS,
        retain: bool,
        topic_name: String,
        payload: bytes::Bytes,
    },

    /// Ref: 3.5 PUBREC – Publish received (QoS 2 publish received, part 1)
    PubRec { packet_identifier: PacketIdentifier },

    /// Ref: 3.6 PUBREL – Publish release (QoS 2 publish received, part 2)
    PubRel { packet_identifier: PacketIdentifier },

    /// Ref: 3.9 SUBACK – Subscribe acknowledgement
    SubAck {
        packet_identifier: PacketIdentifier,
        qos: Vec<SubAckQos>,
    },

    /// Ref: 3.8 SUBSCRIBE - Subscribe to topics
    Subscribe {
        packet_identifier: PacketIdentifier,
        subscribe_to: Vec<SubscribeTo>,
    },

    /// Ref: 3.11 UNSUBACK – Unsubscribe acknowledgement
    UnsubAck { packet_identifier: PacketIdentifier },

    /// Ref: 3.10 UNSUBSCRIBE – Unsubscribe from topics
    Unsubscribe {
        packet_identifier: PacketIdentifier,
        unsubscribe_from: Vec<String>,
    },
}

impl Packet {
    pub const CONNACK: u8 = 0x20;
    pub const CONNECT: u8 = 0x10;
    pub const DISCONNECT: u8 = 0xE0;
    pub const PINGREQ: u8 = 0xC0;
    pub const PINGRESP: u8 = 0xD0;
    pub const PUBACK: u8 = 0x40;
    pub const PUBCOMP: u8 = 0x70;
    pub const PUBLISH: u8 = 0x30;
    pub const PUBREC: u8 = 0x50;
    pub const PUBREL: u8 = 0x60;
    pub const SUBACK: u8 = 0x90;
    pub const SUBSCRIBE: u8 = 0x80;
    pub const UNSUBACK: u8 = 0xB0;
    pub const UNSUBSCRIBE: u8 = 0xA0;

    /// Fixed header flags required for PUBREL, SUBSCRIBE and UNSUBSCRIBE
    ///
    /// Ref: 2.2.2 Flags
    const RESERVED_FLAGS: u8 = 0x02;
}

/// A combination of the packet identifier, dup flag and QoS that only allows valid combinations of these three properties.
/// Used in [`Packet::Publish`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketIdentifierDupQoS {
    AtMostOnce,
    AtLeastOnce(PacketIdentifier, bool),
    ExactlyOnce(PacketIdentifier, bool),
}

impl PacketIdentifierDupQoS {
    pub fn qos(self) -> QoS {
        match self {
            PacketIdentifierDupQoS::AtMostOnce => QoS::AtMostOnce,
            PacketIdentifierDupQoS::AtLeastOnce(..) => QoS::AtLeastOnce,
            PacketIdentifierDupQoS::ExactlyOnce(..) => QoS::ExactlyOnce,
        }
    }

    fn flags(self) -> u8 {
        match self {
            PacketIdentifierDupQoS::AtMostOnce => 0x00,
            PacketIdentifierDupQoS::AtLeastOnce(_, dup) => 0x02 | if dup { 0x08 } else { 0x00 },
            PacketIdentifierDupQoS::ExactlyOnce(_, dup) => 0x04 | if dup { 0x08 } else { 0x00 },
        }
    }
}

/// A subscription request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeTo {
    pub topic_filter: String,
    pub qos: QoS,
}

/// The level of reliability for a publication
///
/// Ref: 4.3 Quality of Service levels and protocol flows
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        match qos {
            QoS::AtMostOnce => 0x00,
            QoS::AtLeastOnce => 0x01,
            QoS::ExactlyOnce => 0x02,
        }
    }
}

impl std::convert::TryFrom<u8> for QoS {
    type Error = DecodeError;

    fn try_from(qos: u8) -> Result<Self, Self::Error> {
        match qos {
            0x00 => Ok(QoS::AtMostOnce),
            0x01 => Ok(QoS::AtLeastOnce),
            0x02 => Ok(QoS::ExactlyOnce),
            qos => Err(DecodeError::UnrecognizedQoS(qos)),
        }
    }
}

/// QoS returned in a SUBACK packet. Either one of the [`QoS`] values, or an error code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubAckQos {
    Success(QoS),
    Failure,
}

impl From<SubAckQos> for u8 {
    fn from(qos: SubAckQos) -> Self {
        match qos {
            SubAckQos::Success(qos) => qos.into(),
            SubAckQos::Failure => 0x80,
        }
    }
}

/// A message that can be published to the server
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Publication {
    pub topic_name: String,
    pub qos: QoS,
    pub retain: bool,
    pub payload: bytes::Bytes,
}

/// A tokio codec that encodes and decodes MQTT packets.
///
/// Ref: 2 MQTT Control Packet format
#[derive(Debug, Default)]
pub struct PacketCodec {
    decoder_state: PacketDecoderState,
}

#[derive(Debug, Default)]
enum PacketDecoderState {
    #[default]
    Empty,
    HaveFirstByte {
        first_byte: u8,
        remaining_length: super::RemainingLengthCodec,
    },
    HaveFixedHeader {
        first_byte: u8,
        remaining_length: usize,
    },
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut bytes::BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match &mut self.decoder_state {
                PacketDecoderState::Empty => {
                    let Ok(first_byte) = src.try_get_u8() else {
                        return Ok(None);
                    };
                    self.decoder_state = PacketDecoderState::HaveFirstByte {
                        first_byte,
                        remaining_length: Default::default(),
                    };
                }

                PacketDecoderState::HaveFirstByte {
                    first_byte,
                    remaining_length,
                } => match remaining_length.decode(src)? {
                    Some(remaining_length) => {
                        self.decoder_state = PacketDecoderState::HaveFixedHeader {
                            first_byte: *first_byte,
                            remaining_length,
                        };
                    }
                    None => return Ok(None),
                },

                PacketDecoderState::HaveFixedHeader {
                    first_byte,
                    remaining_length,
                } => {
                    // The buffer is left to grow as the body arrives rather than reserving remaining_length up front
                    if src.len() < *remaining_length {
                        return Ok(None);
                    }

                    let first_byte = *first_byte;
                    let body = src.split_to(*remaining_length);
                    self.decoder_state = PacketDecoderState::Empty;
                    return decode_body(first_byte, body).map(Some);
                }
            }
        }
    }
}

fn decode_body(first_byte: u8, mut src: bytes::BytesMut) -> Result<Packet, DecodeError> {
    let packet_type = first_byte & 0xF0;
    let flags = first_byte & 0x0F;

    let packet = match (packet_type, flags, src.len()) {
        (Packet::CONNACK, 0, 2) => {
            let session_present = match src.try_get_u8()? {
                0x00 => false,
                0x01 => true,
                flags => return Err(DecodeError::UnrecognizedConnAckFlags(flags)),
            };

            let return_code = src.try_get_u8()?.into();

            Packet::ConnAck {
                session_present,
                return_code,
            }
        }

        (Packet::CONNECT, 0, _) => decode_connect(&mut src)?,

        (Packet::DISCONNECT, 0, 0) => Packet::Disconnect,

        (Packet::PINGREQ, 0, 0) => Packet::PingReq,

        (Packet::PINGRESP, 0, 0) => Packet::PingResp,

        (Packet::PUBACK, 0, 2) => Packet::PubAck {
            packet_identifier: src.try_get_packet_identifier()?,
        },

        (Packet::PUBCOMP, 0, 2) => Packet::PubComp {
            packet_identifier: src.try_get_packet_identifier()?,
        },

        (Packet::PUBLISH, flags, _) => {
            let dup = flags & 0x08 != 0;
            let retain = flags & 0x01 != 0;

            let topic_name = src.try_get_utf8_string()?;
            super::validate_topic_name(&topic_name).map_err(DecodeError::InvalidTopicName)?;

            let packet_identifier_dup_qos = match (flags & 0x06) >> 1 {
                0x00 if dup => return Err(DecodeError::PublishDupAtMostOnce),
                0x00 => PacketIdentifierDupQoS::AtMostOnce,
                0x01 => PacketIdentifierDupQoS::AtLeastOnce(src.try_get_packet_identifier()?, dup),
                0x02 => PacketIdentifierDupQoS::ExactlyOnce(src.try_get_packet_identifier()?, dup),
                qos => return Err(DecodeError::UnrecognizedQoS(qos)),
            };

            Packet::Publish {
                packet_identifier_dup_qos,
                retain,
                topic_name,
                payload: src.split().freeze(),
            }
        }

        (Packet::PUBREC, 0, 2) => Packet::PubRec {
            packet_identifier: src.try_get_packet_identifier()?,
        },

        (Packet::PUBREL, Packet::RESERVED_FLAGS, 2) => Packet::PubRel {
            packet_identifier: src.try_get_packet_identifier()?,
        },

        (Packet::SUBACK, 0, remaining_length) if remaining_length > 2 => {
            let packet_identifier = src.try_get_packet_identifier()?;

            let mut qos = Vec::with_capacity(src.len());
            while !src.is_empty() {
                qos.push(match src.try_get_u8()? {
                    0x80 => SubAckQos::Failure,
                    raw => SubAckQos::Success(QoS::try_from(raw)?),
                });
            }

            Packet::SubAck {
                packet_identifier,
                qos,
            }
        }

        (Packet::SUBSCRIBE, Packet::RESERVED_FLAGS, _) => {
            let packet_identifier = src.try_get_packet_identifier()?;

            let mut subscribe_to = vec![];
            while !src.is_empty() {
                let topic_filter = src.try_get_utf8_string()?;
                let qos = QoS::try_from(src.try_get_u8()?)?;
                subscribe_to.push(SubscribeTo { topic_filter, qos });
            }

            if subscribe_to.is_empty() {
                return Err(DecodeError::NoTopics);
            }

            Packet::Subscribe {
                packet_identifier,
                subscribe_to,
            }
        }

        (Packet::UNSUBACK, 0, 2) => Packet::UnsubAck {
            packet_identifier: src.try_get_packet_identifier()?,
        },

        (Packet::UNSUBSCRIBE, Packet::RESERVED_FLAGS, _) => {
            let packet_identifier = src.try_get_packet_identifier()?;

            let mut unsubscribe_from = vec![];
            while !src.is_empty() {
                unsubscribe_from.push(src.try_get_utf8_string()?);
            }

            if unsubscribe_from.is_empty() {
                return Err(DecodeError::NoTopics);
            }

            Packet::Unsubscribe {
                packet_identifier,
                unsubscribe_from,
            }
        }

        (packet_type, flags, remaining_length) => {
            return Err(DecodeError::UnrecognizedPacket {
                packet_type,
                flags,
                remaining_length,
            })
        }
    };

    Ok(packet)
}

/// Ref: 3.1.2 Variable header, 3.1.3 Payload
fn decode_connect(src: &mut bytes::BytesMut) -> Result<Packet, DecodeError> {
    let protocol_name = src.try_get_utf8_string()?;
    if protocol_name != "MQTT" {
        return Err(DecodeError::UnrecognizedProtocolName(protocol_name));
    }

    let protocol_level = src.try_get_u8()?;
    if protocol_level != 0x04 {
        return Err(DecodeError::UnrecognizedProtocolLevel(protocol_level));
    }

    let connect_flags = src.try_get_u8()?;
    if connect_flags & 0x01 != 0 {
        return Err(DecodeError::ConnectReservedSet);
    }
    if connect_flags & 0xC0 == 0x40 {
        return Err(DecodeError::ConnectPasswordWithoutUserName);
    }

    let keep_alive = std::time::Duration::from_secs(u64::from(src.try_get_u16_be()?));

    let client_id = src.try_get_utf8_string()?;
    let client_id = if client_id.is_empty() {
        ClientId::ServerGenerated
    } else if connect_flags & 0x02 == 0 {
        ClientId::IdWithExistingSession(client_id)
    } else {
        ClientId::IdWithCleanSession(client_id)
    };

    let will = if connect_flags & 0x04 == 0 {
        None
    } else {
        let topic_name = src.try_get_utf8_string()?;
        let qos = QoS::try_from((connect_flags & 0x18) >> 3)?;
        let retain = connect_flags & 0x20 != 0;
        let payload = src.try_get_binary()?;

        Some(Publication {
            topic_name,
            qos,
            retain,
            payload,
        })
    };

    let username = if connect_flags & 0x80 == 0 {
        None
    } else {
        Some(src.try_get_utf8_string()?)
    };

    let password = if connect_flags & 0x40 == 0 {
        None
    } else {
        Some(src.try_get_utf8_string()?)
    };

    Ok(Packet::Connect {
        username,
        password,
        will,
        client_id,
        keep_alive,
    })
}

impl Encoder<Packet> for PacketCodec {
    type Error = EncodeError;

    fn encode(&mut self, item: Packet, dst: &mut bytes::BytesMut) -> Result<(), Self::Error> {
        let mut body = bytes::BytesMut::new();

        let first_byte = match item {
            Packet::ConnAck {
                session_present,
                return_code,
            } => {
                body.append_u8(u8::from(session_present));
                body.append_u8(return_code.into());
                Packet::CONNACK
            }

            Packet::Connect {
                username,
                password,
                will,
                client_id,
                keep_alive,
            } => {
                encode_connect(
                    &mut body,
                    username.as_deref(),
                    password.as_deref(),
                    will.as_ref(),
                    &client_id,
                    keep_alive,
                )?;
                Packet::CONNECT
            }

            Packet::Disconnect => Packet::DISCONNECT,

            Packet::PingReq => Packet::PINGREQ,

            Packet::PingResp => Packet::PINGRESP,

            Packet::PubAck { packet_identifier } => {
                body.append_packet_identifier(packet_identifier);
                Packet::PUBACK
            }

            Packet::PubComp { packet_identifier } => {
                body.append_packet_identifier(packet_identifier);
                Packet::PUBCOMP
            }

            Packet::Publish {
                packet_identifier_dup_qos,
                retain,
                topic_name,
                payload,
            } => {
                body.append_utf8_string(&topic_name)?;

                match packet_identifier_dup_qos {
                    PacketIdentifierDupQoS::AtMostOnce => (),
                    PacketIdentifierDupQoS::AtLeastOnce(packet_identifier, _)
                    | PacketIdentifierDupQoS::ExactlyOnce(packet_identifier, _) => {
                        body.append_packet_identifier(packet_identifier);
                    }
                }

                body.extend_from_slice(&payload);

                Packet::PUBLISH | packet_identifier_dup_qos.flags() | u8::from(retain)
            }

            Packet::PubRec { packet_identifier } => {
                body.append_packet_identifier(packet_identifier);
                Packet::PUBREC
            }

            Packet::PubRel { packet_identifier } => {
                body.append_packet_identifier(packet_identifier);
                Packet::PUBREL | Packet::RESERVED_FLAGS
            }

            Packet::SubAck {
                packet_identifier,
                qos,
            } => {
                body.append_packet_identifier(packet_identifier);
                for qos in qos {
                    body.append_u8(qos.into());
                }
                Packet::SUBACK
            }

            Packet::Subscribe {
                packet_identifier,
                subscribe_to,
            } => {
                body.append_packet_identifier(packet_identifier);
                for SubscribeTo { topic_filter, qos } in subscribe_to {
                    body.append_utf8_string(&topic_filter)?;
                    body.append_u8(qos.into());
                }
                Packet::SUBSCRIBE | Packet::RESERVED_FLAGS
            }

            Packet::UnsubAck { packet_identifier } => {
                body.append_packet_identifier(packet_identifier);
                Packet::UNSUBACK
            }

            Packet::Unsubscribe {
                packet_identifier,
                unsubscribe_from,
            } => {
                body.append_packet_identifier(packet_identifier);
                for topic_filter in unsubscribe_from {
                    body.append_utf8_string(&topic_filter)?;
                }
                Packet::UNSUBSCRIBE | Packet::RESERVED_FLAGS
            }
        };

        // Encode the remaining length first so that a failure leaves dst untouched.
        let mut fixed_header = bytes::BytesMut::with_capacity(5);
        fixed_header.append_u8(first_byte);
        super::RemainingLengthCodec::default().encode(body.len(), &mut fixed_header)?;

        dst.reserve(fixed_header.len() + body.len());
        dst.extend_from_slice(&fixed_header);
        dst.extend_from_slice(&body);

        Ok(())
    }
}

fn encode_connect(
    dst: &mut bytes::BytesMut,
    username: Option<&str>,
    password: Option<&str>,
    will: Option<&Publication>,
    client_id: &ClientId,
    keep_alive: std::time::Duration,
) -> Result<(), EncodeError> {
    dst.append_utf8_string("MQTT")?;
    dst.append_u8(0x04);

    if username.is_none() && password.is_some() {
        return Err(EncodeError::PasswordWithoutUserName);
    }

    let mut connect_flags = 0x00_u8;
    if username.is_some() {
        connect_flags |= 0x80;
    }
    if password.is_some() {
        connect_flags |= 0x40;
    }
    if let Some(will) = will {
        if will.retain {
            connect_flags |= 0x20;
        }
        connect_flags |= u8::from(will.qos) << 3;
        connect_flags |= 0x04;
    }
    if client_id.clean_session() {
        connect_flags |= 0x02;
    }
    dst.append_u8(connect_flags);

    let keep_alive_secs = u16::try_from(keep_alive.as_secs())
        .map_err(|_| EncodeError::KeepAliveTooHigh(keep_alive))?;
    dst.append_u16_be(keep_alive_secs);

    dst.append_utf8_string(client_id.as_str())?;

    if let Some(will) = will {
        dst.append_utf8_string(&will.topic_name)?;
        let will_len = u16::try_from(will.payload.len())
            .map_err(|_| EncodeError::WillTooLarge(will.payload.len()))?;
        dst.append_u16_be(will_len);
        dst.extend_from_slice(&will.payload);
    }

    if let Some(username) = username {
        dst.append_utf8_string(username)?;
    }

    if let Some(password) = password {
        dst.append_utf8_string(password)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio_util::codec::{Decoder, Encoder};

    use super::{Packet, PacketCodec, PacketIdentifierDupQoS, Publication, QoS, SubAckQos, SubscribeTo};
    use crate::proto::{ClientId, ConnectReturnCode, DecodeError, EncodeError, PacketIdentifier};

    fn encode(packet: Packet) -> bytes::BytesMut {
        let mut bytes = bytes::BytesMut::new();
        PacketCodec::default().encode(packet, &mut bytes).unwrap();
        bytes
    }

    fn decode(bytes: &[u8]) -> Result<Option<Packet>, DecodeError> {
        let mut bytes = bytes::BytesMut::from(bytes);
        PacketCodec::default().decode(&mut bytes)
    }

    #[test]
    fn connect_wire_format() {
        let bytes = encode(Packet::Connect {
            username: None,
            password: None,
            will: None,
            client_id: ClientId::IdWithCleanSession("client1".to_string()),
            keep_alive: std::time::Duration::from_secs(60),
        });

        assert_eq!(
            &*bytes,
            &[
                0x10, 0x13, // fixed header
                0x00, 0x04, b'M', b'Q', b'T', b'T', // protocol name
                0x04, // protocol level
                0x02, // clean session
                0x00, 0x3C, // keep-alive
                0x00, 0x07, b'c', b'l', b'i', b'e', b'n', b't', b'1',
            ][..]
        );
    }

    #[test]
    fn connect_with_will_and_credentials() {
        let packet = Packet::Connect {
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            will: Some(Publication {
                topic_name: "status/client1".to_string(),
                qos: QoS::AtLeastOnce,
                retain: true,
                payload: bytes::Bytes::from_static(b"offline"),
            }),
            client_id: ClientId::IdWithExistingSession("client1".to_string()),
            keep_alive: std::time::Duration::from_secs(5),
        };

        let bytes = encode(packet.clone());
        // username, password, will retain, will QoS 1, will flag; clean session unset
        assert_eq!(bytes[9], 0x80 | 0x40 | 0x20 | 0x08 | 0x04);

        assert_eq!(decode(&bytes).unwrap(), Some(packet));
    }

    #[test]
    fn connect_rejects_reserved_flag_and_wrong_protocol() {
        let mut bytes = encode(Packet::Connect {
            username: None,
            password: None,
            will: None,
            client_id: ClientId::ServerGenerated,
            keep_alive: std::time::Duration::from_secs(0),
        });

        let mut reserved = bytes.clone();
        reserved[9] |= 0x01;
        match decode(&reserved) {
            Err(DecodeError::ConnectReservedSet) => (),
            other => panic!("{:?}", other),
        }

        bytes[8] = 0x03;
        match decode(&bytes) {
            Err(DecodeError::UnrecognizedProtocolLevel(0x03)) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn keep_alive_too_high() {
        let mut bytes = bytes::BytesMut::new();
        let err = PacketCodec::default()
            .encode(
                Packet::Connect {
                    username: None,
                    password: None,
                    will: None,
                    client_id: ClientId::ServerGenerated,
                    keep_alive: std::time::Duration::from_secs(0x1_0000),
                },
                &mut bytes,
            )
            .unwrap_err();
        assert!(err.is_user_error());
        match err {
            EncodeError::KeepAliveTooHigh(_) => (),
            err => panic!("{:?}", err),
        }
        assert!(bytes.is_empty());
    }

    #[test]
    fn password_without_user_name() {
        let mut bytes = bytes::BytesMut::new();
        let err = PacketCodec::default()
            .encode(
                Packet::Connect {
                    username: None,
                    password: Some("secret".to_string()),
                    will: None,
                    client_id: ClientId::IdWithCleanSession("client1".to_string()),
                    keep_alive: std::time::Duration::from_secs(60),
                },
                &mut bytes,
            )
            .unwrap_err();
        assert!(err.is_user_error());
        match err {
            EncodeError::PasswordWithoutUserName => (),
            err => panic!("{:?}", err),
        }
        assert!(bytes.is_empty());

        let mut bytes = encode(Packet::Connect {
            username: None,
            password: None,
            will: None,
            client_id: ClientId::IdWithCleanSession("client1".to_string()),
            keep_alive: std::time::Duration::from_secs(60),
        });
        bytes[9] |= 0x40;
        match decode(&bytes) {
            Err(DecodeError::ConnectPasswordWithoutUserName) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn large_remaining_length_does_not_allocate_before_the_body_arrives() {
        let mut codec = PacketCodec::default();
        let mut bytes = bytes::BytesMut::from(&[0x30, 0xFF, 0xFF, 0xFF, 0x7F][..]);

        assert_eq!(codec.decode(&mut bytes).unwrap(), None);
        assert!(bytes.capacity() < 1024);

        // A partial body keeps the decoder waiting
        bytes.extend_from_slice(&[0x00, 0x01, b'a']);
        assert_eq!(codec.decode(&mut bytes).unwrap(), None);
        assert!(bytes.capacity() < 1024);
    }

    #[test]
    fn connack() {
        assert_eq!(
            decode(&[0x20, 0x02, 0x01, 0x00]).unwrap(),
            Some(Packet::ConnAck {
                session_present: true,
                return_code: ConnectReturnCode::Accepted,
            })
        );

        match decode(&[0x20, 0x02, 0x02, 0x00]) {
            Err(DecodeError::UnrecognizedConnAckFlags(0x02)) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn publish_wire_format() {
        let bytes = encode(Packet::Publish {
            packet_identifier_dup_qos: PacketIdentifierDupQoS::AtLeastOnce(
                PacketIdentifier::new(0x1234).unwrap(),
                true,
            ),
            retain: true,
            topic_name: "a/b".to_string(),
            payload: bytes::Bytes::from_static(b"hi"),
        });

        assert_eq!(
            &*bytes,
            &[0x3B, 0x09, 0x00, 0x03, b'a', b'/', b'b', 0x12, 0x34, b'h', b'i'][..]
        );
    }

    #[test]
    fn publish_decode_errors() {
        // QoS 0 with DUP
        match decode(&[0x38, 0x03, 0x00, 0x01, b'a']) {
            Err(DecodeError::PublishDupAtMostOnce) => (),
            other => panic!("{:?}", other),
        }

        // QoS 3
        match decode(&[0x36, 0x05, 0x00, 0x01, b'a', 0x00, 0x01]) {
            Err(DecodeError::UnrecognizedQoS(3)) => (),
            other => panic!("{:?}", other),
        }

        // Zero packet identifier
        match decode(&[0x32, 0x05, 0x00, 0x01, b'a', 0x00, 0x00]) {
            Err(DecodeError::ZeroPacketIdentifier) => (),
            other => panic!("{:?}", other),
        }

        // Wildcard in topic name
        match decode(&[0x30, 0x03, 0x00, 0x01, b'#']) {
            Err(DecodeError::InvalidTopicName(_)) => (),
            other => panic!("{:?}", other),
        }

        // Topic length runs past the end of the packet
        match decode(&[0x30, 0x03, 0x00, 0x05, b'a']) {
            Err(DecodeError::IncompletePacket) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn subscribe_round_trip() {
        let packet = Packet::Subscribe {
            packet_identifier: PacketIdentifier::new(7).unwrap(),
            subscribe_to: vec![
                SubscribeTo {
                    topic_filter: "sensors/+/temperature".to_string(),
                    qos: QoS::AtLeastOnce,
                },
                SubscribeTo {
                    topic_filter: "#".to_string(),
                    qos: QoS::AtMostOnce,
                },
            ],
        };

        let bytes = encode(packet.clone());
        assert_eq!(bytes[0], 0x82);
        assert_eq!(decode(&bytes).unwrap(), Some(packet));
    }

    #[test]
    fn subscribe_and_unsubscribe_need_reserved_flags_and_topics() {
        match decode(&[0x80, 0x06, 0x00, 0x01, 0x00, 0x01, b'a', 0x00]) {
            Err(DecodeError::UnrecognizedPacket {
                packet_type: 0x80,
                flags: 0x00,
                remaining_length: 6,
            }) => (),
            other => panic!("{:?}", other),
        }

        match decode(&[0x82, 0x02, 0x00, 0x01]) {
            Err(DecodeError::NoTopics) => (),
            other => panic!("{:?}", other),
        }

        match decode(&[0xA2, 0x02, 0x00, 0x01]) {
            Err(DecodeError::NoTopics) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn suback() {
        assert_eq!(
            decode(&[0x90, 0x05, 0x00, 0x0A, 0x00, 0x02, 0x80]).unwrap(),
            Some(Packet::SubAck {
                packet_identifier: PacketIdentifier::new(10).unwrap(),
                qos: vec![
                    SubAckQos::Success(QoS::AtMostOnce),
                    SubAckQos::Success(QoS::ExactlyOnce),
                    SubAckQos::Failure,
                ],
            })
        );

        match decode(&[0x90, 0x03, 0x00, 0x0A, 0x03]) {
            Err(DecodeError::UnrecognizedQoS(3)) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn pubrel_flags() {
        let bytes = encode(Packet::PubRel {
            packet_identifier: PacketIdentifier::new(1).unwrap(),
        });
        assert_eq!(&*bytes, &[0x62, 0x02, 0x00, 0x01][..]);

        match decode(&[0x60, 0x02, 0x00, 0x01]) {
            Err(DecodeError::UnrecognizedPacket { .. }) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn zero_length_packets() {
        assert_eq!(&*encode(Packet::PingReq), &[0xC0, 0x00][..]);
        assert_eq!(&*encode(Packet::Disconnect), &[0xE0, 0x00][..]);
        assert_eq!(decode(&[0xD0, 0x00]).unwrap(), Some(Packet::PingResp));
    }

    #[test]
    fn decode_is_incremental() {
        let bytes = encode(Packet::Publish {
            packet_identifier_dup_qos: PacketIdentifierDupQoS::AtMostOnce,
            retain: false,
            topic_name: "t".to_string(),
            payload: bytes::Bytes::from(vec![0xAB; 200]),
        });

        let mut codec = PacketCodec::default();
        let mut buf = bytes::BytesMut::new();
        let mut decoded = None;
        for &b in bytes.iter() {
            assert!(decoded.is_none());
            buf.extend_from_slice(&[b]);
            decoded = codec.decode(&mut buf).unwrap();
        }

        match decoded {
            Some(Packet::Publish { payload, .. }) => assert_eq!(payload.len(), 200),
            other => panic!("{:?}", other),
        }
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_stops_at_packet_boundary() {
        let mut bytes = encode(Packet::PingResp);
        bytes.extend_from_slice(&encode(Packet::PubAck {
            packet_identifier: PacketIdentifier::new(3).unwrap(),
        }));

        let mut codec = PacketCodec::default();
        assert_eq!(codec.decode(&mut bytes).unwrap(), Some(Packet::PingResp));
        assert_eq!(
            codec.decode(&mut bytes).unwrap(),
            Some(Packet::PubAck {
                packet_identifier: PacketIdentifier::new(3).unwrap(),
            })
        );
        assert_eq!(codec.decode(&mut bytes).unwrap(), None);
    }
}
