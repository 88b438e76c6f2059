/// Writes the seed inputs for the fuzzer

use std::io::Write;

use tokio_util::codec::Encoder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let in_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("in");
	match std::fs::remove_dir_all(&in_dir) {
		Ok(()) => (),
		Err(ref err) if err.kind() == std::io::ErrorKind::NotFound => (),
		Err(err) => return Err(err.into()),
	}
	std::fs::create_dir(&in_dir)?;

	let packet_identifier = mqtt::proto::PacketIdentifier::new(5).ok_or("packet identifier 5 is invalid")?;

	let packets = vec![
		("connack", mqtt::proto::Packet::ConnAck {
			session_present: true,
			return_code: mqtt::proto::ConnectReturnCode::Accepted,
		}),

		("connack-refused", mqtt::proto::Packet::ConnAck {
			session_present: false,
			return_code: mqtt::proto::ConnectReturnCode::Refused(mqtt::proto::ConnectionRefusedReason::NotAuthorized),
		}),

		("connect", mqtt::proto::Packet::Connect {
			username: Some("username".to_string()),
			password: Some("password".to_string()),
			will: Some(mqtt::proto::Publication {
				topic_name: "clients/listener/status".to_string(),
				qos: mqtt::proto::QoS::ExactlyOnce,
				retain: true,
				payload: bytes::Bytes::from_static(b"\x00\x01\x02\xFF\xFE\xFD"),
			}),
			client_id: mqtt::proto::ClientId::IdWithExistingSession("client1".to_string()),
			keep_alive: std::time::Duration::from_secs(60),
		}),

		("connect-server-generated", mqtt::proto::Packet::Connect {
			username: None,
			password: None,
			will: None,
			client_id: mqtt::proto::ClientId::ServerGenerated,
			keep_alive: std::time::Duration::from_secs(0),
		}),

		("disconnect", mqtt::proto::Packet::Disconnect),

		("pingreq", mqtt::proto::Packet::PingReq),

		("pingresp", mqtt::proto::Packet::PingResp),

		("puback", mqtt::proto::Packet::PubAck { packet_identifier }),

		("pubcomp", mqtt::proto::Packet::PubComp { packet_identifier }),

		("publish", mqtt::proto::Packet::Publish {
			packet_identifier_dup_qos: mqtt::proto::PacketIdentifierDupQoS::ExactlyOnce(packet_identifier, true),
			retain: true,
			topic_name: "sensors/kitchen/temperature".to_string(),
			payload: bytes::Bytes::from_static(b"\x00\x01\x02\xFF\xFE\xFD"),
		}),

		("publish-at-most-once", mqtt::proto::Packet::Publish {
			packet_identifier_dup_qos: mqtt::proto::PacketIdentifierDupQoS::AtMostOnce,
			retain: false,
			topic_name: "$SYS/uptime".to_string(),
			payload: bytes::Bytes::new(),
		}),

		("pubrec", mqtt::proto::Packet::PubRec { packet_identifier }),

		("pubrel", mqtt::proto::Packet::PubRel { packet_identifier }),

		("suback", mqtt::proto::Packet::SubAck {
			packet_identifier,
			qos: vec![
				mqtt::proto::SubAckQos::Success(mqtt::proto::QoS::ExactlyOnce),
				mqtt::proto::SubAckQos::Failure,
			],
		}),

		("subscribe", mqtt::proto::Packet::Subscribe {
			packet_identifier,
			subscribe_to: vec![
				mqtt::proto::SubscribeTo {
					topic_filter: "#".to_string(),
					qos: mqtt::proto::QoS::AtMostOnce,
				},
				mqtt::proto::SubscribeTo {
					topic_filter: "sensors/+/temperature".to_string(),
					qos: mqtt::proto::QoS::ExactlyOnce,
				},
			],
		}),

		("unsuback", mqtt::proto::Packet::UnsubAck { packet_identifier }),

		("unsubscribe", mqtt::proto::Packet::Unsubscribe {
			packet_identifier,
			unsubscribe_from: vec![
				"sensors/+/temperature".to_string(),
			],
		}),
	];

	for (filename, packet) in packets {
		let file = std::fs::OpenOptions::new().create(true).write(true).truncate(true).open(in_dir.join(filename))?;
		let mut file = std::io::BufWriter::new(file);

		let mut codec: mqtt::proto::PacketCodec = Default::default();

		let mut bytes = bytes::BytesMut::new();

		codec.encode(packet, &mut bytes)?;

		file.write_all(&bytes)?;

		file.flush()?;
	}

	Ok(())
}
