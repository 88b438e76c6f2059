///     rm -rf out/ && cargo afl build && cargo afl fuzz -i in -o out target/debug/mqtt-fuzz

use tokio_util::codec::{ Decoder, Encoder };

fn main() {
	afl::fuzz!(|data: &[u8]| {
		let mut codec: mqtt::proto::PacketCodec = Default::default();

		let mut bytes = bytes::BytesMut::from(data);

		if let Ok(Some(packet)) = codec.decode(&mut bytes) {
			// Re-encode and re-decode rather than comparing raw bytes, because a remaining length
			// has more than one valid encoding. `0x81 0x00` decodes fine but re-encodes as `0x01`.

			let mut bytes = bytes::BytesMut::new();
			codec.encode(packet.clone(), &mut bytes).unwrap();

			let packet2 = codec.decode(&mut bytes).unwrap().unwrap();

			assert_eq!(packet, packet2);

			assert!(bytes.is_empty());
		}
	});
}
