#[derive(Debug, clap::Parser)]
#[command(
    name = "mqtt-listener",
    about = "Connects to an MQTT broker, subscribes to topics and prints every message received."
)]
pub(crate) struct Options {
    /// Host name or IP address of the MQTT broker.
    #[arg(long, default_value = "localhost")]
    pub(crate) host: String,

    /// Port of the MQTT broker.
    #[arg(long, default_value_t = 1883)]
    pub(crate) port: u16,

    /// Client ID used to identify this application to the broker. An empty ID asks the broker to generate one.
    #[arg(long, default_value = "client1")]
    pub(crate) client_id: String,

    /// Username used to authenticate with the broker, if any.
    #[arg(long)]
    pub(crate) username: Option<String>,

    /// Password used to authenticate with the broker, if any. Requires --username.
    #[arg(long, requires = "username")]
    pub(crate) password: Option<String>,

    /// Keep-alive time advertised to the broker, in seconds. 0 disables keep-alive.
    #[arg(long, default_value = "60", value_parser = duration_from_secs_str)]
    pub(crate) keep_alive: std::time::Duration,

    /// Maximum back-off time between reconnections to the broker, in seconds.
    #[arg(long, default_value = "30", value_parser = duration_from_secs_str)]
    pub(crate) max_reconnect_back_off: std::time::Duration,

    /// Topic filter to subscribe to. May be given more than once.
    #[arg(long = "topic", default_value = "#")]
    pub(crate) topics: Vec<String>,

    /// QoS of the subscriptions.
    #[arg(long, default_value = "0", value_parser = qos_from_str)]
    pub(crate) qos: mqtt::proto::QoS,
}

impl Options {
    pub(crate) fn client_id(&self) -> mqtt::proto::ClientId {
        if self.client_id.is_empty() {
            mqtt::proto::ClientId::ServerGenerated
        } else {
            mqtt::proto::ClientId::IdWithCleanSession(self.client_id.clone())
        }
    }
}

fn duration_from_secs_str(s: &str) -> Result<std::time::Duration, std::num::ParseIntError> {
    Ok(std::time::Duration::from_secs(s.parse()?))
}

fn qos_from_str(s: &str) -> Result<mqtt::proto::QoS, String> {
    match s {
        "0" | "AtMostOnce" => Ok(mqtt::proto::QoS::AtMostOnce),
        "1" | "AtLeastOnce" => Ok(mqtt::proto::QoS::AtLeastOnce),
        "2" | "ExactlyOnce" => Ok(mqtt::proto::QoS::ExactlyOnce),
        s => Err(format!(
            "unrecognized QoS {:?}: must be one of 0, 1, 2, AtMostOnce, AtLeastOnce, ExactlyOnce",
            s
        )),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    #[test]
    fn defaults() {
        let options = super::Options::try_parse_from(["mqtt-listener"]).unwrap();

        assert_eq!(options.host, "localhost");
        assert_eq!(options.port, 1883);
        assert_eq!(
            options.client_id(),
            mqtt::proto::ClientId::IdWithCleanSession("client1".to_string())
        );
        assert_eq!(options.username, None);
        assert_eq!(options.password, None);
        assert_eq!(options.keep_alive, std::time::Duration::from_secs(60));
        assert_eq!(
            options.max_reconnect_back_off,
            std::time::Duration::from_secs(30)
        );
        assert_eq!(options.topics, vec!["#".to_string()]);
        assert_eq!(options.qos, mqtt::proto::QoS::AtMostOnce);
    }

    #[test]
    fn overrides() {
        let options = super::Options::try_parse_from([
            "mqtt-listener",
            "--host",
            "broker.example.com",
            "--port",
            "8883",
            "--client-id",
            "",
            "--username",
            "user",
            "--password",
            "secret",
            "--keep-alive",
            "0",
            "--topic",
            "sensors/+/temperature",
            "--topic",
            "alerts/#",
            "--qos",
            "ExactlyOnce",
        ])
        .unwrap();

        assert_eq!(options.host, "broker.example.com");
        assert_eq!(options.port, 8883);
        assert_eq!(options.client_id(), mqtt::proto::ClientId::ServerGenerated);
        assert_eq!(options.username.as_deref(), Some("user"));
        assert_eq!(options.password.as_deref(), Some("secret"));
        assert_eq!(options.keep_alive, std::time::Duration::from_secs(0));
        assert_eq!(
            options.topics,
            vec!["sensors/+/temperature".to_string(), "alerts/#".to_string()]
        );
        assert_eq!(options.qos, mqtt::proto::QoS::ExactlyOnce);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(super::Options::try_parse_from(["mqtt-listener", "--qos", "3"]).is_err());
        assert!(super::Options::try_parse_from(["mqtt-listener", "--keep-alive", "-1"]).is_err());
        assert!(super::Options::try_parse_from(["mqtt-listener", "--port", "70000"]).is_err());
        assert!(super::Options::try_parse_from(["mqtt-listener", "--password", "secret"]).is_err());
    }
}
