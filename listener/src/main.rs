// Connects to an MQTT broker, subscribes to one or more topic filters and prints every message received.
//
// Example:
//
//     cargo run -p mqtt-listener -- --host localhost --port 1883 --client-id client1 --topic 'sensors/#' --qos 1

use futures::StreamExt;

mod options;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::new().filter_or("MQTT_LISTENER_LOG", "mqtt=info,mqtt_listener=info"),
    )
    .init();

    let options: options::Options = clap::Parser::parse();

    if let Err(err) = run(options).await {
        eprint!("{}", error_report(&*err));
        std::process::exit(1);
    }
}

fn error_report(err: &dyn std::error::Error) -> String {
    let mut report = format!("Error: {}\n", err);

    let mut source = err.source();
    while let Some(err) = source {
        report.push_str(&format!("caused by: {}\n", err));
        source = err.source();
    }

    report
}

async fn run(options: options::Options) -> Result<(), Box<dyn std::error::Error>> {
    let client_id = options.client_id();

    let options::Options {
        host,
        port,
        username,
        password,
        keep_alive,
        max_reconnect_back_off,
        topics,
        qos,
        ..
    } = options;

    log::info!("Connecting to {}:{} ...", host, port);

    let mut client = mqtt::Client::new(
        client_id,
        username,
        password,
        None,
        move || tokio::net::TcpStream::connect((host.clone(), port)),
        max_reconnect_back_off,
        keep_alive,
    );

    let mut dispatcher = mqtt::Dispatcher::new();

    for topic_filter in topics {
        dispatcher.register(topic_filter.clone(), |publication: &mqtt::ReceivedPublication| {
            println!(
                "Received message: {}",
                String::from_utf8_lossy(&publication.payload)
            );
        })?;

        client.subscribe(mqtt::proto::SubscribeTo { topic_filter, qos })?;
    }

    let mut shutdown_handle = client.shutdown_handle()?;
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Received Ctrl-C, shutting down ...");
                if let Err(err) = shutdown_handle.shutdown().await {
                    log::warn!("couldn't send shutdown notification: {}", err);
                }
            }
            Err(err) => log::warn!("couldn't listen for Ctrl-C: {}", err),
        }
    });

    while let Some(event) = client.next().await {
        match event? {
            mqtt::Event::NewConnection { reset_session } => {
                log::debug!("New connection, reset_session: {}", reset_session);
                println!("Connected to the MQTT broker");
            }

            mqtt::Event::Disconnected => println!("Disconnected from the MQTT broker"),

            mqtt::Event::Publication(publication) => {
                dispatcher.dispatch(&publication);
            }

            mqtt::Event::SubscriptionUpdates(subscription_updates) => {
                for subscription_update in subscription_updates {
                    match subscription_update {
                        mqtt::SubscriptionUpdate::Subscribe(subscribe_to) => log::info!(
                            "Subscribed to {} with {:?}",
                            subscribe_to.topic_filter,
                            subscribe_to.qos
                        ),
                        mqtt::SubscriptionUpdate::Unsubscribe(topic_filter) => {
                            log::info!("Unsubscribed from {}", topic_filter)
                        }
                    }
                }
            }
        }
    }

    log::info!("Client shut down");

    Ok(())
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    async fn unreachable_broker_is_an_error() {
        let port = {
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
            listener.local_addr().unwrap().port().to_string()
        };

        let options = <super::options::Options as clap::Parser>::try_parse_from([
            "mqtt-listener",
            "--host",
            "127.0.0.1",
            "--port",
            port.as_str(),
        ])
        .unwrap();

        let err = super::run(options).await.unwrap_err();
        let report = super::error_report(&*err);
        assert!(
            report.starts_with("Error: could not open connection to server: "),
            "{}",
            report
        );
        assert!(report.contains("\ncaused by: "), "{}", report);
    }
}
