/*!
 * This crate contains an implementation of an MQTT v3.1.1 client.
 *
 * [`proto`] holds the wire codec, [`Client`] is the connection state machine and I/O loop,
 * and [`Dispatcher`] routes received publications to callbacks by topic filter.
 */

#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::default_trait_access,
    clippy::large_enum_variant,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::use_self
)]

mod client;
pub use self::client::{
    Client, Error, Event, IoSource, PublishError, PublishHandle, ReceivedPublication,
    ShutdownError, ShutdownHandle, SubscriptionUpdate, UnexpectedSubUnsubAckReason,
    UpdateSubscriptionError, UpdateSubscriptionHandle,
};

mod dispatch;
pub use self::dispatch::Dispatcher;

mod logging_framed;

pub mod proto;
