//! Courier Core — message envelope, channel contracts, routing kernel, and
//! wire codecs.

pub mod error;
pub mod evaluator;
pub mod message;
pub mod route_table;
pub mod traits;
pub mod value;
pub mod wire;

pub use error::{ChannelError, EvaluateError, RouterError};
pub use evaluator::{FnEvaluator, LengthThresholdEvaluator, RoutingEvaluator, RoutingKey};
pub use message::{header_names, Message, MessageBuilder, MessageHeaders};
pub use route_table::{RouteTable, RouteTableBuilder};
pub use traits::{MessageChannel, MessageHandler, PollableChannel};
pub use value::Value;
