//! Domain model (task descriptor, payload, resource names, errors).

pub mod api_error;
pub mod errors;
pub mod method;
pub mod names;
pub mod payload;
pub mod task;

pub use self::api_error::{ApiCode, ApiError};
pub use self::errors::{ConfigError, ServiceErrorKind, TaskQueueError};
pub use self::method::HttpMethod;
pub use self::names::{LocationName, QueueName, TaskName};
pub use self::payload::Payload;
pub use self::task::{
    MAX_DELAY_SECONDS, MAX_NAME_LENGTH, MAX_URL_LENGTH, PushTask, PushTaskOptions,
};
