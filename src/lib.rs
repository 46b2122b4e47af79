//! HipChat room notification library
//!
//! This library provides tools to:
//! - Resolve notification options from defaults files, environment and flags
//! - Turn raw text into HTML-friendly markup (line breaks, links)
//! - Encode the message for the v1 (form) or v2 (JSON) room API
//! - Deliver the request over HTTPS and report the response

pub mod config;
pub mod encode;
pub mod error;
pub mod format;
pub mod transport;

// Re-export common types
pub use config::{resolve, ApiVersion, Color, Config, Level, MessageFormat, OptionMap};
pub use encode::{encode, EncodedRequest};
pub use error::{Error, Result};
pub use transport::{HttpResponse, HttpTransport, Transport};

pub mod commands;
