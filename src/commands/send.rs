//! Send one room notification
//!
//! Reads the message, encodes it for the configured API and hands it to a
//! transport. The response body is written to `stdout` unchanged.

use std::io::{Read, Write};

use tracing::{debug, info};

use crate::config::Config;
use crate::encode::{encode, EncodedRequest};
use crate::error::Result;
use crate::format::read_input;
use crate::transport::{HttpResponse, Transport};

fn build_request<R: Read>(config: &Config, stdin: R) -> Result<EncodedRequest> {
    let raw = read_input(config.input.as_deref(), stdin)?;
    let request = encode(&raw, config);
    debug!(
        api = %config.api,
        room = %config.room_id,
        color = %config.color,
        format = %config.format,
        url = %request.url,
        "Encoded notification"
    );
    Ok(request)
}

/// CLI entry point
pub async fn run<T, R, W>(
    config: &Config,
    transport: &T,
    stdin: R,
    stdout: &mut W,
) -> Result<HttpResponse>
where
    T: Transport + ?Sized,
    R: Read,
    W: Write,
{
    let request = build_request(config, stdin)?;
    let response = transport.send(&request).await?;
    info!(status = response.status, "Notification dispatched");

    if !response.body.is_empty() {
        writeln!(stdout, "{}", response.body)?;
    }
    Ok(response)
}

/// Print the request that would be sent, without sending it.
pub fn dry_run<R: Read, W: Write>(
    config: &Config,
    stdin: R,
    stdout: &mut W,
) -> Result<EncodedRequest> {
    let request = build_request(config, stdin)?;
    writeln!(stdout, "{}", serde_json::to_string_pretty(&request)?)?;
    Ok(request)
}
