//! Stateless HTTP substitute for the persistent stream transport.
//!
//! The HTTP variant has no persistent-connection concept: `open` is a no-op
//! success, the channel always reports live, and each exchange degrades to
//! one POST carrying the request line as its body and yielding the response
//! line as the body of the reply.

use std::io;
use std::time::Duration;

use reqwest::blocking::Client as HttpAgent;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use super::{Channel, ChannelError};

/// Channel performing one HTTP POST per request/response exchange.
#[derive(Debug)]
pub struct HttpChannel {
    url: Url,
    agent: HttpAgent,
    staged: Option<String>,
}

impl HttpChannel {
    /// Builds a channel posting to the given URL.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Open`] when the HTTP agent cannot be built.
    pub fn new(url: Url, exchange_timeout: Duration) -> Result<Self, ChannelError> {
        let agent = HttpAgent::builder()
            .timeout(exchange_timeout)
            .build()
            .map_err(|source| ChannelError::Open {
                endpoint: url.to_string(),
                source: io::Error::other(source),
            })?;
        Ok(Self {
            url,
            agent,
            staged: None,
        })
    }

    /// URL this channel posts to.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl Channel for HttpChannel {
    fn open(&mut self, _timeout: Duration) -> Result<(), ChannelError> {
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.staged = Some(line.to_owned());
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let body = self.staged.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "no request staged for exchange")
        })?;
        let response = self
            .agent
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(to_io_error)?;
        let text = response.text().map_err(to_io_error)?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    fn is_live(&self) -> bool {
        true
    }

    fn close(&mut self) {
        self.staged = None;
    }
}

fn to_io_error(error: reqwest::Error) -> io::Error {
    if error.is_timeout() {
        io::Error::new(io::ErrorKind::TimedOut, error)
    } else {
        io::Error::other(error)
    }
}
