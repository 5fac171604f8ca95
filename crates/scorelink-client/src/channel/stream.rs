//! Persistent stream transport over Unix domain or TCP sockets.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use scorelink_config::Endpoint;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use super::ChannelError;
use crate::channel::Channel;

/// Channel over a persistent byte stream.
///
/// The exchange timeout is applied as the socket read and write deadline so
/// a silent peer surfaces as a timeout error rather than a hang.
#[derive(Debug)]
pub struct StreamChannel {
    endpoint: Endpoint,
    exchange_timeout: Duration,
    state: Option<StreamState>,
}

#[derive(Debug)]
struct StreamState {
    reader: BufReader<Stream>,
    writer: Stream,
}

#[derive(Debug)]
enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

impl Stream {
    fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    fn set_deadlines(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))
            }
            #[cfg(unix)]
            Self::Unix(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))
            }
        }
    }
}

impl StreamChannel {
    /// Builds an unopened channel for the given endpoint.
    #[must_use]
    pub const fn new(endpoint: Endpoint, exchange_timeout: Duration) -> Self {
        Self {
            endpoint,
            exchange_timeout,
            state: None,
        }
    }

    /// Endpoint this channel connects to.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn connect(&self, timeout: Duration) -> Result<Stream, ChannelError> {
        match &self.endpoint {
            Endpoint::Tcp { host, port } => {
                let address =
                    resolve_tcp_address(host, *port).map_err(|source| ChannelError::Resolve {
                        endpoint: self.endpoint.to_string(),
                        source,
                    })?;
                TcpStream::connect_timeout(&address, timeout)
                    .map(Stream::Tcp)
                    .map_err(|source| self.classify_connect_error(source))
            }
            Endpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    connect_unix(path.as_str(), timeout)
                        .map_err(|source| self.classify_connect_error(source))
                }

                #[cfg(not(unix))]
                {
                    Err(ChannelError::Open {
                        endpoint: self.endpoint.to_string(),
                        source: io::Error::new(
                            io::ErrorKind::Unsupported,
                            "unix sockets unsupported on this platform",
                        ),
                    })
                }
            }
            Endpoint::Http { .. } => Err(ChannelError::Open {
                endpoint: self.endpoint.to_string(),
                source: io::Error::new(
                    io::ErrorKind::Unsupported,
                    "HTTP endpoints require the HTTP channel",
                ),
            }),
        }
    }

    fn classify_connect_error(&self, source: io::Error) -> ChannelError {
        if matches!(
            source.kind(),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
        ) {
            ChannelError::Timeout {
                endpoint: self.endpoint.to_string(),
            }
        } else {
            ChannelError::Open {
                endpoint: self.endpoint.to_string(),
                source,
            }
        }
    }
}

impl Channel for StreamChannel {
    fn open(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        if self.state.is_some() {
            return Ok(());
        }
        let writer = self.connect(timeout)?;
        let open_failure = |source: io::Error| ChannelError::Open {
            endpoint: self.endpoint.to_string(),
            source,
        };
        writer
            .set_deadlines(self.exchange_timeout)
            .map_err(open_failure)?;
        let reader = writer.try_clone().map_err(open_failure)?;
        self.state = Some(StreamState {
            reader: BufReader::new(reader),
            writer,
        });
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "channel is closed"))?;
        state.writer.write_all(line.as_bytes())?;
        state.writer.write_all(b"\n")?;
        state.writer.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "channel is closed"))?;
        let mut line = String::new();
        if state.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn is_live(&self) -> bool {
        self.state.is_some()
    }

    fn close(&mut self) {
        self.state = None;
    }
}

fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses"))
}

#[cfg(unix)]
fn connect_unix(path: &str, timeout: Duration) -> io::Result<Stream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let address = SockAddr::unix(path)?;
    socket.connect_timeout(&address, timeout)?;
    let stream: UnixStream = socket.into();
    Ok(Stream::Unix(stream))
}
