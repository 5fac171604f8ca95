//! Fake host utilities for integration tests.
//!
//! Provides a mock host that accepts channel connections and answers each
//! request line through a handler closure, allowing end-to-end tests of the
//! real stream transport without a real host process.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};

use anyhow::{Context, Result, anyhow};
use scorelink_client::{Config, Endpoint};
use scorelink_wire::{DataKind, ErrorKind, Request, ResponseEnvelope};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

type Handler = dyn Fn(&Request) -> ResponseEnvelope + Send + 'static;

/// Streams that can be cloned for split read/write halves.
trait HostStream: Read + Write + Sized {
    fn try_clone_stream(&self) -> io::Result<Self>;
    fn make_blocking(&self) -> io::Result<()>;
}

impl HostStream for TcpStream {
    fn try_clone_stream(&self) -> io::Result<Self> {
        self.try_clone()
    }

    fn make_blocking(&self) -> io::Result<()> {
        self.set_nonblocking(false)
    }
}

#[cfg(unix)]
impl HostStream for UnixStream {
    fn try_clone_stream(&self) -> io::Result<Self> {
        self.try_clone()
    }

    fn make_blocking(&self) -> io::Result<()> {
        self.set_nonblocking(false)
    }
}

/// A mock host serving request/response exchanges over a socket.
pub struct FakeHost {
    endpoint: Endpoint,
    requests: Arc<Mutex<Vec<Request>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeHost {
    /// Spawns a fake host listening on an ephemeral TCP port.
    pub fn spawn_tcp<H>(handler: H) -> Result<Self>
    where
        H: Fn(&Request) -> ResponseEnvelope + Send + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake host")?;
        listener
            .set_nonblocking(true)
            .context("fake host nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let endpoint = Endpoint::tcp("127.0.0.1", port);
        Ok(Self::start(endpoint, handler, move |world| {
            accept_loop(
                || listener.accept().map(|(stream, _)| stream),
                &world,
            );
        }))
    }

    /// Spawns a fake host listening on a Unix socket at the given path.
    #[cfg(unix)]
    pub fn spawn_unix<H>(path: &std::path::Path, handler: H) -> Result<Self>
    where
        H: Fn(&Request) -> ResponseEnvelope + Send + 'static,
    {
        let listener = UnixListener::bind(path).context("bind unix fake host")?;
        listener
            .set_nonblocking(true)
            .context("fake host nonblocking")?;
        let utf8 = camino::Utf8PathBuf::from_path_buf(path.to_path_buf())
            .map_err(|path| anyhow!("socket path is not utf-8: {}", path.display()))?;
        let endpoint = Endpoint::unix(utf8);
        Ok(Self::start(endpoint, handler, move |world| {
            accept_loop(
                || listener.accept().map(|(stream, _)| stream),
                &world,
            );
        }))
    }

    fn start<H, F>(endpoint: Endpoint, handler: H, serve: F) -> Self
    where
        H: Fn(&Request) -> ResponseEnvelope + Send + 'static,
        F: FnOnce(HostWorld) + Send + 'static,
    {
        let requests: Arc<Mutex<Vec<Request>>> = Arc::default();
        let shutdown = Arc::new(AtomicBool::new(false));
        let world = HostWorld {
            shutdown: Arc::clone(&shutdown),
            requests: Arc::clone(&requests),
            handler: Box::new(handler),
        };
        let handle = thread::spawn(move || serve(world));
        Self {
            endpoint,
            requests,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Endpoint the fake host listens on.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Configuration pointing a client at this host with short deadlines.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.endpoint = self.endpoint.clone();
        config.connect_timeout_ms = 2_000;
        config.exchange_timeout_ms = 2_000;
        config
    }

    /// All requests recorded so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("lock requests").clone()
    }
}

impl Drop for FakeHost {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

struct HostWorld {
    shutdown: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<Request>>>,
    handler: Box<Handler>,
}

fn accept_loop<A, S>(mut accept: A, world: &HostWorld)
where
    A: FnMut() -> io::Result<S>,
    S: HostStream,
{
    loop {
        match accept() {
            Ok(stream) => {
                // The accepted socket may inherit the listener's non-blocking
                // flag; the exchange loop needs blocking reads.
                if stream.make_blocking().is_err() {
                    continue;
                }
                // A client vanishing mid-exchange just ends this connection.
                let _ = serve_connection(stream, world);
            }
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {
                if world.shutdown.load(Ordering::SeqCst) {
                    return;
                }
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(_) => return,
        }
    }
}

fn serve_connection<S: HostStream>(mut stream: S, world: &HostWorld) -> Result<()> {
    let reader_half = stream.try_clone_stream().context("clone stream")?;
    let mut reader = BufReader::new(reader_half);
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).context("read request line")? == 0 {
            return Ok(());
        }
        let request: Request = serde_json::from_str(line.trim()).context("decode request")?;
        let response = (world.handler)(&request);
        world
            .requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?
            .push(request);
        let encoded = serde_json::to_string(&response).context("encode response")?;
        stream.write_all(encoded.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;
    }
}

/// Builds an echo handler answering every request successfully.
pub fn echo_handler() -> impl Fn(&Request) -> ResponseEnvelope + Send + 'static {
    |request| ResponseEnvelope {
        request_command: request.command,
        data_kind: DataKind::None,
        error_kind: ErrorKind::None,
        last_queue_item_id: 0,
        correlation_key: request.correlation_key.clone(),
        payload: request.payload.clone(),
    }
}
