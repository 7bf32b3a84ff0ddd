//! Plugin endpoints and their lifetime.
//!
//! Each endpoint is a Unix socket with its own accept loop. The server runs until it is told to
//! shut down or one of the loops dies, and always leaves the socket files behind it removed.

use std::{
    convert::Infallible,
    future::Future,
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use hyper::{server::conn::Http, service::service_fn};
use nix::errno::Errno;
use tokio::{
    net::{UnixListener, UnixStream},
    sync::mpsc,
    task::JoinHandle,
};

use crate::{ipam::IpamDriver, netdriver::NetworkDriver, protocol::network::Scope};

mod dispatch;
mod error;
pub use dispatch::PluginHandler;
pub use error::{Error, HandlerError};

/// Where and how a set of capabilities is served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Path of the Unix socket
    pub path: PathBuf,
    /// Scope of the networks served here
    pub scope: Scope,
    /// Whether IPAM calls are answered here
    pub with_ipam: bool,
}

impl Endpoint {
    pub fn new<P: Into<PathBuf>>(path: P, scope: Scope, with_ipam: bool) -> Self {
        Self {
            path: path.into(),
            scope,
            with_ipam,
        }
    }
}

/// How long an accept loop waits after an error it can recover from
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Builds the network driver for an endpoint of a given scope
pub type NetworkDriverFactory = Box<dyn Fn(Scope) -> Arc<dyn NetworkDriver> + Send + Sync>;

/// Serves the plugin protocol on a set of endpoints
pub struct PluginServer {
    endpoints: Vec<Endpoint>,
    ipam: IpamDriver,
    network_drivers: NetworkDriverFactory,
}

/// An endpoint whose accept loop is running
struct Listening {
    path: PathBuf,
    task: JoinHandle<()>,
}

impl Listening {
    /// Stop accepting connections and remove the socket file
    async fn close(self) {
        self.task.abort();
        // Wait for the cancelled loop to drop its listener
        let _ = self.task.await;
        if let Err(error) = remove_socket(&self.path) {
            log::warn!("Unable to remove {}: {}", self.path.display(), error);
        }
    }
}

impl PluginServer {
    /// Construct a server for `endpoints`.
    ///
    /// Endpoints with IPAM enabled all share `ipam`. Each endpoint gets its own network driver.
    pub fn new(
        endpoints: Vec<Endpoint>,
        ipam: IpamDriver,
        network_drivers: NetworkDriverFactory,
    ) -> Self {
        Self {
            endpoints,
            ipam,
            network_drivers,
        }
    }

    /// Serve until SIGINT or SIGTERM arrives or an endpoint fails
    pub async fn run(self) -> Result<(), Error> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt()).map_err(Error::Signal)?;
        let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;
        self.run_until(async move {
            tokio::select! {
                _ = interrupt.recv() => log::debug!("Caught SIGINT; shutting down"),
                _ = terminate.recv() => log::debug!("Caught SIGTERM; shutting down"),
            }
        })
        .await
    }

    /// Serve until `shutdown` completes or an endpoint fails.
    ///
    /// Either way every listener is closed and its socket file removed before returning. If an
    /// endpoint cannot be bound, the ones bound before it are released and the bind error returned.
    pub async fn run_until<F: Future<Output = ()>>(self, shutdown: F) -> Result<(), Error> {
        // Each loop reports at most once, so sends never wait
        let (end_sender, mut end_receiver) = mpsc::channel(self.endpoints.len().max(1));

        let mut listening = Vec::with_capacity(self.endpoints.len());
        for endpoint in &self.endpoints {
            match self.listen_and_serve(endpoint, end_sender.clone()) {
                Ok(endpoint) => listening.push(endpoint),
                Err(error) => {
                    close_all(listening).await;
                    return Err(error);
                }
            }
        }
        drop(end_sender);

        wait_and_close(listening, end_receiver, shutdown).await
    }

    fn listen_and_serve(
        &self,
        endpoint: &Endpoint,
        end_sender: mpsc::Sender<Error>,
    ) -> Result<Listening, Error> {
        let listen_error = |source| Error::Listen {
            path: endpoint.path.clone(),
            source,
        };

        // Remove the socket of a previous run
        remove_socket(&endpoint.path).map_err(listen_error)?;
        let listener = UnixListener::bind(&endpoint.path).map_err(listen_error)?;
        log::info!(
            "Listening on {} for {} scope",
            endpoint.path.display(),
            endpoint.scope
        );

        let handler = Arc::new(PluginHandler::new(
            (self.network_drivers)(endpoint.scope),
            endpoint.with_ipam.then(|| self.ipam.clone()),
        ));
        Ok(spawn_serving(
            endpoint.path.clone(),
            listener,
            handler,
            end_sender,
        ))
    }
}

/// A source of incoming plugin connections
#[async_trait]
trait Acceptor: Send + 'static {
    async fn accept(&mut self) -> io::Result<UnixStream>;
}

#[async_trait]
impl Acceptor for UnixListener {
    async fn accept(&mut self) -> io::Result<UnixStream> {
        let (stream, _) = UnixListener::accept(self).await?;
        Ok(stream)
    }
}

/// Start serving `path` on its own task, reporting on `end_sender` if the loop dies
fn spawn_serving<A: Acceptor>(
    path: PathBuf,
    acceptor: A,
    handler: Arc<PluginHandler>,
    end_sender: mpsc::Sender<Error>,
) -> Listening {
    let task = tokio::spawn({
        let path = path.clone();
        async move {
            let source = serve(acceptor, handler, &path).await;
            let _ = end_sender.send(Error::Serve { path, source }).await;
        }
    });
    Listening { path, task }
}

/// Wait for `shutdown` or the first dead accept loop, then close every endpoint
async fn wait_and_close<F: Future<Output = ()>>(
    listening: Vec<Listening>,
    mut end_receiver: mpsc::Receiver<Error>,
    shutdown: F,
) -> Result<(), Error> {
    let result = tokio::select! {
        () = shutdown => Ok(()),
        Some(error) = end_receiver.recv() => Err(error),
    };
    close_all(listening).await;
    result
}

/// Whether an accept error leaves the listener usable.
///
/// Running out of file descriptors and connections dropped before they were accepted both clear
/// up on their own.
fn is_transient(error: &io::Error) -> bool {
    match error.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted => true,
        _ => matches!(
            error.raw_os_error().map(Errno::from_i32),
            Some(Errno::EMFILE | Errno::ENFILE | Errno::ENOBUFS | Errno::ENOMEM)
        ),
    }
}

/// Accept connections until accepting fails for good, serving each on its own task
async fn serve<A: Acceptor>(
    mut acceptor: A,
    handler: Arc<PluginHandler>,
    path: &Path,
) -> io::Error {
    loop {
        let stream = match acceptor.accept().await {
            Ok(stream) => stream,
            Err(error) if is_transient(&error) => {
                log::warn!("Error accepting on {}: {}", path.display(), error);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
            Err(error) => return error,
        };

        let handler = handler.clone();
        tokio::spawn(async move {
            let service = service_fn(move |request| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handler.handle(request).await) }
            });
            if let Err(error) = Http::new().serve_connection(stream, service).await {
                log::debug!("Error serving plugin connection: {}", error);
            }
        });
    }
}

async fn close_all(listening: Vec<Listening>) {
    for endpoint in listening {
        endpoint.close().await;
    }
}

/// Remove a socket file, treating a missing file as success
fn remove_socket(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}
