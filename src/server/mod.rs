//! Static file server for previewing the blog locally.
//!
//! Pages fetch their Markdown with `fetch()`, which browsers refuse over
//! `file://`, so the site has to be served. Every response carries CORS
//! headers; one task is spawned per connection and each connection
//! handles a single request.

mod files;
mod http;

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::config::{CorsConfig, ServerConfig};
use crate::error::{Result, WorkbenchError};

pub use files::{content_type, directory_listing, resolve, Resolved};
pub use http::{percent_decode, percent_encode, Method, Request, Response, Status, MAX_HEAD_BYTES};

/// Time allowed for a client to send its request head
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared per-connection state
#[derive(Debug)]
struct Site {
    root: PathBuf,
    cors: CorsConfig,
}

/// A server whose socket is bound but not yet accepting
pub struct DevServer {
    listener: TcpListener,
    site: Arc<Site>,
}

impl DevServer {
    /// Bind `config.bind:config.port` and check the root directory.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        if !config.root.is_dir() {
            return Err(WorkbenchError::InvalidInput(format!(
                "Server root is not a directory: {}",
                config.root.display()
            )));
        }

        let addr = format!("{}:{}", config.bind, config.port);
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                WorkbenchError::PortInUse(config.port)
            } else {
                WorkbenchError::Server(format!("Failed to bind {}: {}", addr, e))
            }
        })?;

        Ok(Self {
            listener,
            site: Arc::new(Site {
                root: config.root.clone(),
                cors: config.cors.clone(),
            }),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn root(&self) -> &Path {
        &self.site.root
    }

    /// Accept connections until `shutdown` completes.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            let site = Arc::clone(&self.site);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, peer, &site).await {
                                    log::debug!("Connection from {} failed: {}", peer, e);
                                }
                            });
                        }
                        Err(e) => {
                            log::warn!("Accept failed: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    log::info!("Dev server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Read bytes until the blank line ending the request head.
async fn read_head(stream: &mut TcpStream) -> Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_head_end(&buf) {
            buf.truncate(end);
            break;
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(WorkbenchError::InvalidInput("request head too large".to_string()));
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
        return Some(pos);
    }
    buf.windows(2).position(|w| w == b"\n\n")
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, site: &Site) -> Result<()> {
    let head = match tokio::time::timeout(READ_TIMEOUT, read_head(&mut stream)).await {
        Ok(result) => result?,
        Err(_) => {
            log::debug!("Timed out reading request from {}", peer);
            return Ok(());
        }
    };
    if head.trim().is_empty() {
        return Ok(());
    }

    let (response, head_only, line) = match Request::parse(&head) {
        Ok(request) => {
            let head_only = request.method == Method::Head;
            let line = format!("{} {}", request.method, request.target);
            (respond(&request, site), head_only, line)
        }
        Err(e) => (Response::error(Status::BadRequest, &e.to_string()), false, "-".to_string()),
    };
    let response = response.with_cors(&site.cors);

    log::info!("{} \"{}\" {}", peer, line, response.status.code());

    stream.write_all(&response.to_bytes(head_only)).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Build the response for a parsed request, without CORS headers.
fn respond(request: &Request, site: &Site) -> Response {
    match request.method {
        Method::Options => Response::new(Status::NoContent),
        Method::Get | Method::Head => serve_path(&site.root, request.raw_path(), request.query()),
        Method::Other(ref m) => Response::error(Status::NotImplemented, &format!("Unsupported method ({})", m)),
    }
}

/// `query` is the raw `?...` suffix, carried over onto redirects
fn serve_path(root: &Path, raw_path: &str, query: &str) -> Response {
    match resolve(root, raw_path) {
        Resolved::File(path) => match std::fs::read(&path) {
            Ok(body) => Response::with_body(Status::Ok, content_type(&path), body),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                Response::error(Status::NotFound, "File not found")
            }
        },
        Resolved::Listing { dir, url_path } => match directory_listing(&dir, &url_path) {
            Ok(html) => Response::with_body(Status::Ok, "text/html; charset=utf-8", html.into_bytes()),
            Err(e) => {
                log::warn!("Failed to list {}: {}", dir.display(), e);
                Response::error(Status::InternalServerError, "No permission to list directory")
            }
        },
        Resolved::Redirect(location) => Response::redirect(&format!("{}{}", location, query)),
        Resolved::Forbidden => Response::error(Status::Forbidden, "Path outside the served directory"),
        Resolved::NotFound => Response::error(Status::NotFound, "File not found"),
    }
}
