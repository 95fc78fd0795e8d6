use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::error::AuthError;

/// Path the identity provider redirects the browser to after consent.
pub const HANDLER_PATH: &str = "/__/auth/handler";

/// How long the user gets to finish signing in within the browser.
pub const FEDERATED_TIMEOUT: Duration = Duration::from_secs(120);

const MAX_REQUEST_HEAD: usize = 16 * 1024;

const DONE_PAGE: &str = "<!doctype html><html><head><title>CASH Panel</title></head>\
<body><p>Signed in. You can close this window and return to CASH Panel.</p></body></html>";

/// A one-shot HTTP listener on the loopback interface that receives the browser redirect at
/// the end of a federated sign-in.
pub struct LoopbackRedirect {
    listener: TcpListener,
    address: SocketAddr,
}

impl LoopbackRedirect {
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        let address = listener.local_addr()?;
        debug!("Listening for the sign-in redirect on {}", address);
        Ok(LoopbackRedirect { listener, address })
    }

    pub fn continue_uri(&self) -> String {
        format!("http://{}{}", self.address, HANDLER_PATH)
    }

    /// Waits for the redirect and returns the full URI the browser requested, including the
    /// query string the provider appended.
    pub async fn wait(self, deadline: Duration) -> Result<String, AuthError> {
        let address = self.address;

        match timeout(deadline, self.accept_redirect()).await {
            Ok(Ok(target)) => Ok(format!("http://{}{}", address, target)),
            Ok(Err(err)) => Err(AuthError::Federated {
                code: "auth/internal-error",
                reason: format!("Failed to receive the sign-in redirect: {}", err),
            }),
            Err(_) => Err(AuthError::Federated {
                code: "auth/popup-closed-by-user",
                reason: "The sign-in window was closed before finishing.".to_string(),
            }),
        }
    }

    async fn accept_redirect(&self) -> io::Result<String> {
        loop {
            let (mut stream, peer) = self.listener.accept().await?;
            debug!("Sign-in redirect connection from {}", peer);

            let head = match read_request_head(&mut stream).await {
                Ok(head) => head,
                Err(err) => {
                    warn!("Failed to read request from {}: {}", peer, err);
                    continue;
                },
            };

            match parse_request_target(&head) {
                Some(target) if target.starts_with(HANDLER_PATH) => {
                    respond(&mut stream, "200 OK", DONE_PAGE).await?;
                    info!("Received the sign-in redirect");
                    return Ok(target.to_string());
                },
                // browsers also ask for /favicon.ico and friends
                _ => respond(&mut stream, "404 Not Found", "").await?,
            }
        }
    }
}

async fn read_request_head(stream: &mut TcpStream) -> io::Result<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];

    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        if head.len() > MAX_REQUEST_HEAD {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "request head too large"));
        }

        let read = stream.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        head.extend_from_slice(&buf[..read]);
    }

    Ok(String::from_utf8_lossy(&head).to_string())
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> io::Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body,
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// `GET /__/auth/handler?code=x HTTP/1.1` => `/__/auth/handler?code=x`
pub fn parse_request_target(head: &str) -> Option<&str> {
    let request_line = head.lines().next()?;
    let mut parts = request_line.split_whitespace();

    if parts.next()? != "GET" {
        return None;
    }

    let target = parts.next()?;
    parts.next()?.starts_with("HTTP/").then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_target() {
        assert_eq!(
            parse_request_target("GET /__/auth/handler?state=a&code=b HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n"),
            Some("/__/auth/handler?state=a&code=b"),
        );
        assert_eq!(parse_request_target("POST /__/auth/handler HTTP/1.1\r\n\r\n"), None);
        assert_eq!(parse_request_target("GET /__/auth/handler\r\n\r\n"), None);
        assert_eq!(parse_request_target(""), None);
    }

    #[tokio::test]
    async fn test_receives_redirect() {
        let redirect = LoopbackRedirect::bind().await.unwrap();
        let continue_uri = redirect.continue_uri();
        let address = continue_uri.trim_start_matches("http://").trim_end_matches(HANDLER_PATH).to_string();

        let browser = tokio::spawn(async move {
            let mut favicon = TcpStream::connect(&address).await.unwrap();
            favicon.write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();
            let mut response = String::new();
            favicon.read_to_string(&mut response).await.unwrap();
            assert!(response.starts_with("HTTP/1.1 404"));

            let mut stream = TcpStream::connect(&address).await.unwrap();
            stream.write_all(b"GET /__/auth/handler?code=abc HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();
            let mut response = String::new();
            stream.read_to_string(&mut response).await.unwrap();
            response
        });

        let request_uri = redirect.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(request_uri, format!("{}?code=abc", continue_uri));

        let response = browser.await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("You can close this window"));
    }

    #[tokio::test]
    async fn test_times_out() {
        let redirect = LoopbackRedirect::bind().await.unwrap();
        let err = redirect.wait(Duration::from_millis(20)).await.unwrap_err();
        assert_eq!(err.code(), Some("auth/popup-closed-by-user"));
    }
}
