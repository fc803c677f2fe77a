//! Google Calendar backend.
//!
//! - [`ServiceAccountAuth`] exchanges a service-account key for access tokens
//! - [`GoogleCalendarClient`] implements [`CalendarBackend`](crate::CalendarBackend)
//!   over the Calendar v3 REST API

pub mod auth;
pub mod client;

pub use auth::{CALENDAR_SCOPE, ServiceAccountAuth, ServiceAccountKey};
pub use client::GoogleCalendarClient;

/// Scripted loopback HTTP server for client tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};

    /// A canned response.
    pub(crate) struct Reply {
        status: String,
        body: String,
    }

    impl Reply {
        pub(crate) fn ok(body: &str) -> Self {
            Self::status("200 OK", body)
        }

        pub(crate) fn status(status: &str, body: &str) -> Self {
            Self {
                status: status.to_string(),
                body: body.to_string(),
            }
        }
    }

    /// A request as received.
    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub(crate) head: String,
        pub(crate) body: String,
    }

    pub(crate) struct TestServer {
        base: String,
        recorded: Arc<Mutex<Vec<Recorded>>>,
    }

    impl TestServer {
        /// Serves `replies` in order, one connection each.
        pub(crate) fn start(replies: Vec<Reply>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let recorded = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&recorded);

            std::thread::spawn(move || {
                for reply in replies {
                    let Ok((mut stream, _)) = listener.accept() else {
                        return;
                    };
                    let request = read_request(&mut stream);
                    sink.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        reply.status,
                        reply.body.len(),
                        reply.body
                    );
                    let _ = stream.write_all(response.as_bytes());
                }
            });

            Self { base, recorded }
        }

        pub(crate) fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        pub(crate) fn requests(&self) -> Vec<Recorded> {
            self.recorded.lock().unwrap().clone()
        }
    }

    fn read_request(stream: &mut std::net::TcpStream) -> Recorded {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];

        let head_end = loop {
            if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = stream.read(&mut buf).unwrap_or(0);
            if n == 0 {
                break data.len();
            }
            data.extend_from_slice(&buf[..n]);
        };

        let head = String::from_utf8_lossy(&data[..head_end]).into_owned();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        while data.len() < head_end + content_length {
            let n = stream.read(&mut buf).unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
        }

        let body = String::from_utf8_lossy(&data[head_end..]).into_owned();
        Recorded { head, body }
    }
}
