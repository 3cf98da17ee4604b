//! Local configuration page transport.
//!
//! Routes `/` (configuration), `/temp` (room temperature telemetry) and
//! `/status` onto [`InboundRequest`]s, hands them to the main loop through
//! a [`SharedRequestQueue`] and turns the [`Response`] into an HTTP reply.
//! Form fields come from the query string and, for `POST`, from an
//! `application/x-www-form-urlencoded` body; body fields win.
//!
//! - **`target_os = "espidf"`**: [`HttpServerAdapter`] registers the routes
//!   on an `EspHttpServer`.  Handlers run on the httpd task and block until
//!   the main loop has answered.
//! - **all targets**: routing, form decoding and reply mapping, so the whole
//!   path short of the socket is host-testable.

use std::time::Duration;

use log::debug;

use super::request_queue::SharedRequestQueue;
use crate::app::commands::{FormData, InboundRequest, Method, Response};

/// Largest accepted request body.  The configuration form is well below.
pub const MAX_FORM_BODY: usize = 512;

/// How long a handler waits for the main loop.
pub const ANSWER_TIMEOUT: Duration = Duration::from_secs(2);

pub const ROUTES: [&str; 3] = ["/", "/temp", "/status"];

/// Transport-level reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub location: Option<&'static str>,
    pub body: String,
}

impl HttpReply {
    fn text(status: u16, reason: &'static str, body: &str) -> Self {
        Self {
            status,
            reason,
            content_type: "text/plain; charset=utf-8",
            location: None,
            body: body.to_owned(),
        }
    }

    pub fn not_found() -> Self {
        Self::text(404, "Not Found", "Not Found")
    }

    pub fn too_large() -> Self {
        Self::text(413, "Payload Too Large", "Payload Too Large")
    }

    /// Map the domain answer; `None` means the main loop did not answer.
    pub fn from_response(response: Option<Response>) -> Self {
        match response {
            Some(Response::Redirect(location)) => Self {
                location: Some(location),
                ..Self::text(303, "See Other", "")
            },
            Some(Response::Ok) => Self::text(200, "OK", ""),
            Some(Response::BadRequest) => Self::text(400, "Bad Request", "Bad Request"),
            Some(Response::InternalError) => {
                Self::text(500, "Internal Server Error", "Settings applied but not saved")
            }
            Some(Response::Status(report)) => match report.to_json() {
                Ok(body) => Self {
                    content_type: "application/json; charset=utf-8",
                    body,
                    ..Self::text(200, "OK", "")
                },
                Err(_) => Self::text(500, "Internal Server Error", "Status unavailable"),
            },
            None => Self::text(503, "Service Unavailable", "Busy, retry"),
        }
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Decode one `application/x-www-form-urlencoded` component.  Malformed
/// escapes are kept literally.
pub fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let escaped = bytes
                    .get(i + 1..i + 3)
                    .and_then(|pair| Some((hex_digit(pair[0])? << 4) | hex_digit(pair[1])?));
                if let Some(b) = escaped {
                    out.push(b);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Add the fields of `raw` (`a=1&b=2`) to `form`.  A key without `=` is
/// recorded with an empty value.
pub fn decode_form_into(form: &mut FormData, raw: &str) {
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        form.insert(&percent_decode(key), &percent_decode(value));
    }
}

/// Map a request line onto the domain request.  `None` for unknown paths.
pub fn route(method: Method, uri: &str, body: &str) -> Option<InboundRequest> {
    let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
    let mut form = FormData::new();
    decode_form_into(&mut form, query);
    if method == Method::Post {
        decode_form_into(&mut form, body);
    }

    match path {
        "/" => Some(InboundRequest::Config { method, form }),
        "/temp" => Some(InboundRequest::Telemetry { method, form }),
        "/status" => Some(InboundRequest::Status),
        _ => None,
    }
}

/// Route, wait for the main loop and build the reply.  `body` is `None`
/// when it exceeded [`MAX_FORM_BODY`].
pub fn dispatch(
    queue: &SharedRequestQueue,
    method: Method,
    uri: &str,
    body: Option<&str>,
    timeout: Duration,
) -> HttpReply {
    let Some(body) = body else {
        return HttpReply::too_large();
    };
    let Some(request) = route(method, uri, body) else {
        return HttpReply::not_found();
    };
    debug!("HTTP: {:?} {}", method, uri);
    HttpReply::from_response(queue.submit_and_wait(request, timeout))
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF server
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use espidf::HttpServerAdapter;

#[cfg(target_os = "espidf")]
mod espidf {
    use esp_idf_svc::http::server::{Configuration as HttpConfiguration, EspHttpConnection, EspHttpServer, Request};
    use esp_idf_svc::http::{Headers, Method as HttpMethod};
    use esp_idf_svc::io::{Read, Write};
    use log::info;

    use super::{ANSWER_TIMEOUT, HttpReply, MAX_FORM_BODY, ROUTES, dispatch};
    use crate::adapters::request_queue::SharedRequestQueue;
    use crate::app::commands::Method;

    type HttpRequest<'r, 'c> = Request<&'r mut EspHttpConnection<'c>>;

    /// Owns the running server; dropping it stops serving.
    pub struct HttpServerAdapter {
        _server: EspHttpServer<'static>,
    }

    impl HttpServerAdapter {
        pub fn start(queue: &SharedRequestQueue, port: u16) -> anyhow::Result<Self> {
            let conf = HttpConfiguration {
                http_port: port,
                stack_size: 8 * 1024,
                ..Default::default()
            };
            let mut server = EspHttpServer::new(&conf)?;

            for path in ROUTES {
                for (http_method, method) in [(HttpMethod::Get, Method::Get), (HttpMethod::Post, Method::Post)] {
                    let queue = queue.clone();
                    server.fn_handler::<anyhow::Error, _>(path, http_method, move |mut req| {
                        let uri = req.uri().to_owned();
                        let body = read_body(&mut req)?;
                        let reply = dispatch(&queue, method, &uri, body.as_deref(), ANSWER_TIMEOUT);
                        write_reply(req, &reply)
                    })?;
                }
            }

            info!("HTTP: configuration page on port {}", port);
            Ok(Self { _server: server })
        }
    }

    fn read_body(req: &mut HttpRequest<'_, '_>) -> anyhow::Result<Option<String>> {
        let len = req.content_len().unwrap_or(0) as usize;
        if len > MAX_FORM_BODY {
            return Ok(None);
        }
        let mut body = vec![0u8; len];
        if len > 0 {
            req.read_exact(&mut body)?;
        }
        Ok(Some(String::from_utf8_lossy(&body).into_owned()))
    }

    fn write_reply(req: HttpRequest<'_, '_>, reply: &HttpReply) -> anyhow::Result<()> {
        let headers = [
            ("Content-Type", reply.content_type),
            ("Location", reply.location.unwrap_or("/")),
        ];
        let used = if reply.location.is_some() { 2 } else { 1 };
        req.into_response(reply.status, Some(reply.reason), &headers[..used])?
            .write_all(reply.body.as_bytes())?;
        Ok(())
    }
}
