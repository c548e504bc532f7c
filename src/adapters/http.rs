//! HTTP API server on ESP-IDF's `httpd`.
//!
//! Each route is a thin shim: read the body, call [`api::handle`], write
//! the response with the CORS headers.  Handlers run on the httpd task;
//! they take the controller lock once per request through
//! [`SharedController`].

use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method as HttpMethod;
use esp_idf_svc::io::{Read, Write};
use log::{debug, info};

use crate::adapters::log_sink::LogEventSink;
use crate::adapters::time::UptimeClock;
use crate::api::{self, Endpoint, Method, CORS_HEADERS, MAX_BODY_LEN};
use crate::app::ports::RelayPort;
use crate::app::service::SharedController;

/// Start the server and register every API route.
pub fn start<R>(
    port: u16,
    shared: SharedController<R>,
    clock: UptimeClock,
) -> anyhow::Result<EspHttpServer<'static>>
where
    R: RelayPort + Send + 'static,
{
    let mut server = EspHttpServer::new(&Configuration {
        http_port: port,
        ..Default::default()
    })?;

    for endpoint in Endpoint::ALL {
        for (method, http_method) in [
            (Method::Get, HttpMethod::Get),
            (Method::Post, HttpMethod::Post),
            (Method::Options, HttpMethod::Options),
        ] {
            if !endpoint.allows(method) {
                continue;
            }
            let shared = shared.clone();
            server.fn_handler(endpoint.path(), http_method, move |req| {
                serve(req, &shared, method, endpoint.path(), clock)
            })?;
        }
    }

    info!("HTTP: API listening on port {}", port);
    Ok(server)
}

fn serve<R: RelayPort>(
    mut req: Request<&mut EspHttpConnection<'_>>,
    shared: &SharedController<R>,
    method: Method,
    path: &str,
    clock: UptimeClock,
) -> anyhow::Result<()> {
    let body = if method == Method::Post {
        read_body(&mut req)?
    } else {
        Vec::new()
    };

    let resp = api::handle(shared, method, path, &body, clock.now_ms(), &mut LogEventSink);
    debug!("HTTP: {:?} {} -> {}", method, path, resp.status);

    let [origin, methods, allow] = CORS_HEADERS;
    let headers = [origin, methods, allow, ("Content-Type", resp.content_type)];

    let mut out = req.into_response(resp.status, None, &headers)?;
    out.write_all(&resp.body)?;
    Ok(())
}

/// Read up to one byte past the limit so oversize bodies are detectable.
fn read_body(req: &mut Request<&mut EspHttpConnection<'_>>) -> anyhow::Result<Vec<u8>> {
    let mut body = vec![0u8; MAX_BODY_LEN + 1];
    let mut len = 0;
    while len < body.len() {
        let n = req.read(&mut body[len..])?;
        if n == 0 {
            break;
        }
        len += n;
    }
    body.truncate(len);
    Ok(body)
}
