//! A stand-in for the hosted points service: canned responses per path and a
//! log of every request the adapter made.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use points_backend::config::hosted::HostedServiceConfig;

pub const ANON_KEY: &str = "anon-key-for-tests";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: String,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: String,
    delay: Duration,
}

#[derive(Debug, Default)]
struct Inner {
    canned: HashMap<String, Canned>,
    seen: Vec<Recorded>,
}

type Shared = Arc<Mutex<Inner>>;

pub struct FakeHosted {
    pub base_url: String,
    inner: Shared,
    handle: ServerHandle,
}

async fn handle(req: HttpRequest, body: web::Bytes, shared: web::Data<Shared>) -> HttpResponse {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let canned = {
        let mut inner = shared.lock();
        inner.seen.push(Recorded {
            method: req.method().to_string(),
            path: req.path().to_string(),
            query: req.query_string().to_string(),
            apikey: header("apikey"),
            authorization: header("authorization"),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
        inner.canned.get(req.path()).cloned()
    };

    let Some(canned) = canned else {
        return HttpResponse::NotFound()
            .content_type("application/json")
            .body(r#"{"message":"no canned response"}"#);
    };
    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }
    HttpResponse::build(
        actix_web::http::StatusCode::from_u16(canned.status).expect("valid status"),
    )
    .content_type("application/json")
    .body(canned.body)
}

impl FakeHosted {
    /// Bind on an ephemeral port. Must run inside an actix system (`#[actix_web::test]`).
    pub async fn start() -> Self {
        let inner: Shared = Arc::default();
        let data = web::Data::new(inner.clone());

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(handle))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind fake hosted service");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://{addr}"),
            inner,
            handle,
        }
    }

    pub fn respond(&self, path: &str, status: u16, body: serde_json::Value) {
        self.respond_raw(path, status, &body.to_string());
    }

    pub fn respond_raw(&self, path: &str, status: u16, body: &str) {
        self.inner.lock().canned.insert(
            path.to_string(),
            Canned {
                status,
                body: body.to_string(),
                delay: Duration::ZERO,
            },
        );
    }

    pub fn respond_slowly(&self, path: &str, delay: Duration) {
        self.inner.lock().canned.insert(
            path.to_string(),
            Canned {
                status: 200,
                body: "[]".to_string(),
                delay,
            },
        );
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().seen.clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("at least one request")
    }

    pub fn config(&self) -> HostedServiceConfig {
        let mut config = HostedServiceConfig::new(format!("{}/", self.base_url), ANON_KEY);
        config.request_timeout = Duration::from_millis(500);
        config
    }

    pub async fn shutdown(self) {
        self.handle.stop(false).await;
    }
}
