//! Shared utilities for integration testing against a mock admin server.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use gateway_sync::subscriber::{Subscriber, SubscriberError};

/// One scripted reply for the listener endpoint.
pub enum ListenReply {
    /// Report these groups as changed.
    Changed(Vec<&'static str>),
    /// Report no changes immediately.
    Empty,
    /// Return a non-success envelope code.
    ErrorCode(i64),
}

/// In-memory admin server state, programmable from tests.
///
/// The listener endpoint pops scripted replies; with an empty script it
/// holds the request open for `hang` to emulate a server-side long poll.
pub struct MockAdmin {
    groups: Mutex<HashMap<String, Value>>,
    listen_script: Mutex<VecDeque<ListenReply>>,
    hang: Duration,
    fetch_error_code: Mutex<Option<i64>>,
    fetch_stall: Mutex<Option<Duration>>,
    pub fetch_calls: AtomicU32,
    pub listen_calls: AtomicU32,
}

impl MockAdmin {
    /// Bind the mock admin on an ephemeral port and return its base URL.
    pub async fn start(hang: Duration) -> (Arc<MockAdmin>, String) {
        let admin = Arc::new(MockAdmin {
            groups: Mutex::new(HashMap::new()),
            listen_script: Mutex::new(VecDeque::new()),
            hang,
            fetch_error_code: Mutex::new(None),
            fetch_stall: Mutex::new(None),
            fetch_calls: AtomicU32::new(0),
            listen_calls: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/configs/fetch", get(fetch_handler))
            .route("/configs/listener", post(listener_handler))
            .with_state(admin.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (admin, format!("http://{}", addr))
    }

    /// Set the data set the fetch endpoint serves for a group.
    pub fn set_group(&self, name: &str, md5: &str, last_modify_time: i64, items: Vec<Value>) {
        self.groups.lock().unwrap().insert(
            name.to_string(),
            json!({"md5": md5, "lastModifyTime": last_modify_time, "data": items}),
        );
    }

    /// Queue a listener reply; consumed in order, one per listen call.
    pub fn push_listen(&self, reply: ListenReply) {
        self.listen_script.lock().unwrap().push_back(reply);
    }

    /// Make the fetch endpoint answer with a non-success envelope code.
    pub fn fail_fetch_with(&self, code: i64) {
        *self.fetch_error_code.lock().unwrap() = Some(code);
    }

    /// Make the fetch endpoint accept the request and then stall before
    /// responding, emulating a wedged server.
    pub fn stall_fetch(&self, delay: Duration) {
        *self.fetch_stall.lock().unwrap() = Some(delay);
    }
}

async fn fetch_handler(State(admin): State<Arc<MockAdmin>>) -> Json<Value> {
    admin.fetch_calls.fetch_add(1, Ordering::SeqCst);

    let stall = *admin.fetch_stall.lock().unwrap();
    if let Some(delay) = stall {
        tokio::time::sleep(delay).await;
    }

    if let Some(code) = *admin.fetch_error_code.lock().unwrap() {
        return Json(json!({"code": code, "message": "mock failure", "data": null}));
    }

    let data: Value = {
        let groups = admin.groups.lock().unwrap();
        Value::Object(groups.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    };
    Json(json!({"code": 200, "message": "success", "data": data}))
}

async fn listener_handler(
    State(admin): State<Arc<MockAdmin>>,
    Json(_digests): Json<Value>,
) -> Json<Value> {
    admin.listen_calls.fetch_add(1, Ordering::SeqCst);

    let reply = admin.listen_script.lock().unwrap().pop_front();
    match reply {
        Some(ListenReply::Changed(groups)) => {
            Json(json!({"code": 200, "message": "success", "data": groups}))
        }
        Some(ListenReply::Empty) => Json(json!({"code": 200, "message": "success", "data": []})),
        Some(ListenReply::ErrorCode(code)) => {
            Json(json!({"code": code, "message": "mock failure", "data": null}))
        }
        None => {
            // Emulate the server-side long-poll window.
            tokio::time::sleep(admin.hang).await;
            Json(json!({"code": 200, "message": "success", "data": []}))
        }
    }
}

/// Subscriber that records every notification it receives.
pub struct RecordingSubscriber {
    name: String,
    fail: bool,
    pub full: Mutex<Vec<Vec<Value>>>,
    pub incremental: Mutex<Vec<Vec<Value>>>,
}

impl RecordingSubscriber {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail: false,
            full: Mutex::new(Vec::new()),
            incremental: Mutex::new(Vec::new()),
        })
    }

    /// A subscriber that records the delivery, then reports failure.
    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail: true,
            full: Mutex::new(Vec::new()),
            incremental: Mutex::new(Vec::new()),
        })
    }

    pub fn full_count(&self) -> usize {
        self.full.lock().unwrap().len()
    }

    pub fn incremental_count(&self) -> usize {
        self.incremental.lock().unwrap().len()
    }

    pub fn last_incremental(&self) -> Option<Vec<Value>> {
        self.incremental.lock().unwrap().last().cloned()
    }
}

impl Subscriber for RecordingSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_full_refresh(&self, items: &[Value]) -> Result<(), SubscriberError> {
        self.full.lock().unwrap().push(items.to_vec());
        if self.fail {
            return Err(SubscriberError::new("simulated failure"));
        }
        Ok(())
    }

    fn on_incremental_update(&self, items: &[Value]) -> Result<(), SubscriberError> {
        self.incremental.lock().unwrap().push(items.to_vec());
        if self.fail {
            return Err(SubscriberError::new("simulated failure"));
        }
        Ok(())
    }
}

/// One scripted reply for the flaky admin's listener endpoint.
pub enum RawListenReply {
    /// Drop the connection without writing a response, so the client sees
    /// the connection break mid-request.
    Abort,
    /// Report these groups as changed.
    Changed(Vec<&'static str>),
}

/// A raw-TCP admin server that can break connections on demand.
///
/// Speaks just enough HTTP/1.1 for the two config endpoints and closes the
/// connection after every response, so each request is a fresh connection
/// and a scripted `Abort` reliably surfaces as a transport failure.
pub struct FlakyAdmin {
    groups: Mutex<HashMap<String, Value>>,
    listen_script: Mutex<VecDeque<RawListenReply>>,
    hang: Duration,
    pub listen_calls: AtomicU32,
}

impl FlakyAdmin {
    /// Bind the flaky admin on an ephemeral port and return its base URL.
    pub async fn start(hang: Duration) -> (Arc<FlakyAdmin>, String) {
        let admin = Arc::new(FlakyAdmin {
            groups: Mutex::new(HashMap::new()),
            listen_script: Mutex::new(VecDeque::new()),
            hang,
            listen_calls: AtomicU32::new(0),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = admin.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let state = state.clone();
                        tokio::spawn(handle_raw_connection(state, socket));
                    }
                    Err(_) => break,
                }
            }
        });

        (admin, format!("http://{}", addr))
    }

    /// Set the data set the fetch endpoint serves for a group.
    pub fn set_group(&self, name: &str, md5: &str, last_modify_time: i64, items: Vec<Value>) {
        self.groups.lock().unwrap().insert(
            name.to_string(),
            json!({"md5": md5, "lastModifyTime": last_modify_time, "data": items}),
        );
    }

    /// Queue a listener reply; consumed in order, one per listen call.
    pub fn push_listen(&self, reply: RawListenReply) {
        self.listen_script.lock().unwrap().push_back(reply);
    }
}

async fn handle_raw_connection(admin: Arc<FlakyAdmin>, mut socket: TcpStream) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let request = String::from_utf8_lossy(&request).into_owned();

    if request.starts_with("GET /configs/fetch") {
        let data: Value = {
            let groups = admin.groups.lock().unwrap();
            Value::Object(groups.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        };
        write_json(&mut socket, json!({"code": 200, "message": "success", "data": data})).await;
    } else if request.starts_with("POST /configs/listener") {
        admin.listen_calls.fetch_add(1, Ordering::SeqCst);
        let reply = admin.listen_script.lock().unwrap().pop_front();
        match reply {
            Some(RawListenReply::Abort) => {
                // Returning drops the socket with no response written.
            }
            Some(RawListenReply::Changed(groups)) => {
                write_json(
                    &mut socket,
                    json!({"code": 200, "message": "success", "data": groups}),
                )
                .await;
            }
            None => {
                // Emulate the server-side long-poll window.
                tokio::time::sleep(admin.hang).await;
                write_json(&mut socket, json!({"code": 200, "message": "success", "data": []}))
                    .await;
            }
        }
    }
}

/// Read one full HTTP request (headers plus Content-Length body).
async fn read_request(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).into_owned();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= pos + 4 + content_length {
                return Some(buf);
            }
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

async fn write_json(socket: &mut TcpStream, body: Value) {
    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Poll a condition until it holds or the timeout elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
