use std::{
    io,
    sync::{Arc, Mutex},
};

use commune::{models::CommuneConfig, Client};
use httptest::Server;
use serde_json::{json, Value};
use tracing::{subscriber::DefaultGuard, Level};
use tracing_subscriber::fmt::MakeWriter;

pub const PROJECT_KEY: &str = "project_key";
pub const DEVICE_ID: &str = "device-1";

pub const ACTIVATE_PATH: &str = "/api/client/experiment/activate";
pub const VARIANT_PATH: &str = "/api/client/experiment/variant";
pub const TRACK_PATH: &str = "/api/client/experiment/track";

pub fn create_client(server: &Server) -> Client {
    commune::create_client(CommuneConfig {
        device_id: Some(DEVICE_ID.to_string()),
        api_url: Some(format!("http://{}", server.addr())),
        ..CommuneConfig::new(PROJECT_KEY)
    })
}

pub fn two_variables() -> Value {
    json!({
        "variables": [
            {"name": "a", "variant": {"value": 1}},
            {"name": "b", "variant": {"value": "x"}}
        ]
    })
}

/// Collects everything logged on the current thread while the guard is alive.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_max_level(Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().expect("log buffer lock");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

pub struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer lock")
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(self.buf.clone())
    }
}
