//! Builds sinks from a JSON file and writes some messages through them, reopening every sink
//! in between like a log rotation would.

#[macro_use] extern crate blacksink;

use std::env;
use std::fs::File;

use blacksink::{Registry, Severity};

fn main() {
    let path = env::args()
        .nth(1)
        .expect("USAGE: config FILENAME");

    let cfg: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap())
        .unwrap();

    let registry = Registry::new();
    let logger = registry.logger(&cfg)
        .expect("expect logger to be properly created");

    log!(logger, Severity::Debug, "{} {} HTTP/1.1 {} {}", "GET", "/static/image.png", 404, 347);
    log!(logger, Severity::Info, "nginx/1.6 configured", {
        config: "/etc/nginx/nginx.conf",
        elapsed: 42.15,
    });

    if !registry.reopen_all() {
        eprintln!("some sinks failed to reopen");
    }

    log!(logger, Severity::Warn, "client stopped connection before send body completed", {
        host: "::1",
        port: 10053,
    });
    log!(logger, Severity::Error, "file does not exist: {}", ["/var/www/favicon.ico"]);

    registry.close_all();
}
