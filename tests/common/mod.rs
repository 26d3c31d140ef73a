#![allow(dead_code)]

use assert_cmd::cargo_bin;
use httpmock::prelude::*;
use serde_json::json;
use std::io::{Error, Write};
use std::process::Command;
use tempfile::NamedTempFile;

/// Writes a positions CSV with the given `(name, price, quantity)` rows.
pub fn positions_csv(rows: &[(&str, &str, &str)]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(["name", "price", "quantity", "item_id"])?;
    for (name, price, quantity) in rows {
        wtr.write_record([*name, *price, *quantity, ""])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(file)
}

/// Serves a fixed transaction status for `order_id`.
pub fn serve_status(server: &MockServer, order_id: &str, status: &str) {
    let path = format!("/transaction/{order_id}/status/");
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(200).json_body(json!({ "status": status }));
    });
}

/// Accepts every order and answers with `id`.
pub fn accept_orders(server: &MockServer, id: u64) {
    server.mock(|when, then| {
        when.method(POST).path("/api/v1/orders/");
        then.status(201).json_body(json!({ "id": id }));
    });
}

/// A `paywatch` command pointed at `server` with a fast poll interval and
/// predictable log output.
pub fn paywatch(server: &MockServer) -> Command {
    let mut cmd = Command::new(cargo_bin!("paywatch"));
    cmd.env_remove("RUST_LOG")
        .env_remove("PAYWATCH_API_KEY")
        .env_remove("PAYWATCH_DB_PATH")
        .env("NO_COLOR", "1")
        .arg("--base-url")
        .arg(server.base_url())
        .arg("--poll-interval-ms")
        .arg("20");
    cmd
}
