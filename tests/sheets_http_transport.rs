use brikksd::error::SheetsError;
use brikksd::sheets::{decode_value_range, HttpSheetsTransport, SheetsTransport};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Serves one canned response per entry and returns the request targets seen.
fn serve(replies: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let addr = listener.local_addr().expect("stub addr");
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in replies {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("read request line");
            loop {
                let mut header = String::new();
                let n = reader.read_line(&mut header).expect("read header");
                if n == 0 || header == "\r\n" {
                    break;
                }
            }
            let target = request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string();
            seen.push(target);
            write!(
                stream,
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .expect("write response");
            stream.flush().expect("flush response");
        }
        seen
    });
    (format!("http://{}", addr), handle)
}

#[test]
fn reads_values_and_stringifies_cells() {
    let body = r#"{
        "range": "Disciplines!A1:C3",
        "majorDimension": "ROWS",
        "values": [["id", "nom", "coef"], ["d1", "Histoire", 2], ["d2", null, true]]
    }"#;
    let (base, server) = serve(vec![(200, body.to_string())]);

    let transport = HttpSheetsTransport::new(&format!("{base}/v4/spreadsheets"), "sheet-123", "key-abc")
        .expect("build transport");
    let grid = transport.read_range("Disciplines!A1:C3").expect("read range");

    assert_eq!(grid.len(), 3);
    assert_eq!(grid[1], vec!["d1", "Histoire", "2"]);
    assert_eq!(grid[2], vec!["d2", "", "true"]);

    let seen = server.join().expect("stub server");
    assert!(
        seen[0].starts_with("/v4/spreadsheets/sheet-123/values/Disciplines!A1:C3"),
        "unexpected target {}",
        seen[0]
    );
    assert!(seen[0].ends_with("?key=key-abc"), "unexpected target {}", seen[0]);
}

#[test]
fn non_success_status_is_a_remote_read_error() {
    let (base, server) = serve(vec![(
        403,
        r#"{"error":{"code":403,"message":"The caller does not have permission"}}"#.to_string(),
    )]);
    let transport = HttpSheetsTransport::new(&base, "sheet-123", "bad-key").expect("build transport");

    match transport.read_range("Admins") {
        Err(SheetsError::RemoteRead { status, range }) => {
            assert_eq!(status, 403);
            assert_eq!(range, "Admins");
        }
        other => panic!("expected RemoteRead, got {other:?}"),
    }
    let _ = server.join();
}

#[test]
fn unreachable_host_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").expect("bind");
        l.local_addr().expect("addr").port()
    };
    let transport = HttpSheetsTransport::new(&format!("http://127.0.0.1:{port}"), "s", "k")
        .expect("build transport");
    match transport.read_range("Eleves") {
        Err(SheetsError::Transport { range, .. }) => assert_eq!(range, "Eleves"),
        other => panic!("expected Transport error, got {other:?}"),
    }
}

#[test]
fn missing_values_field_is_an_empty_grid() {
    let grid = decode_value_range("Vide", r#"{"range":"Vide!A1:Z1000","majorDimension":"ROWS"}"#)
        .expect("decode");
    assert!(grid.is_empty());
    assert!(matches!(
        decode_value_range("Vide", "<html>quota</html>"),
        Err(SheetsError::Decode { .. })
    ));
}
