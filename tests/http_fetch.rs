use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

use charsheet_terminal::character_fetch::{FetchError, fetch_character, fetch_class};
use charsheet_terminal::provider::handle_command;
use charsheet_terminal::state::{Delta, ProviderCommand};

const THANE: &str = r#"{"name":"Thane","current_hp":12,"max_hp":20,"strength":16,"dexterity":14,"constitution":13,"intelligence":8,"wisdom":10,"charisma":12}"#;
const THANE_FIGHTER: &str = r#"{"name":"Thane","class_id":1,"current_hp":12,"max_hp":20,"strength":16,"dexterity":14,"constitution":13,"intelligence":8,"wisdom":10,"charisma":12}"#;
const CLASSES: &str = r#"[{"id":1,"name":"Fighter","hit_die":10,"primary_ability":"Strength"}]"#;

/// Serves `connections` requests, answering by request path; unknown paths get 404.
fn serve(routes: Vec<(&'static str, u16, &'static str)>, connections: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    thread::spawn(move || {
        for _ in 0..connections {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request_line = String::new();
            let _ = reader.read_line(&mut request_line);
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) => break,
                    Ok(_) if header == "\r\n" => break,
                    Ok(_) => {}
                    Err(_) => break,
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = routes
                .iter()
                .find(|(p, _, _)| *p == path)
                .map(|(_, s, b)| (*s, *b))
                .unwrap_or((404, r#"{"detail":"Not Found"}"#));
            let reason = match status {
                200 => "OK",
                404 => "Not Found",
                _ => "Internal Server Error",
            };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    format!("http://{addr}")
}

#[test]
fn fetches_character_record() {
    let base = serve(vec![("/api/characters/7", 200, THANE)], 1);
    let record = fetch_character(&base, 7).expect("fetch should succeed");
    assert_eq!(record.name, "Thane");
    assert_eq!(record.armor_class(), 14);
}

#[test]
fn missing_character_maps_to_not_found() {
    let base = serve(Vec::new(), 1);
    let err = fetch_character(&base, 99).expect_err("404 should fail");
    assert!(matches!(err, FetchError::NotFound { id: 99 }));
}

#[test]
fn server_error_maps_to_status() {
    let base = serve(vec![("/api/characters/1", 500, "{}")], 1);
    let err = fetch_character(&base, 1).expect_err("500 should fail");
    assert!(matches!(err, FetchError::Status { status: 500, .. }));
}

#[test]
fn malformed_body_maps_to_parse_error() {
    let base = serve(vec![("/api/characters/2", 200, r#"{"name":"x"}"#)], 1);
    let err = fetch_character(&base, 2).expect_err("bad payload should fail");
    assert!(matches!(err, FetchError::Parse(_)));
}

#[test]
fn looks_up_class_by_id() {
    let base = serve(vec![("/api/classes", 200, CLASSES)], 2);
    let class = fetch_class(&base, 1).expect("fetch").expect("class present");
    assert_eq!(class.name, "Fighter");
    assert!(fetch_class(&base, 4).expect("fetch").is_none());
}

#[test]
fn provider_reports_failure_as_delta() {
    let base = serve(Vec::new(), 1);
    let (tx, rx) = mpsc::channel();
    handle_command(&base, ProviderCommand::FetchCharacter { id: 5 }, &tx);
    drop(tx);

    let deltas: Vec<Delta> = rx.iter().collect();
    assert_eq!(deltas.len(), 1);
    match &deltas[0] {
        Delta::CharacterFailed { id, error } => {
            assert_eq!(*id, 5);
            assert_eq!(error, "not found");
        }
        other => panic!("unexpected delta: {other:?}"),
    }
}

#[test]
fn provider_loads_character_then_class() {
    let base = serve(
        vec![
            ("/api/characters/7", 200, THANE_FIGHTER),
            ("/api/classes", 200, CLASSES),
        ],
        2,
    );
    let (tx, rx) = mpsc::channel();
    handle_command(&base, ProviderCommand::FetchCharacter { id: 7 }, &tx);
    drop(tx);

    let deltas: Vec<Delta> = rx.iter().collect();
    assert_eq!(deltas.len(), 2);
    assert!(matches!(&deltas[0], Delta::CharacterLoaded { id: 7, record } if record.name == "Thane"));
    assert!(matches!(&deltas[1], Delta::ClassResolved(info) if info.hit_die == Some(10)));
}

#[test]
fn provider_logs_health() {
    let base = serve(vec![("/api/health", 200, r#"{"status":"healthy"}"#)], 1);
    let (tx, rx) = mpsc::channel();
    handle_command(&base, ProviderCommand::CheckHealth, &tx);
    drop(tx);

    let deltas: Vec<Delta> = rx.iter().collect();
    assert!(matches!(&deltas[..], [Delta::Log(msg)] if msg.contains("healthy")));
}
