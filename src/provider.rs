use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::character_fetch::{self, FetchError};
use crate::state::{Delta, ProviderCommand};

/// Runs every network call off the UI thread. The thread exits when the
/// command sender is dropped.
pub fn spawn_character_provider(
    api_base: String,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            handle_command(&api_base, cmd, &tx);
        }
    })
}

pub fn handle_command(api_base: &str, cmd: ProviderCommand, tx: &Sender<Delta>) {
    match cmd {
        ProviderCommand::CheckHealth => match character_fetch::check_health(api_base) {
            Ok(status) => {
                let _ = tx.send(Delta::Log(format!("[INFO] API {api_base} status: {status}")));
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] API health check failed: {err}")));
            }
        },
        ProviderCommand::FetchCharacter { id } => {
            match character_fetch::fetch_character(api_base, id) {
                Ok(record) => {
                    let class_id = record.class_id;
                    let _ = tx.send(Delta::CharacterLoaded { id, record });
                    if let Some(class_id) = class_id {
                        resolve_class(api_base, class_id, tx);
                    }
                }
                Err(err) => {
                    let _ = tx.send(Delta::CharacterFailed {
                        id,
                        error: failure_text(&err),
                    });
                }
            }
        }
    }
}

fn resolve_class(api_base: &str, class_id: u32, tx: &Sender<Delta>) {
    match character_fetch::fetch_class(api_base, class_id) {
        Ok(Some(info)) => {
            let _ = tx.send(Delta::ClassResolved(info));
        }
        Ok(None) => {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] Class {class_id} missing from class list"
            )));
        }
        Err(err) => {
            let _ = tx.send(Delta::Log(format!("[WARN] Class lookup error: {err}")));
        }
    }
}

fn failure_text(err: &FetchError) -> String {
    match err {
        FetchError::NotFound { .. } => "not found".to_string(),
        other => other.to_string(),
    }
}
