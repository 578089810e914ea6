use std::sync::Arc;
use std::thread;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use tokio::sync::{mpsc, oneshot};

use crate::chat::{HttpTransport, Message, Sender, SessionController};
use crate::core::AppConfig;

const QUIT_COMMAND: &str = "/quit";

/// Writes above the line being edited so replies that arrive while
/// typing don't garble the prompt
type Printer = Box<dyn ExternalPrinter + Send>;

fn init_tracing() {
    // Logs go to stderr and default to warnings so they don't get
    // mixed into the conversation
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Runs on its own thread since `readline` blocks. Lines are forwarded
// as they are entered so more can be typed while replies are pending.
fn read_lines(tx: mpsc::UnboundedSender<String>, printer_tx: oneshot::Sender<Option<Printer>>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            tracing::error!("Failed to start line editor: {}", err);
            return;
        }
    };
    let printer = match rl.create_external_printer() {
        Ok(printer) => Some(Box::new(printer) as Printer),
        Err(err) => {
            tracing::warn!("Printing without line editor support: {}", err);
            None
        }
    };
    let _ = printer_tx.send(printer);

    loop {
        match rl.readline(">>> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
}

/// Lines to show for the messages appended since `printed`. The
/// terminal already echoes what the user typed so only bot turns are
/// shown.
fn render_new(transcript: &[Message], printed: usize) -> Vec<String> {
    transcript
        .iter()
        .skip(printed)
        .filter(|msg| msg.sender() == Sender::Bot)
        .map(|msg| format!("DigiBot: {}", msg.text()))
        .collect()
}

/// Print everything appended since `printed` and return the new
/// count of printed messages
fn print_new(printer: &mut Option<Printer>, transcript: &[Message], printed: usize) -> usize {
    for line in render_new(transcript, printed) {
        match printer {
            Some(p) => {
                if let Err(err) = p.print(line.clone()) {
                    tracing::warn!("External printer failed: {}", err);
                    println!("{}", line);
                }
            }
            None => println!("{}", line),
        }
    }
    transcript.len()
}

pub async fn run(config: AppConfig) -> Result<()> {
    init_tracing();

    let transport = Arc::new(HttpTransport::new(
        &config.api_base_url,
        config.request_timeout,
    ));
    tracing::debug!("Sending chat requests to {}", transport.url());
    let mut session = SessionController::new(transport, &config);

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    let (printer_tx, printer_rx) = oneshot::channel();
    // Not joined, the thread is left blocked in `readline` on exit
    thread::spawn(move || read_lines(line_tx, printer_tx));
    let mut printer = printer_rx.await.unwrap_or(None);

    let mut printed = print_new(&mut printer, session.transcript(), 0);

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                match line {
                    Some(line) if line.trim() == QUIT_COMMAND => break,
                    Some(line) => {
                        session.set_pending_input(&line);
                        session.submit();
                        printed = print_new(&mut printer, session.transcript(), printed);
                    }
                    None => break,
                }
            }
            Some(_) = session.next_resolution(), if session.outstanding() > 0 => {
                printed = print_new(&mut printer, session.transcript(), printed);
            }
        }
    }

    // Closing the chat drops any replies still in flight
    session.teardown();

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl ExternalPrinter for Recorder {
        fn print(&mut self, msg: String) -> rustyline::Result<()> {
            self.0.lock().unwrap().push(msg);
            Ok(())
        }
    }

    fn transcript() -> Vec<Message> {
        vec![
            Message::bot("Hello"),
            Message::user("When are you open?"),
            Message::bot("9am to 5pm"),
        ]
    }

    #[test]
    fn it_renders_only_bot_turns() {
        assert_eq!(
            render_new(&transcript(), 0),
            vec!["DigiBot: Hello", "DigiBot: 9am to 5pm"]
        );
    }

    #[test]
    fn it_renders_only_unprinted_messages() {
        assert_eq!(render_new(&transcript(), 1), vec!["DigiBot: 9am to 5pm"]);
        assert!(render_new(&transcript(), 3).is_empty());
    }

    #[test]
    fn it_prints_through_external_printer() {
        let recorder = Recorder::default();
        let mut printer: Option<Printer> = Some(Box::new(recorder.clone()));
        let transcript = transcript();

        let printed = print_new(&mut printer, &transcript[..1], 0);
        assert_eq!(printed, 1);
        let printed = print_new(&mut printer, &transcript, printed);
        assert_eq!(printed, 3);

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["DigiBot: Hello", "DigiBot: 9am to 5pm"]
        );
    }
}
