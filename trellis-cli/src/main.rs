use clap::Parser;
use futures::{SinkExt, StreamExt};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use trellis_proto::line::LineCodec;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "trellis-cli", about = "Interactive CLI for the Trellis graph server")]
struct Cli {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 50000)]
    port: u16,

    /// Execute a single command and exit
    #[arg(short, long)]
    command: Option<String>,
}

// ---------------------------------------------------------------------------
// Help text
// ---------------------------------------------------------------------------

const HELP_TEXT: &str = "\
Available commands:
  HI, I AM <name>                - Introduce yourself
  ADD NODE <id>                  - Add a node
  REMOVE NODE <id>               - Remove a node and all its edges
  ADD EDGE <src> <dst> <weight>  - Add a directed weighted edge
  REMOVE EDGE <src> <dst>        - Remove all edges between two nodes
  SHORTEST PATH <src> <dst>      - Shortest distance between two nodes
  CLOSER THAN <weight> <src>     - Nodes strictly closer than a bound
  BYE MATE!                      - End the session
  help                           - Show this help
  quit / exit                    - Exit the CLI";

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// A connected session: one framed line stream, greeting already consumed.
struct Connection {
    framed: Framed<TcpStream, LineCodec>,
}

impl Connection {
    async fn open(host: &str, port: u16) -> Result<(Self, String), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr).await?;
        let mut framed = Framed::new(stream, LineCodec::new());
        let greeting = match framed.next().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(Box::new(e)),
            None => return Err("connection closed before greeting".into()),
        };
        Ok((Connection { framed }, greeting))
    }

    async fn send(&mut self, line: &str) -> Result<String, Box<dyn std::error::Error>> {
        self.framed.send(line).await?;
        match self.framed.next().await {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(Box::new(e)),
            None => Err("connection closed without response".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (mut conn, greeting) = match Connection::open(&cli.host, cli.port).await {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("Error: failed to connect to {}:{}: {}", cli.host, cli.port, e);
            std::process::exit(1);
        }
    };

    // Single-command mode: execute and exit.
    if let Some(ref cmd) = cli.command {
        match conn.send(cmd).await {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Interactive REPL mode.
    println!("{}", greeting);
    println!(
        "trellis-cli — connected to {}:{} (type 'help' for commands, 'quit' to exit)",
        cli.host, cli.port
    );

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        match rl.readline("trellis> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(trimmed);

                let lower = trimmed.to_lowercase();
                if lower == "quit" || lower == "exit" {
                    println!("Bye!");
                    break;
                }
                if lower == "help" {
                    println!("{}", HELP_TEXT);
                    continue;
                }

                match conn.send(trimmed).await {
                    Ok(output) => {
                        println!("{}", output);
                        // The server hangs up after a farewell.
                        if trimmed == "BYE MATE!" {
                            break;
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("(Use 'quit' or 'exit' to leave)");
            }
            Err(ReadlineError::Eof) => {
                println!("Bye!");
                break;
            }
            Err(e) => {
                eprintln!("Readline error: {}", e);
                break;
            }
        }
    }
}
