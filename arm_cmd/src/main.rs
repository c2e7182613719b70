//! # Arm command line
//!
//! Interactive ground-side prompt which parses arm commands and sends them
//! to the arm exec over the TC channel.
//!
//! Commands follow the `ArmCmd` subcommand grammar, for example:
//!
//! ```text
//! Arm $ deploy
//! Arm $ move 45 30
//! Arm $ grip-set 60
//! Arm $ set-state Stowed
//! Arm $ set-tol 2.0 2.0 5.0
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use rustyline::error::ReadlineError;
use rustyline::Editor;
use structopt::StructOpt;

// Internal
use comms_if::{
    arm::ArmState,
    net::{zmq, MonitoredSocket, SocketOptions},
    tc::{
        arm_ctrl::{ArmCmd, ArmTolerances},
        Tc, TcResponse,
    },
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "Arm $ ";
const HISTORY_PATH: &str = "data/history.txt";

/// Default TC endpoint of the arm exec
const DEFAULT_ENDPOINT: &str = "tcp://localhost:5030";

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() {
    // The endpoint may be overridden with the first CLI argument
    let endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from(DEFAULT_ENDPOINT));

    // Connect the TC socket
    let ctx = zmq::Context::new();
    let socket_options = SocketOptions {
        block_on_first_connect: false,
        connect_timeout: 1000,
        linger: 1,
        recv_timeout: 2000,
        send_timeout: 1000,
        req_correlate: true,
        req_relaxed: true,
        ..Default::default()
    };
    let socket = match MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &endpoint) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not connect to the arm exec at {}: {}", endpoint, e);
            return;
        }
    };

    println!("Connected to the arm exec at {}", endpoint);
    println!("Type a command, or \"exit\" to quit\n");

    let mut rl = Editor::<()>::new();
    if rl.load_history(HISTORY_PATH).is_err() {
        println!("No history detected");
    }

    loop {
        let readline = rl.readline(PROMPT);
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }

                rl.add_history_entry(line);

                match build_tc(line) {
                    Some(tc) => send_tc(&socket, &tc),
                    None => (),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                println!("Unhandled Error: {:?}", err);
                break;
            }
        }
    }

    rl.save_history(HISTORY_PATH).ok();
}

/// Build a TC from the given input line, or `None` (with a message printed)
/// if the line couldn't be parsed.
fn build_tc(line: &str) -> Option<Tc> {
    let split: Vec<&str> = line.split_whitespace().collect();

    let tc = match split[0] {
        // Manual state override, e.g. `set-state Stowed`
        "set-state" => {
            if split.len() != 2 {
                println!("Usage: set-state <ArmState>");
                return None;
            }
            let state: ArmState = match serde_json::from_str(&format!("\"{}\"", split[1])) {
                Ok(s) => s,
                Err(_) => {
                    println!("{} is not a valid arm state", split[1]);
                    return None;
                }
            };
            Tc::arm_set_state(&state)
        }

        // Tolerance update, e.g. `set-tol 2.0 2.0 5.0`
        "set-tol" => {
            let tols = match ArmTolerances::from_iter_safe(split.iter().copied()) {
                Ok(t) => t,
                Err(e) => {
                    println!("{}", e.message);
                    return None;
                }
            };
            Tc::arm_set_tolerances(&tols)
        }

        // Anything else is parsed with the ArmCmd grammar
        _ => {
            let cmd = match ArmCmd::from_iter_safe(std::iter::once("arm").chain(split.clone())) {
                Ok(c) => c,
                Err(e) => {
                    println!("{}", e.message);
                    return None;
                }
            };
            Tc::arm(&cmd)
        }
    };

    match tc {
        Ok(tc) => Some(tc),
        Err(e) => {
            println!("Could not build the TC: {}", e);
            None
        }
    }
}

/// Send a TC to the exec and print the response.
fn send_tc(socket: &MonitoredSocket, tc: &Tc) {
    let tc_json = match tc.to_json() {
        Ok(j) => j,
        Err(e) => {
            println!("Could not serialise the TC: {}", e);
            return;
        }
    };

    if let Err(e) = socket.send(tc_json.as_str(), 0) {
        println!("Could not send the TC: {}", e);
        return;
    }

    match socket.recv_string(0) {
        Ok(Ok(response_str)) => match serde_json::from_str::<TcResponse>(&response_str) {
            Ok(TcResponse::Ok) => println!("OK"),
            Ok(r) => println!("Response: {:?}", r),
            Err(e) => println!("Could not parse the response: {}", e),
        },
        Ok(Err(_)) => println!("The exec sent a non UTF-8 response"),
        Err(zmq::Error::EAGAIN) => println!("No response from the arm exec"),
        Err(e) => println!("Could not recieve the response: {}", e),
    }
}
