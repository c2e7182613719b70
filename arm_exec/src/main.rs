//! Main arm-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Joint state acquisition from the driver
//!         - Arm control processing (state machine, goal tracking, timers)
//!         - Joint demand output to the driver
//!         - Telemetry output
//!
//! # Modules
//!
//! All modules (e.g. `arm_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    arm_ctrl::ArmTcRequest,
    data_store::DataStore,
    driver_client::DriverClient,
    params::ArmExecParams,
    tc_server::{TcServer, TcServerError},
    tm_server::TmServer,
};
use comms_if::tc::{arm_ctrl::ArmCmd, TcResponse};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // TC source is used to determine whether we're getting TCs from a script
    // or from the ground.
    let mut tc_source = TcSource::None;
    let mut use_tc_server = false;

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);

        // Load the script interpreter
        let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

        // Display some info
        info!(
            "Loaded script lasts {:.02} s and contains {} TCs\n",
            si.get_duration(),
            si.get_num_tcs()
        );

        // Set the interpreter in the source
        tc_source = TcSource::Script(si);
    }
    // If no arguments then setup the tc server
    else if args.len() == 1 {
        info!("No script provided, remote control via the TcServer will be used\n");
        use_tc_server = true;
    } else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}",
            args.len() - 1
        ));
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.arm_ctrl
        .init("arm_ctrl.toml", &session)
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    if use_tc_server {
        tc_source = TcSource::Remote(
            TcServer::new(&zmq_ctx, &exec_params)
                .wrap_err("Failed to initialise the TcServer")?,
        );
        info!("TcServer initialised");
    }

    let mut driver_client = {
        let c = DriverClient::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise DriverClient")?;
        info!("DriverClient initialised");
        c
    };

    let mut tm_server = {
        let s = TmServer::new(&zmq_ctx, &exec_params).wrap_err("Failed to initialise TmServer")?;
        info!("TmServer initialised");
        s
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- TELECOMMAND PROCESSING ----

        // Branch depending on the source
        match tc_source {
            // If no source no point in continuing so break
            TcSource::None => raise_error!("No TC source present"),

            TcSource::Remote(ref server) => {
                // If the commander dropped away mid-action the only safe
                // option is to stop the arm where it is.
                let connected = server.is_connected();
                if ds.tc_connected && !connected {
                    error!("Connection to the commander lost, stopping the arm");
                    ds.arm_ctrl_input.cmd = Some(ArmTcRequest::Goal(ArmCmd::Stop));
                }
                ds.tc_connected = connected;

                // Get commands until none remain
                loop {
                    match server.recieve_tc() {
                        Ok(Some(tc)) => {
                            // Process the TC
                            tc_processor::exec(&mut ds, &tc);

                            // Send response
                            if let Err(e) = server.send_response(TcResponse::Ok) {
                                warn!("Could not respond to TC: {}", e);
                            }
                        }
                        Ok(None) => break,
                        Err(TcServerError::TcParseError(e)) => {
                            warn!("Could not parse recieved TC: {}", e);
                            break;
                        }
                        Err(e) => {
                            warn!("An error occured while receiving TCs: {}", e);
                            break;
                        }
                    }
                }
            }

            TcSource::Script(ref mut si) => match si.get_pending_tcs() {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(&mut ds, tc);
                    }
                }
                // Exit if end of script reached
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break;
                }
            },
        };

        // ---- JOINT STATE ACQUISITION ----

        // Drain all batches which arrived since the last cycle. They are
        // handed to ArmCtrl in arrival order and evaluated batch by batch.
        loop {
            match driver_client.recieve_joint_states() {
                Ok(Some(batch)) => ds.arm_ctrl_input.joint_states.push(batch),
                Ok(None) => break,
                Err(e) => {
                    warn!("Could not recieve joint states: {}", e);
                    break;
                }
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // ArmCtrl processing
        match ds.arm_ctrl.proc(&ds.arm_ctrl_input) {
            Ok((o, r)) => {
                ds.arm_ctrl_output = o;
                ds.arm_ctrl_status_rpt = r;
            }
            Err(e) => {
                // ArmCtrl errors usually just mean you sent the wrong TC, so just issue the
                // warning and continue.
                warn!("Error during ArmCtrl processing: {}", e)
            }
        };

        // ---- JOINT DEMAND OUTPUT ----

        // Send each demand separately, the driver only ever gets one joint
        // per message.
        for dem in ds.arm_ctrl_output.joint_dems.iter() {
            if let Err(e) = driver_client.send_demand(dem) {
                warn!("Could not send joint demand for {}: {}", dem.name, e);
            }
        }

        // ---- TELEMETRY ----

        match tm_server.send(&ds) {
            Ok(_) => (),
            Err(e) => warn!("TmServer error: {}", e),
        };

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
#[allow(dead_code)]
enum TcSource {
    None,
    Remote(TcServer),
    Script(ScriptInterpreter),
}
