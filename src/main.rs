//! Coolant controller entry point.
//!
//! Parses the initial setpoint and optional PID gains from the command
//! line, then drives the supervisory loop at a fixed tick: state-machine
//! update, inbound command processing, periodic telemetry, sleep.
//! SIGINT/SIGTERM request a clean shutdown at the next tick boundary.

#![deny(unused_must_use)]

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use log::info;

use coolantctl::config::SystemConfig;
use coolantctl::control::pid::{DEFAULT_KD, DEFAULT_KI, DEFAULT_KP};
use coolantctl::fsm::context::SmContext;
use coolantctl::fsm::Supervisor;

/// Startup options taken from the command line.
struct CmdOptions {
    setpoint: f32,
    kp: f32,
    ki: f32,
    kd: f32,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <setpoint> [kp] [ki] [kd]");
    eprintln!("  setpoint: target coolant temperature in Celsius (required)");
    eprintln!("  kp:       proportional gain (optional, default: {DEFAULT_KP:.2})");
    eprintln!("  ki:       integral gain (optional, default: {DEFAULT_KI:.2})");
    eprintln!("  kd:       derivative gain (optional, default: {DEFAULT_KD:.2})");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {program} 30.0");
    eprintln!("  {program} 30.0 2.0");
    eprintln!("  {program} 30.0 2.0 0.5 0.1");
}

fn parse_arguments(args: &[String], config: &SystemConfig) -> Result<CmdOptions> {
    if args.len() < 2 {
        bail!("setpoint is required");
    }
    if args.len() > 5 {
        bail!("too many arguments");
    }

    let setpoint: f32 = args[1]
        .parse()
        .with_context(|| format!("invalid setpoint value '{}'", args[1]))?;
    if !(config.setpoint_min_c..=config.setpoint_max_c).contains(&setpoint) {
        bail!(
            "setpoint {} out of limits [{}, {}]",
            args[1],
            config.setpoint_min_c,
            config.setpoint_max_c
        );
    }

    let mut gains = [DEFAULT_KP, DEFAULT_KI, DEFAULT_KD];
    for (index, (value, name)) in gains.iter_mut().zip(["kp", "ki", "kd"]).enumerate() {
        let Some(arg) = args.get(index + 2) else {
            break;
        };
        *value = arg
            .parse()
            .with_context(|| format!("invalid {name} value '{arg}'"))?;
        if *value < 0.0 {
            return Err(anyhow!("{name} has negative value '{arg}'"));
        }
    }
    let [kp, ki, kd] = gains;

    Ok(CmdOptions {
        setpoint,
        kp,
        ki,
        kd,
    })
}

fn main() -> ExitCode {
    env_logger::init();

    println!("Coolant Control System");
    println!("======================");

    let config = SystemConfig::default();
    let args: Vec<String> = env::args().collect();
    let options = match parse_arguments(&args, &config) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("Error: {err:#}");
            print_usage(args.first().map_or("coolantctl", String::as_str));
            return ExitCode::FAILURE;
        }
    };

    println!("Configuration:");
    println!("  Setpoint: {:.2} C", options.setpoint);
    println!(
        "  PID gains: kp={:.3}, ki={:.3}, kd={:.3}",
        options.kp, options.ki, options.kd
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(err) = ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        }) {
            eprintln!("Error: failed to install signal handler: {err}");
            return ExitCode::FAILURE;
        }
    }

    let tick = Duration::from_millis(u64::from(config.control_loop_interval_ms));
    let mut supervisor = Supervisor::new();
    let mut ctx = SmContext::new(config);

    // CLI overrides flow through the same setters the bus command path
    // uses; the state machine initialises the subsystems on its first
    // tick and never resets the setpoint or gains.
    ctx.pid.set_setpoint(options.setpoint);
    ctx.pid.set_gains(options.kp, options.ki, options.kd);

    while running.load(Ordering::SeqCst) {
        supervisor.update(&mut ctx);

        let SmContext {
            bus,
            pid,
            pump,
            fan,
            temp_sensor,
            ..
        } = &mut ctx;
        bus.process_messages(pid, pump, fan);
        if let Err(err) = bus.periodic_send(temp_sensor, pid, pump, fan) {
            eprintln!("Error: telemetry transmit failed: {err}");
            return ExitCode::FAILURE;
        }

        thread::sleep(tick);
    }

    info!(
        "shutdown requested in state {} after {} ticks",
        supervisor.state_name(),
        supervisor.tick_count()
    );
    println!("\nShutdown complete.");
    ExitCode::SUCCESS
}
