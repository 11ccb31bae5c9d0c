use clap::{Parser, Subcommand};
use od_controls::{Activation, InputFrame};
use od_loop::{LoopResult, Rig, RigConfig, ScriptedInput, Session, SimBus, TickSnapshot};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "od-cli")]
#[command(about = "opdrive CLI - teleop control loop harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session over the simulated bus
    Run {
        /// Rig configuration YAML (defaults to the built-in robot)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Input script YAML (defaults to a canned demo sequence)
        #[arg(long)]
        script: Option<PathBuf>,
        /// Override the inter-tick delay in milliseconds (0 = no delay)
        #[arg(long)]
        tick_ms: Option<u64>,
        /// Simulate these devices as absent from the hardware config
        #[arg(long)]
        absent: Vec<String>,
        /// Emit one JSON line per tick instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the control mapping table
    Controls {
        /// Rig configuration YAML (defaults to the built-in robot)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate a rig configuration file
    Validate {
        /// Path to the rig YAML file
        config: PathBuf,
    },
}

fn main() -> LoopResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            script,
            tick_ms,
            absent,
            json,
        } => cmd_run(
            config.as_deref(),
            script.as_deref(),
            tick_ms,
            &absent,
            json,
        ),
        Commands::Controls { config } => cmd_controls(config.as_deref()),
        Commands::Validate { config } => cmd_validate(&config),
    }
}

/// One entry of an input script: a frame held for a number of ticks.
#[derive(Debug, Clone, Deserialize)]
struct ScriptEntry {
    #[serde(default = "default_hold")]
    hold: usize,
    #[serde(default)]
    frame: InputFrame,
}

fn default_hold() -> usize {
    1
}

fn load_config(path: Option<&Path>) -> LoopResult<RigConfig> {
    match path {
        Some(path) => RigConfig::load(path),
        None => Ok(RigConfig::default()),
    }
}

fn load_script(path: Option<&Path>) -> LoopResult<ScriptedInput> {
    let entries: Vec<ScriptEntry> = match path {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)?,
        None => demo_script(),
    };
    let mut script = ScriptedInput::default();
    for entry in entries {
        script = script.hold(entry.frame, entry.hold);
    }
    Ok(script)
}

/// Canned demo: spin up the intake, bring the shooter to full power,
/// aim the servo out and back, then wind everything down.
fn demo_script() -> Vec<ScriptEntry> {
    use od_controls::{Axis, Button};
    let entry = |hold, frame| ScriptEntry { hold, frame };
    let idle = InputFrame::default();
    vec![
        entry(2, idle),
        entry(1, idle.with_button(Button::A, true)),
        entry(10, idle),
        entry(1, idle.with_button(Button::B, true)),
        entry(5, idle),
        entry(1, idle.with_button(Button::DpadUp, true)),
        entry(1, idle),
        entry(1, idle.with_button(Button::DpadUp, true)),
        entry(5, idle),
        entry(3, idle.with_button(Button::Y, true)),
        entry(5, idle),
        entry(8, idle.with_axis(Axis::RightTrigger, 1.0)),
        entry(4, idle.with_axis(Axis::LeftTrigger, 0.5)),
        entry(1, idle.with_button(Button::LeftStickButton, true)),
        entry(1, idle.with_button(Button::B, true)),
        entry(1, idle.with_button(Button::A, true)),
        entry(3, idle),
    ]
}

fn sim_bus(config: &RigConfig, absent: &[String]) -> SimBus {
    let mut bus = SimBus::new();
    for motor in &config.motors {
        if !absent.contains(&motor.device) {
            bus = bus.with_motor(motor.device.clone());
        }
    }
    for servo in &config.servo_channels {
        if !absent.contains(&servo.device) {
            bus = bus.with_servo(servo.device.clone());
        }
    }
    bus
}

fn cmd_run(
    config_path: Option<&Path>,
    script_path: Option<&Path>,
    tick_ms: Option<u64>,
    absent: &[String],
    json: bool,
) -> LoopResult<()> {
    let config = load_config(config_path)?;
    let mut script = load_script(script_path)?;
    let mut bus = sim_bus(&config, absent);

    let rig = Rig::build(&config, &bus)?;
    let delay = Duration::from_millis(tick_ms.unwrap_or(rig.tick_ms()));
    let total = script.len();
    if !json {
        println!("Running {total} scripted ticks ({}ms each)", delay.as_millis());
    }

    let mut session = Session::new(rig);
    let mut last: Option<TickSnapshot> = None;
    session.run(&mut bus, &mut script, &mut |snap| {
        if json {
            match serde_json::to_string(snap) {
                Ok(line) => println!("{line}"),
                Err(err) => eprintln!("snapshot serialization failed: {err}"),
            }
        } else {
            render_tick(snap);
        }
        last = Some(snap.clone());
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    });

    if !json {
        if let Some(snap) = &last {
            render_statistics(snap);
        }
        println!("✓ Session complete: {} ticks", session.ticks());
    }
    Ok(())
}

fn render_tick(snap: &TickSnapshot) {
    println!("--- tick {} (t={:.2}s) ---", snap.tick, snap.elapsed_s);
    for actuator in &snap.actuators {
        if !actuator.present {
            println!("  {:<14} (not found)", actuator.name);
            continue;
        }
        let state = match actuator.running {
            Some(true) => "RUNNING",
            Some(false) => "STOPPED",
            None => "HOLDING",
        };
        let mut line = format!(
            "  {:<14} {:<8} cmd={:+.3}",
            actuator.name, state, actuator.command
        );
        if let Some(direction) = actuator.direction {
            line.push_str(&format!("  dir={direction}"));
        }
        if let Some(rpm) = actuator.rpm {
            line.push_str(&format!("  rpm={rpm:.0}"));
        }
        if let Some(expected) = actuator.expected_rpm {
            line.push_str(&format!("  expected={expected:.0}"));
        }
        println!("{line}");
    }
}

fn render_statistics(snap: &TickSnapshot) {
    println!("\nSession statistics:");
    for actuator in &snap.actuators {
        if actuator.rpm.is_none() && actuator.max_rpm == 0.0 {
            continue;
        }
        println!(
            "  {:<14} max={:.1} RPM  mean={:.1} RPM",
            actuator.name, actuator.max_rpm, actuator.mean_rpm
        );
    }
}

fn cmd_controls(config_path: Option<&Path>) -> LoopResult<()> {
    let config = load_config(config_path)?;
    println!("=== BUTTON CONTROLS ===");
    for binding in &config.bindings {
        let how = match binding.activation {
            Activation::Press => "press",
            Activation::Hold => "hold ",
        };
        println!(
            "  {:<20} {how}  -> {:<10} {}",
            binding.button.to_string(),
            binding.target.to_string(),
            binding.action
        );
    }
    println!("\n=== AXIS CONTROLS ===");
    for binding in &config.axis_bindings {
        println!(
            "  {:<20} scale  -> {:<10} adjust {:+.3} per tick at full pull",
            binding.axis.to_string(),
            binding.target.to_string(),
            binding.gain
        );
    }
    Ok(())
}

fn cmd_validate(config_path: &Path) -> LoopResult<()> {
    println!("Validating rig: {}", config_path.display());
    let config = RigConfig::load(config_path)?;
    // Validate against a bus where every configured device exists.
    let bus = sim_bus(&config, &[]);
    Rig::build(&config, &bus)?;
    println!(
        "✓ Rig is valid ({} power channels, {} servos, {} motors, {} bindings)",
        config.power_channels.len(),
        config.servo_channels.len(),
        config.motors.len(),
        config.bindings.len() + config.axis_bindings.len()
    );
    Ok(())
}
