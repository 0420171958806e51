//! call-sim: headless runner for the call dispatcher.
//!
//! Usage:
//!   call-sim --seed 12345 --ticks 480 --db run.db
//!   call-sim --seed 12345 --ipc-mode

use anyhow::Result;
use callcenter_core::{
    config::DispatchConfig,
    simulation::{SimulationSummary, TrafficSimulator},
    store::CallStore,
    types::Tick,
    Call, Employee,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick { count: u64 },
    Submit { tier: String },
    Complete { employee_id: String },
    Escalate { employee_id: String },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    tick: Tick,
    employees: Vec<&'a Employee>,
    backlog: Vec<&'a Call>,
    summary: &'a SimulationSummary,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 480u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("call-sim");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = DispatchConfig::load(data_dir)?;

    let store = CallStore::open(db)?;
    store.migrate()?;
    let run_id = CallStore::new_run_id();
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

    let mut sim = TrafficSimulator::new(run_id.clone(), seed, &config)?.with_store(store);

    if ipc_mode {
        run_ipc_loop(&mut sim)?;
    } else {
        sim.run_ticks(ticks)?;
        print_summary(&sim, &run_id)?;
    }

    Ok(())
}

fn run_ipc_loop(sim: &mut TrafficSimulator) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        // Faults are reported to the caller and the loop keeps going;
        // the dispatcher leaves its state untouched when an operation fails.
        match handle_command(sim, cmd) {
            Ok(()) => {
                let state = build_ui_state(sim);
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            Err(e) => {
                log::warn!("Rejected command: {e}");
                write_error(&mut stdout, &e.to_string())?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(sim: &mut TrafficSimulator, cmd: IpcCommand) -> Result<()> {
    match cmd {
        IpcCommand::GetState | IpcCommand::Quit => {}
        IpcCommand::Tick { count } => sim.run_ticks(count)?,
        IpcCommand::Submit { tier } => {
            let call_id = sim.dispatcher_mut().submit_named(&tier)?;
            log::debug!("ipc: submitted {call_id} at {tier}");
        }
        IpcCommand::Complete { employee_id } => {
            let call = sim.dispatcher_mut().complete_call(&employee_id)?;
            if let Some(store) = sim.store() {
                store.insert_completed_call(&sim.run_id, sim.current_tick, &call)?;
            }
        }
        IpcCommand::Escalate { employee_id } => {
            sim.dispatcher_mut().escalate_call(&employee_id)?;
        }
    }
    sim.flush_events()?;
    Ok(())
}

fn build_ui_state(sim: &TrafficSimulator) -> UiState<'_> {
    let dispatcher = sim.dispatcher();
    UiState {
        tick: sim.current_tick,
        employees: dispatcher.all_employees().collect(),
        backlog: dispatcher.backlog().collect(),
        summary: sim.summary(),
    }
}

fn write_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

fn print_summary(sim: &TrafficSimulator, run_id: &str) -> Result<()> {
    let summary = sim.summary();
    let dispatcher = sim.dispatcher();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");
    println!("  final tick:     {}", sim.current_tick);
    println!("  submitted:      {}", summary.submitted);
    println!("  completed:      {}", summary.completed);
    println!("  escalated:      {}", summary.escalated);
    println!("  queued:         {}", summary.queued);
    println!("  drained:        {}", summary.drained);
    println!("  active calls:   {}", dispatcher.active_calls());
    println!("  backlog:        {}", summary.backlog);
    println!("  max backlog:    {}", summary.max_backlog);

    if let Some(store) = sim.store() {
        println!();
        println!("=== COMPLETED BY FINAL TIER ===");
        let by_tier = store.completed_by_tier(run_id)?;
        if by_tier.is_empty() {
            println!("  (No calls completed)");
        }
        for (tier, count) in by_tier {
            println!("  {tier:<8} {count}");
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
