//! Simulation, single-run, and stress-sweep runners for the call center.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use crate::call_center::CallCenter;
use crate::config::{DelayRange, SimConfig};
use crate::error::SimError;
use crate::events::Audit;
use crate::log_dev;
use crate::logging;
use crate::roles::{self, Agent, Greeter};
use crate::types::AgentId;
use crate::worker_pool::{PanicPolicy, WorkerPool};

// Stress sweep gives each configuration this many spare workers for customers.
const STRESS_SPARE_WORKERS: usize = 2;

// Same code the CLI uses for run errors.
const ROLE_PANIC_EXIT_CODE: i32 = 1;

const CSV_HEADER: &str = "agents,customers_per_agent,workers,total_customers,greeted,served_total,elapsed_ms,throughput_customers_per_s,cpu_user_s,cpu_sys_s,leftover,audit_clean";

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data and getrusage only writes into it.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Final count reported by a role when its loop ends.
enum RoleOutcome {
    Greeter(usize),
    Agent(AgentId, usize),
}

/// Everything observed about one completed run.
#[derive(Debug)]
pub struct RunReport {
    pub agents: usize,
    pub customers_per_agent: usize,
    pub workers: usize,
    pub total_customers: usize,
    pub greeted: usize,
    /// Index `i` holds the count for agent `i + 1`.
    pub served_per_agent: Vec<usize>,
    pub elapsed_ms: f64,
    pub throughput: f64,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
    /// Customers still queued after every role finished.
    pub leftover: usize,
    pub audit: Audit,
}

impl RunReport {
    pub fn served_total(&self) -> usize {
        self.served_per_agent.iter().sum()
    }

    /// Greeter hit the total and every agent hit its quota.
    pub fn quotas_met(&self) -> bool {
        self.greeted == self.total_customers
            && self
                .served_per_agent
                .iter()
                .all(|&served| served == self.customers_per_agent)
    }

    fn csv_row(&self) -> String {
        let cpu_user = self
            .cpu_user_s
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string());
        let cpu_sys = self
            .cpu_sys_s
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "NA".to_string());
        format!(
            "{},{},{},{},{},{},{:.2},{:.2},{},{},{},{}",
            self.agents,
            self.customers_per_agent,
            self.workers,
            self.total_customers,
            self.greeted,
            self.served_total(),
            self.elapsed_ms,
            self.throughput,
            cpu_user,
            cpu_sys,
            self.leftover,
            self.audit.is_clean()
        )
    }

    fn report_problems(&self, validate: bool) {
        if self.leftover > 0 {
            eprintln!("# warning,leftover_customers,{}", self.leftover);
        }
        if !self.quotas_met() {
            eprintln!(
                "# warning,quota_unmet,greeted={},served_per_agent={:?}",
                self.greeted, self.served_per_agent
            );
        }
        if validate {
            for (name, count) in self.audit.violations() {
                eprintln!("# violation,{name},{count}");
            }
        }
    }
}

/// Run one full simulation: greeter and agents first, then every customer.
pub fn run_simulation(config: &SimConfig) -> Result<RunReport, SimError> {
    config.validate()?;
    logging::mark_start();
    log_dev!(
        "[SIM] start agents={} per_agent={} workers={}",
        config.agents,
        config.customers_per_agent,
        config.workers
    );

    let center = Arc::new(CallCenter::new(config.echo));
    // A dead role would leave its counterparts waiting on counts forever.
    let pool = WorkerPool::new(config.workers, PanicPolicy::ExitProcess(ROLE_PANIC_EXIT_CODE))?;
    let (outcome_tx, outcome_rx) = mpsc::channel();

    let cpu_start = cpu_times_seconds();
    let start = Instant::now();

    {
        let center = Arc::clone(&center);
        let outcome_tx = outcome_tx.clone();
        let total = config.total_customers;
        pool.submit(move || {
            let greeted = Greeter::new(total).run(&center);
            // Receiver outlives the pool; a failed send means the run was abandoned.
            let _ = outcome_tx.send(RoleOutcome::Greeter(greeted));
        })?;
    }

    for agent_id in 1..=config.agents as AgentId {
        let center = Arc::clone(&center);
        let outcome_tx = outcome_tx.clone();
        let agent = Agent::new(agent_id, config.customers_per_agent, config.service_delay);
        pool.submit(move || {
            let served = agent.run(&center);
            let _ = outcome_tx.send(RoleOutcome::Agent(agent_id, served));
        })?;
    }
    drop(outcome_tx);

    for customer_id in 1..=config.total_customers as u64 {
        let center = Arc::clone(&center);
        pool.submit(move || roles::arrive(&center, customer_id))?;
        let gap = config.arrival_delay.sample();
        if !gap.is_zero() {
            thread::sleep(gap);
        }
    }

    pool.join()?;

    let mut greeted = 0usize;
    let mut served_per_agent = vec![0usize; config.agents];
    let mut received = 0usize;
    for outcome in outcome_rx.try_iter() {
        received += 1;
        match outcome {
            RoleOutcome::Greeter(count) => greeted = count,
            RoleOutcome::Agent(agent_id, count) => {
                served_per_agent[(agent_id - 1) as usize] = count;
            }
        }
    }
    let expected = config.agents + 1;
    if received != expected {
        return Err(SimError::MissingOutcome { expected, received });
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let throughput = if elapsed_ms > 0.0 {
        config.total_customers as f64 / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    let leftover = center.drain_leftovers();
    let audit = Audit::from_events(&center.events.snapshot(), config.total_customers);
    log_dev!("[SIM] finished in {elapsed_ms:.2}ms audit_clean={}", audit.is_clean());

    Ok(RunReport {
        agents: config.agents,
        customers_per_agent: config.customers_per_agent,
        workers: config.workers,
        total_customers: config.total_customers,
        greeted,
        served_per_agent,
        elapsed_ms,
        throughput,
        cpu_user_s,
        cpu_sys_s,
        leftover,
        audit,
    })
}

/// Run the classic 3 agents x 5 customers scenario with per-customer output.
pub fn run_demo() -> Result<(), SimError> {
    let config = SimConfig::demo();
    let report = run_simulation(&config)?;

    let mut out = io::stdout().lock();
    writeln!(out, "DEMO SUMMARY")?;
    writeln!(
        out,
        "agents={} customers_total={}",
        report.agents, report.total_customers
    )?;
    writeln!(out, "greeted={}", report.greeted)?;
    writeln!(out, "served_per_agent={:?}", report.served_per_agent)?;
    writeln!(out, "quotas_met={}", report.quotas_met())?;
    writeln!(out, "audit_clean={}", report.audit.is_clean())?;
    out.flush()?;
    report.report_problems(true);
    Ok(())
}

/// Run a single configuration and print it as one CSV row.
pub fn run_single(config: &SimConfig, validate: bool) -> Result<(), SimError> {
    let report = run_simulation(config)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{CSV_HEADER}")?;
    writeln!(out, "{}", report.csv_row())?;
    out.flush()?;
    report.report_problems(validate);
    Ok(())
}

/// Sweep agent and quota combinations and print CSV output.
pub fn run_stress(
    agent_sets: Option<Vec<usize>>,
    per_agent_sets: Option<Vec<usize>>,
    arrival_delay: DelayRange,
    service_delay: DelayRange,
    validate: bool,
) -> Result<(), SimError> {
    let agent_sets = agent_sets.unwrap_or_else(|| vec![1, 2, 4, 8]);
    let per_agent_sets = per_agent_sets.unwrap_or_else(|| vec![5, 25, 50]);

    // Validate the whole sweep before printing anything.
    let mut configs = Vec::with_capacity(agent_sets.len() * per_agent_sets.len());
    for &agents in &agent_sets {
        for &per_agent in &per_agent_sets {
            let config = SimConfig::new(agents, per_agent)
                .with_workers(agents.saturating_add(1 + STRESS_SPARE_WORKERS))
                .with_arrival_delay(arrival_delay)
                .with_service_delay(service_delay);
            config.validate()?;
            configs.push(config);
        }
    }

    writeln!(io::stdout(), "{CSV_HEADER}")?;
    for config in configs {
        let report = run_simulation(&config)?;
        writeln!(io::stdout(), "{}", report.csv_row())?;
        report.report_problems(validate);
    }
    Ok(())
}
