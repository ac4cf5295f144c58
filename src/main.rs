mod call_center;
mod config;
mod customer_queue;
mod error;
mod events;
mod logging;
mod roles;
mod sim;
mod types;
mod worker_pool;

use config::{DelayRange, SimConfig};
use error::SimError;

fn parse_usize_list(arg: &str) -> Option<Vec<usize>> {
    if arg == "-" {
        return None;
    }
    let mut values = Vec::new();
    for part in arg.split(',') {
        if part.trim().is_empty() {
            return None;
        }
        let value = part.trim().parse::<usize>().ok()?;
        values.push(value);
    }
    Some(values)
}

fn print_usage(program: &str) {
    println!("Call Center CLI");
    println!("Usage:");
    println!("  {program} (run demo)");
    println!(
        "  {program} run [agents] [customers_per_agent] [workers] [arrival_max_ms] [service_max_ms] [customers=N] [validate] [quiet]"
    );
    println!("  {program} stress [agent_sets] [per_agent_sets] [arrival_max_ms] [service_max_ms] [validate]");
    println!("  {program} --help");
    println!();
    println!("Sets are comma-separated lists (e.g., 1,2,4). Use \"-\" to keep defaults for agent/quota sets.");
    println!("Workers must exceed agents + 1 (the greeter); omit it to use agents + 2.");
    println!("Defaults:");
    println!("  demo   agents=3 customers_per_agent=5 workers=8 arrival=0-149ms service=10-999ms");
    println!("  run    agents=3 customers_per_agent=5 arrival_max_ms=5 service_max_ms=5");
    println!("  stress agents=1,2,4,8 customers_per_agent=5,25,50 arrival_max_ms=0 service_max_ms=1");
    println!("Flags:");
    println!("  validate  report event-order and uniqueness violations");
    println!("  quiet     suppress per-customer greet/serve lines");
    println!("  customers=N  total customers to generate; must equal agents x customers_per_agent");
}

fn exit_with_usage(program: &str, message: &str) -> ! {
    eprintln!("{message}");
    print_usage(program);
    std::process::exit(2);
}

fn exit_on_error(program: &str, result: Result<(), SimError>) {
    match result {
        Ok(()) => {}
        Err(SimError::Config(err)) => exit_with_usage(program, &format!("config error: {err}")),
        Err(err) => {
            eprintln!("run error: {err}");
            std::process::exit(1);
        }
    }
}

fn run_command(program: &str, args: impl Iterator<Item = String>) -> Result<(), SimError> {
    let mut positional: Vec<u64> = Vec::new();
    let mut validate = false;
    let mut echo = true;
    let mut total_customers: Option<usize> = None;
    for arg in args {
        if let Some(value) = arg.strip_prefix("customers=") {
            match value.parse::<usize>() {
                Ok(total) => total_customers = Some(total),
                Err(_) => exit_with_usage(program, &format!("run: invalid customers value: {value}")),
            }
            continue;
        }
        match arg.as_str() {
            "validate" => validate = true,
            "quiet" => echo = false,
            _ => match arg.parse::<u64>() {
                Ok(value) if positional.len() < 5 => positional.push(value),
                Ok(_) => exit_with_usage(program, &format!("run: unexpected argument: {arg}")),
                Err(_) => exit_with_usage(program, &format!("run: invalid value: {arg}")),
            },
        }
    }

    let agents = positional.first().map_or(3, |&v| v as usize);
    let per_agent = positional.get(1).map_or(5, |&v| v as usize);
    let workers = positional
        .get(2)
        .map_or(agents.saturating_add(2), |&v| v as usize);
    let arrival_max_ms = positional.get(3).copied().unwrap_or(5);
    let service_max_ms = positional.get(4).copied().unwrap_or(5);

    let mut config = SimConfig::new(agents, per_agent)
        .with_workers(workers)
        .with_arrival_delay(DelayRange::new(0, arrival_max_ms))
        .with_service_delay(DelayRange::new(0, service_max_ms))
        .with_echo(echo);
    if let Some(total) = total_customers {
        config = config.with_total_customers(total);
    }
    sim::run_single(&config, validate)
}

fn stress_command(program: &str, args: impl Iterator<Item = String>) -> Result<(), SimError> {
    let mut agent_sets: Option<Vec<usize>> = None;
    let mut per_agent_sets: Option<Vec<usize>> = None;
    let mut agent_sets_skipped = false;
    let mut per_agent_sets_skipped = false;
    let mut arrival_max_ms: Option<u64> = None;
    let mut service_max_ms: Option<u64> = None;
    let mut validate = false;

    for arg in args {
        if arg == "validate" {
            validate = true;
            continue;
        }

        if agent_sets.is_none() && !agent_sets_skipped {
            if arg == "-" {
                agent_sets_skipped = true;
            } else if let Some(values) = parse_usize_list(&arg) {
                agent_sets = Some(values);
            } else {
                exit_with_usage(program, &format!("stress: invalid agent_sets value: {arg}"));
            }
            continue;
        }
        if per_agent_sets.is_none() && !per_agent_sets_skipped {
            if arg == "-" {
                per_agent_sets_skipped = true;
            } else if let Some(values) = parse_usize_list(&arg) {
                per_agent_sets = Some(values);
            } else {
                exit_with_usage(program, &format!("stress: invalid per_agent_sets value: {arg}"));
            }
            continue;
        }
        if arrival_max_ms.is_none() {
            match arg.parse::<u64>() {
                Ok(value) => arrival_max_ms = Some(value),
                Err(_) => exit_with_usage(program, &format!("stress: invalid arrival_max_ms value: {arg}")),
            }
            continue;
        }
        if service_max_ms.is_none() {
            match arg.parse::<u64>() {
                Ok(value) => service_max_ms = Some(value),
                Err(_) => exit_with_usage(program, &format!("stress: invalid service_max_ms value: {arg}")),
            }
            continue;
        }

        exit_with_usage(program, &format!("stress: unexpected argument: {arg}"));
    }

    sim::run_stress(
        agent_sets,
        per_agent_sets,
        DelayRange::new(0, arrival_max_ms.unwrap_or(0)),
        DelayRange::new(0, service_max_ms.unwrap_or(1)),
        validate,
    )
}

fn main() {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "call_center".to_string());
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("run") => exit_on_error(&program, run_command(&program, args)),
        Some("stress") => exit_on_error(&program, stress_command(&program, args)),
        Some("--help") | Some("-h") | Some("help") => print_usage(&program),
        Some(other) => {
            exit_with_usage(&program, &format!("unknown command: {other}"));
        }
        None => exit_on_error(&program, sim::run_demo()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_lists() {
        assert_eq!(parse_usize_list("1,2, 4"), Some(vec![1, 2, 4]));
        assert_eq!(parse_usize_list("-"), None);
        assert_eq!(parse_usize_list("1,,2"), None);
        assert_eq!(parse_usize_list("a"), None);
    }
}
