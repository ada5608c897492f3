use neoapi::{Client, ClientConfig, LlmOutput};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("neoapi_pipe failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    dotenvy::dotenv().ok();
    neoapi::init_tracing();

    let mut config = ClientConfig::from_env();
    let mut project = "default_project".to_string();
    let mut analyze = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            print_help();
            return Ok(());
        }

        if arg == "--analyze" {
            analyze = true;
            continue;
        }

        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg.clone(), None),
        };
        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| format!("{flag} requires a value"))?,
        };

        match flag.as_str() {
            "--batch-size" => config.batch_size = parse_positive(&value, &flag)?,
            "--flush-interval-ms" => config.flush_interval_ms = parse_positive(&value, &flag)?,
            "--check-frequency" => config.check_frequency = parse_positive(&value, &flag)?,
            "--project" => project = value,
            _ => return Err(format!("unknown argument '{arg}'. Use --help for usage")),
        }
    }

    let client = Client::new(config).map_err(|e| e.to_string())?;
    client.start().map_err(|e| e.to_string())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tracked = 0usize;
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        if line.trim().is_empty() {
            continue;
        }
        let mut event = LlmOutput::new(line).with_project(project.clone());
        if analyze {
            event = event.with_analysis(true);
        }
        client.track(event);
        tracked += 1;
    }

    let stats = client.stats().await.map_err(|e| e.to_string())?;
    let last = client.shutdown().await.map_err(|e| e.to_string())?;

    let final_batch = last.map(|report| report.size).unwrap_or(0);
    let batches = stats.batches_dispatched + u64::from(final_batch > 0);
    println!("tracked {tracked} events in {batches} batches (final batch: {final_batch})");
    Ok(())
}

fn parse_positive<T>(value: &str, flag: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let parsed = value
        .parse::<T>()
        .map_err(|_| format!("{flag} expects a positive integer, got '{value}'"))?;
    if parsed == T::default() {
        return Err(format!("{flag} expects a value greater than 0"));
    }
    Ok(parsed)
}

fn print_help() {
    println!("Track each line of stdin as an LLM output event");
    println!();
    println!("Usage:");
    println!("  some-command | cargo run --bin neoapi_pipe -- [options]");
    println!();
    println!("Options:");
    println!("  --batch-size <n>           Initial batch size (default: 10)");
    println!("  --flush-interval-ms <n>    Initial flush interval in ms (default: 5000)");
    println!("  --check-frequency <n>      Send every n-th event of a batch (default: 1)");
    println!("  --project <name>           Project stamped on every event (default: default_project)");
    println!("  --analyze                  Request analysis and print results as JSON");
    println!();
    println!("Environment:");
    println!("  NEOAPI_API_KEY             API key (required)");
    println!("  NEOAPI_API_URL             API base URL (default: https://api.neoapi.ai)");
}
