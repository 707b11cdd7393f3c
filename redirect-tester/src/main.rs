mod replay;
mod reports;
mod scenario;
mod util;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use redirect_core::{LinkTable, REFERRAL_PARAM, RedirectConfig};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;
use url::form_urlencoded;

use replay::{ReplayRun, replay};
use reports::ScenarioResult;
use scenario::{
    ClipboardSetup, IPHONE_UA, PRODUCTION_HOST, Scenario, ScenarioSetup, catalog_scenarios,
    find_scenario, list_scenarios,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "redirect-tester", version)]
#[command(about = "Replays the referral redirect flow offline on virtual time")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Replay a single visit with this referral code instead of the catalog
    #[arg(long = "ref")]
    referral: Option<String>,

    /// User agent for an ad-hoc replay
    #[arg(long)]
    user_agent: Option<String>,

    /// Hostname for an ad-hoc replay (defaults to the production host)
    #[arg(long)]
    host: Option<String>,

    /// Make every clipboard technique fail in an ad-hoc replay
    #[arg(long)]
    fail_copy: bool,
}

impl Args {
    const fn is_ad_hoc(&self) -> bool {
        self.referral.is_some()
            || self.user_agent.is_some()
            || self.host.is_some()
            || self.fail_copy
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let config = RedirectConfig::load_from_static();
    let links = LinkTable::load_from_static();

    let results = if args.is_ad_hoc() {
        vec![run_ad_hoc(&args, &config, &links)?]
    } else {
        run_catalog(&args, &config, &links)
    };

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🔗 Referral Redirect Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_catalog(args: &Args, config: &RedirectConfig, links: &LinkTable) -> Vec<ScenarioResult> {
    let mut results = Vec::new();
    for name in expand_scenarios(&args.scenarios) {
        let Some(scenario) = find_scenario(&name) else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            results.push(ScenarioResult {
                scenario_name: name.clone(),
                description: "unknown scenario".to_string(),
                passed: false,
                failures: vec![format!("no scenario named `{name}`")],
                trace: Vec::new(),
                navigations: Vec::new(),
                notices: Vec::new(),
                elapsed_ms: 0,
            });
            continue;
        };
        let result = run_scenario(&scenario, config, links);
        if args.verbose {
            let mark = if result.passed { "✅".green() } else { "❌".red() };
            println!("{mark} {}", scenario.key);
        }
        results.push(result);
    }
    results
}

fn ad_hoc_setup(args: &Args) -> ScenarioSetup {
    let search = args
        .referral
        .as_deref()
        .map(|code| {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair(REFERRAL_PARAM, code)
                .finish();
            format!("?{query}")
        })
        .unwrap_or_default();
    let user_agent = args.user_agent.as_deref().unwrap_or(IPHONE_UA);
    let setup = ScenarioSetup::new(&search, user_agent).on_host(args.host.as_deref().unwrap_or(PRODUCTION_HOST));
    if args.fail_copy {
        setup.clipboard(ClipboardSetup::Denied)
    } else {
        setup
    }
}

fn run_ad_hoc(args: &Args, config: &RedirectConfig, links: &LinkTable) -> Result<ScenarioResult> {
    let setup = ad_hoc_setup(args);
    let run = replay(&setup, config, links).context("ad-hoc replay failed")?;
    Ok(describe(
        "ad-hoc",
        "Replay built from command-line flags",
        &run,
        Vec::new(),
    ))
}

fn run_scenario(scenario: &Scenario, config: &RedirectConfig, links: &LinkTable) -> ScenarioResult {
    match replay(&scenario.setup, config, links) {
        Ok(run) => {
            let failures = check_expectations(scenario, &run, links);
            describe(scenario.key, scenario.description, &run, failures)
        }
        Err(err) => ScenarioResult {
            scenario_name: scenario.key.to_string(),
            description: scenario.description.to_string(),
            passed: false,
            failures: vec![format!("{err:#}")],
            trace: Vec::new(),
            navigations: Vec::new(),
            notices: Vec::new(),
            elapsed_ms: 0,
        },
    }
}

fn check_expectations(scenario: &Scenario, run: &ReplayRun, links: &LinkTable) -> Vec<String> {
    let mut failures = Vec::new();
    let expected: Vec<_> = scenario
        .expect
        .navigations
        .iter()
        .map(|nav| nav.resolve(links))
        .collect();
    if run.navigations != expected {
        failures.push(format!(
            "navigations: expected {expected:?}, got {:?}",
            run.navigations
        ));
    }
    if let Some(state) = scenario.expect.final_state {
        let actual = run.final_state().map(redirect_core::RedirectState::label);
        if actual != Some(state) {
            failures.push(format!("final state: expected {state}, got {actual:?}"));
        }
    }
    if let Some(ms) = scenario.expect.elapsed_ms
        && elapsed_ms(run) != ms
    {
        failures.push(format!(
            "virtual time: expected {ms} ms, got {} ms",
            elapsed_ms(run)
        ));
    }
    let store_navigations = run.navigations.iter().filter(|n| n.is_store()).count();
    if store_navigations > 1 {
        failures.push(format!("{store_navigations} store navigations issued"));
    }
    failures
}

fn elapsed_ms(run: &ReplayRun) -> u64 {
    u64::try_from(run.elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn describe(name: &str, description: &str, run: &ReplayRun, failures: Vec<String>) -> ScenarioResult {
    ScenarioResult {
        scenario_name: name.to_string(),
        description: description.to_string(),
        passed: failures.is_empty(),
        failures,
        trace: run.trace.iter().map(ToString::to_string).collect(),
        navigations: run.navigations.iter().map(ToString::to_string).collect(),
        notices: run.notices.iter().map(|n| format!("{n:?}")).collect(),
        elapsed_ms: elapsed_ms(run),
    }
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let generated_at = Utc::now();

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results, generated_at)?,
        "markdown" => {
            reports::generate_markdown_report(&mut output_target, results, generated_at)?;
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                    generated_at,
                )?;
            }
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
