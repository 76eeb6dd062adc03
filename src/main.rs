use calver::{CompositeError, LayoutError, Level, Version, VersionError, Versions};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use clap::{ArgAction, Args, Parser};
use std::io::{self, IsTerminal, Read};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive. It wins over `--verbose`.
const LOG_ENV: &str = "CALVER_LOG";

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Calver(#[from] CompositeError),

    #[error("invalid date `{date}`, expected YYYY-MM-DD: {source}")]
    InvalidDate {
        date: String,
        source: chrono::ParseError,
    },

    #[error("none of the given versions matches layout `{layout}`:\n{report}")]
    NoneParsed { layout: String, report: String },

    #[error("failed to read versions from stdin: {0}")]
    Stdin(#[from] io::Error),
}

impl From<LayoutError> for CliError {
    fn from(err: LayoutError) -> Self {
        CliError::Calver(err.into())
    }
}

impl From<VersionError> for CliError {
    fn from(err: VersionError) -> Self {
        CliError::Calver(err.into())
    }
}

/// Where "now" comes from. At most one may be given; UTC is the default.
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct ClockArgs {
    /// Use the current UTC time (the default)
    #[arg(long)]
    utc: bool,

    /// Use the current local time, in the local timezone
    #[arg(long)]
    local: bool,

    /// Use midnight UTC of a fixed date instead of the current time
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<String>,
}

impl ClockArgs {
    fn now(&self) -> Result<DateTime<FixedOffset>, CliError> {
        if let Some(date) = &self.date {
            let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|source| {
                CliError::InvalidDate {
                    date: date.clone(),
                    source,
                }
            })?;
            let midnight = Utc.from_utc_datetime(&day.and_time(NaiveTime::default()));
            return Ok(midnight.with_timezone(&Utc.fix()));
        }
        if self.local {
            let now = Local::now();
            return Ok(now.with_timezone(&now.offset().fix()));
        }
        Ok(Utc::now().with_timezone(&Utc.fix()))
    }
}

/// How the latest version is bumped. At most one may be given; without any, the latest version
/// is printed as it is.
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct BumpArgs {
    /// Show the next version of the latest parsed version
    #[arg(short, long)]
    next: bool,

    /// Show the next major version of the latest parsed version
    #[arg(long)]
    major: bool,

    /// Show the next minor version of the latest parsed version
    #[arg(long)]
    minor: bool,

    /// Show the next micro version of the latest parsed version
    #[arg(long)]
    micro: bool,
}

impl BumpArgs {
    fn apply(
        &self,
        version: &Version,
        now: &DateTime<FixedOffset>,
    ) -> Result<Version, VersionError> {
        if self.next {
            version.next(now)
        } else if self.major {
            version.bump(Level::Major)
        } else if self.minor {
            version.bump(Level::Minor)
        } else if self.micro {
            version.bump(Level::Micro)
        } else {
            Ok(version.clone())
        }
    }
}

/// calver is a tool for manipulating calendar versions.
///
/// Versions are read from the arguments, or from stdin when it isn't a terminal. The latest of
/// them is bumped and printed. Without any versions, the version for the current date is printed.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The version layout, e.g. `YYYY.0M.0D` or `YY.0M.MICRO-MODIFIER`
    #[arg(short, long, default_value = "YY.0M.MICRO")]
    layout: String,

    #[command(flatten)]
    bump: BumpArgs,

    /// Set the modifier of the resulting version
    #[arg(long, value_name = "TEXT")]
    modifier: Option<String>,

    /// Trim trailing version fields that are zero or empty
    #[arg(long)]
    trim_suffix: bool,

    #[command(flatten)]
    clock: ClockArgs,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Versions to consider
    versions: Vec<String>,
}

fn filter_from_verbosity(verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(level)
}

fn init_logging(verbose: u8) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| filter_from_verbosity(verbose));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    // a subscriber may already be set in tests
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Returns the versions given as arguments, or else the whitespace separated words on stdin if
/// it's piped.
fn read_inputs(cli: &Cli) -> Result<Vec<String>, CliError> {
    if !cli.versions.is_empty() {
        return Ok(cli.versions.clone());
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(Vec::new());
    }
    let mut text = String::new();
    stdin.lock().read_to_string(&mut text)?;
    Ok(text.split_whitespace().map(str::to_owned).collect())
}

fn run(cli: &Cli, inputs: &[String], now: &DateTime<FixedOffset>) -> Result<String, CliError> {
    let template = Version::new(&cli.layout, now)?.with_trim_suffix(cli.trim_suffix);

    let mut version = template.clone();
    if !inputs.is_empty() {
        let mut versions = Versions::new();
        let mut failures = Vec::new();
        for input in inputs {
            match template.parse(input) {
                Ok(parsed) => versions.push(parsed),
                Err(err) => {
                    warn!("skipping {err}");
                    failures.push(err.to_string());
                }
            }
        }
        debug!(parsed = versions.len(), failed = failures.len(), "read versions");

        let latest = versions.latest().map_err(|_| CliError::NoneParsed {
            layout: cli.layout.clone(),
            report: failures.join("\n"),
        })?;
        version = cli.bump.apply(latest, now)?;
    }

    if let Some(modifier) = cli.modifier.as_deref().filter(|modifier| !modifier.is_empty()) {
        version = version.with_modifier(modifier)?;
    }

    Ok(version.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = read_inputs(&cli)
        .and_then(|inputs| Ok((inputs, cli.clock.now()?)))
        .and_then(|(inputs, now)| run(&cli, &inputs, &now));

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[fixture]
    fn now() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2023, 5, 20, 0, 0, 0)
            .unwrap()
            .with_timezone(&Utc.fix())
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("calver").chain(args.iter().copied())).unwrap()
    }

    fn inputs(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[rstest]
    #[case(&[], &[], "23.05.0")]
    #[case(&["--layout", "YYYY.0M.0D"], &[], "2023.05.20")]
    #[case(&[], &["23.05.1"], "23.05.1")]
    #[case(&["--next"], &["23.05.1"], "23.05.2")]
    #[case(&["-n"], &["23.04.7"], "23.05.0")]
    #[case(&["-n"], &["23.05.1", "23.05.3", "23.04.9"], "23.05.4")]
    #[case(&["-l", "MAJOR.MINOR.MICRO", "--major"], &["1.2.3", "1.10.0"], "2.10.0")]
    #[case(&["-l", "MAJOR.MINOR.MICRO", "--minor"], &["1.2.3"], "1.3.3")]
    #[case(&["-l", "MAJOR.MINOR.MICRO", "--micro"], &["1.2.3"], "1.2.4")]
    #[case(&["-l", "YY.0M.MICRO-MODIFIER", "--modifier", "dev"], &[], "23.05.0-dev")]
    #[case(
        &["-l", "YY.0M.MICRO-MODIFIER", "-n", "--modifier", "rc1"],
        &["23.05.1-"],
        "23.05.2-rc1"
    )]
    #[case(&["-l", "YY.0M.MICRO-MODIFIER", "-n", "--trim-suffix"], &["23.05-dev"], "23.05")]
    #[case(&["-n"], &["bogus", "23.05.1"], "23.05.2")]
    #[case(&["-l", "YYYY.0W.MICRO", "-n"], &["2021.53.0"], "2023.20.0")]
    fn test_run(
        now: DateTime<FixedOffset>,
        #[case] args: &[&str],
        #[case] values: &[&str],
        #[case] expected: &str,
    ) {
        let cli = cli(args);
        assert_eq!(expected, run(&cli, &inputs(values), &now).unwrap());
    }

    #[rstest]
    fn test_run_none_parsed(now: DateTime<FixedOffset>) {
        let cli = cli(&["-n"]);
        let err = run(&cli, &inputs(&["bogus", "2023.05.1"]), &now).unwrap_err();
        match err {
            CliError::NoneParsed { layout, report } => {
                assert_eq!("YY.0M.MICRO", layout);
                assert_eq!(2, report.lines().count());
                assert!(report.contains("`bogus`"));
            }
            err => panic!("unexpected error: {err}"),
        }
    }

    #[rstest]
    #[case(&["-l", "YYYY.YY"], &[])]
    #[case(&["-l", "YYYY.0M.0D", "--modifier", "dev"], &[])]
    #[case(&["-l", "YYYY.0M.0D", "--major"], &["2023.05.01"])]
    fn test_run_library_errors(
        now: DateTime<FixedOffset>,
        #[case] args: &[&str],
        #[case] values: &[&str],
    ) {
        let cli = cli(args);
        assert!(matches!(
            run(&cli, &inputs(values), &now),
            Err(CliError::Calver(_))
        ));
    }

    #[rstest]
    fn test_run_time_regression(now: DateTime<FixedOffset>) {
        let cli = cli(&["-n"]);
        assert!(matches!(
            run(&cli, &inputs(&["23.06.0"]), &now),
            Err(CliError::Calver(CompositeError::Version(
                VersionError::TimeRegression { .. }
            )))
        ));
    }

    #[rstest]
    #[case(&["--next", "--major"])]
    #[case(&["--minor", "--micro"])]
    #[case(&["--utc", "--local"])]
    #[case(&["--local", "--date", "2023-05-20"])]
    fn test_exclusive_flags(#[case] args: &[&str]) {
        let args = std::iter::once("calver").chain(args.iter().copied());
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[rstest]
    fn test_clock_date(now: DateTime<FixedOffset>) {
        assert_eq!(now, cli(&["--date", "2023-05-20"]).clock.now().unwrap());
    }

    #[test]
    fn test_clock_invalid_date() {
        assert!(matches!(
            cli(&["--date", "2023-13-01"]).clock.now(),
            Err(CliError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_clock_defaults_to_utc() {
        let now = cli(&[]).clock.now().unwrap();
        assert_eq!(Utc.fix(), *now.offset());
    }

    #[rstest]
    #[case(0, "warn")]
    #[case(1, "info")]
    #[case(2, "debug")]
    #[case(5, "trace")]
    fn test_filter_from_verbosity(#[case] verbose: u8, #[case] expected: &str) {
        assert_eq!(expected, filter_from_verbosity(verbose).to_string());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(0);
        init_logging(2);
    }

    #[test]
    fn test_arguments_win_over_stdin() {
        let cli = cli(&["23.05.1", "23.05.2"]);
        assert_eq!(inputs(&["23.05.1", "23.05.2"]), read_inputs(&cli).unwrap());
    }
}
