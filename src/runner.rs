use std::cell::Cell;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use log::info;
use log::warn;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::BackendKind;
use crate::backend::SolutionObserver;
use crate::builder::build_week;
use crate::domain::History;
use crate::domain::Scenario;
use crate::domain::ScheduledShift;
use crate::domain::WeekData;
use crate::driver::SolveSettings;
use crate::horizon::HorizonResult;
use crate::horizon::RollingHorizon;
use crate::objective::Weights;
use crate::validation;

const SEPARATOR: &str = "----------------------------------------------------------------";

#[derive(Debug, clap::Parser)]
#[command(about = "Rolling week-by-week nurse rostering on INRC-II instances")]
pub struct Cli {
    /// The directory holding the scenario, history and week data files.
    #[arg(short = 'd', long = "data-dir", default_value = "instances")]
    pub data_dir: PathBuf,

    /// Log model statistics and every improving solution.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Action,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Action {
    /// Solve every week of the instance.
    Solve {
        /// The number of seconds the solver is allowed to run per week; 0 derives the budget
        /// from the number of nurses.
        time_out: u64,

        /// The solver backend.
        #[arg(short = 'b', long = "backend", value_enum, default_value_t)]
        backend: BackendKind,

        /// The file path to which the schedule will be written as JSON.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// The number of improving solutions logged per week. Later solutions are still used.
        #[arg(long = "logged-solutions", default_value_t = 20)]
        logged_solutions: usize,

        #[command(flatten)]
        instance: InstanceArgs,
    },

    /// Check the instance files and build the model of the first week, without solving.
    Check {
        #[command(flatten)]
        instance: InstanceArgs,
    },
}

/// Selects the INRC-II files of one instance.
#[derive(Clone, Debug, clap::Args)]
pub struct InstanceArgs {
    /// The number of nurses in the scenario.
    #[arg(short = 'n', long = "nurses")]
    pub nurses: u32,

    /// The number of weeks in the horizon.
    #[arg(short = 'w', long = "weeks")]
    pub weeks: usize,

    /// The id of the initial history file.
    #[arg(short = 'H', long = "history", default_value_t = 0)]
    pub history: u32,

    /// The id of the week data file of every week, in order.
    #[arg(required = true)]
    pub week_files: Vec<u32>,
}

impl InstanceArgs {
    fn prefix(&self) -> String {
        format!("n{:03}w{}", self.nurses, self.weeks)
    }

    fn scenario_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("Sc-{}.json", self.prefix()))
    }

    fn history_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("H0-{}-{}.json", self.prefix(), self.history))
    }

    fn week_path(&self, data_dir: &Path, id: u32) -> PathBuf {
        data_dir.join(format!("WD-{}-{id}.json", self.prefix()))
    }
}

/// The parsed files of one instance.
#[derive(Clone, Debug)]
pub struct Instance {
    pub scenario: Scenario,
    pub history: History,
    pub weeks: Vec<WeekData>,
}

impl Instance {
    pub fn load(data_dir: &Path, args: &InstanceArgs) -> anyhow::Result<Instance> {
        let scenario: Scenario = read_json(&args.scenario_path(data_dir))?;
        let history: History = read_json(&args.history_path(data_dir))?;
        let weeks = args
            .week_files
            .iter()
            .map(|&id| read_json(&args.week_path(data_dir, id)))
            .collect::<anyhow::Result<Vec<WeekData>>>()?;

        Ok(Instance {
            scenario,
            history,
            weeks,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = File::open(path).with_context(|| format!("Error reading {}", path.display()))?;

    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON from {}", path.display()))
}

/// The per-week budget used when none is given: ten seconds plus ten seconds for every nurse
/// beyond twenty.
pub fn automatic_time_limit(nurses: usize) -> Duration {
    Duration::from_secs(10 + 10 * nurses.saturating_sub(20) as u64)
}

/// Logs improving solutions until `limit` of them have been logged.
#[derive(Debug)]
struct LoggingObserver {
    limit: usize,
    logged: Cell<usize>,
}

impl SolutionObserver for LoggingObserver {
    fn on_solution(&self, objective: i64) {
        let logged = self.logged.get();

        if logged < self.limit {
            info!("Found solution with objective {objective}");
            self.logged.set(logged + 1);
        }
    }
}

pub fn configure_logging(verbose: bool) {
    let level_filter = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .format(move |buf, record| writeln!(buf, "{}", record.args()))
        .filter_level(level_filter)
        .target(env_logger::Target::Stdout)
        .init();
}

pub fn run(args: Cli) -> anyhow::Result<()> {
    configure_logging(args.verbose);

    match args.command {
        Action::Solve {
            time_out,
            backend,
            output,
            logged_solutions,
            instance,
        } => {
            let loaded = Instance::load(&args.data_dir, &instance)?;
            solve(
                &loaded,
                &instance,
                backend,
                time_out,
                logged_solutions,
                output.as_deref(),
            )
        }
        Action::Check { instance } => {
            let loaded = Instance::load(&args.data_dir, &instance)?;
            check(&loaded)
        }
    }
}

pub fn solve(
    instance: &Instance,
    args: &InstanceArgs,
    backend: BackendKind,
    time_out: u64,
    logged_solutions: usize,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let time_limit = if time_out == 0 {
        automatic_time_limit(instance.scenario.nurses.len())
    } else {
        Duration::from_secs(time_out)
    };

    let week_ids: Vec<_> = args.week_files.iter().map(u32::to_string).collect();
    println!(
        "{backend:?} for {} weeks ({}) and for {} nurses",
        args.weeks,
        week_ids.join(" "),
        args.nurses
    );
    info!("Time limit per week: {time_limit:?}");

    let solver = backend.create();
    let observer = LoggingObserver {
        limit: logged_solutions,
        logged: Cell::new(0),
    };
    let settings = SolveSettings {
        time_limit,
        weights: Weights::default(),
    };

    let result = RollingHorizon::new(
        &instance.scenario,
        &instance.weeks,
        instance.history.clone(),
        solver.as_ref(),
        settings,
    )?
    .with_observer(&observer)
    .run()?;

    let violations = validation::validate(
        &instance.scenario,
        &instance.weeks,
        &instance.history,
        &result.schedule,
    );
    for violation in &violations {
        warn!("Hard constraint violated: {violation}");
    }

    print_summary(&result);

    if let Some(path) = output {
        write_schedule(path, &instance.scenario, &result)?;
    }

    Ok(())
}

fn print_summary(result: &HorizonResult) {
    println!("{SEPARATOR}");

    for week in &result.weeks {
        println!("status:          {}", week.status);
        println!("objective value: {}", week.objective);
        println!("{SEPARATOR}");
    }

    println!("value total: {}", result.total_objective());
}

#[derive(Serialize)]
struct ScheduleFile<'a> {
    scenario: &'a str,
    #[serde(rename = "totalObjective")]
    total_objective: i64,
    weeks: Vec<WeekRecord>,
    assignments: Vec<ScheduledShift>,
}

#[derive(Serialize)]
struct WeekRecord {
    week: usize,
    status: String,
    objective: i64,
}

fn write_schedule(path: &Path, scenario: &Scenario, result: &HorizonResult) -> anyhow::Result<()> {
    let file = ScheduleFile {
        scenario: &scenario.id,
        total_objective: result.total_objective(),
        weeks: result
            .weeks
            .iter()
            .map(|week| WeekRecord {
                week: week.week,
                status: week.status.to_string(),
                objective: week.objective,
            })
            .collect(),
        assignments: result.schedule.shifts().collect(),
    };

    let writer = BufWriter::new(
        File::create(path).with_context(|| format!("Error creating {}", path.display()))?,
    );
    serde_json::to_writer_pretty(writer, &file)
        .with_context(|| format!("Failed to write the schedule to {}", path.display()))?;

    info!("Schedule written to {}", path.display());

    Ok(())
}

pub fn check(instance: &Instance) -> anyhow::Result<()> {
    instance.scenario.validate()?;

    anyhow::ensure!(
        instance.weeks.len() == instance.scenario.number_of_weeks,
        "the scenario spans {} weeks but {} week data files were given",
        instance.scenario.number_of_weeks,
        instance.weeks.len()
    );

    for week in &instance.weeks {
        week.validate(&instance.scenario)?;
    }

    let history = instance.history.clone().aligned_with(&instance.scenario)?;
    let week_model = build_week(&instance.scenario, 0, &instance.weeks[0], &history)?;

    println!(
        "{}: {} nurses, {} weeks",
        instance.scenario.id,
        instance.scenario.nurses.len(),
        instance.scenario.number_of_weeks
    );
    println!(
        "week 0: {} variables, {} constraints, {} soft violation variables",
        week_model.model.num_variables(),
        week_model.model.num_constraints(),
        week_model.violations().len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn automatic_time_limit_grows_with_the_nurses() {
        assert_eq!(automatic_time_limit(30), Duration::from_secs(110));
        assert_eq!(automatic_time_limit(20), Duration::from_secs(10));
        assert_eq!(automatic_time_limit(5), Duration::from_secs(10));
    }

    #[test]
    fn instance_files_follow_the_inrc_naming() {
        let args = InstanceArgs {
            nurses: 30,
            weeks: 4,
            history: 1,
            week_files: vec![6, 2, 9, 1],
        };
        let dir = Path::new("data");

        assert_eq!(args.scenario_path(dir), dir.join("Sc-n030w4.json"));
        assert_eq!(args.history_path(dir), dir.join("H0-n030w4-1.json"));
        assert_eq!(args.week_path(dir, 6), dir.join("WD-n030w4-6.json"));

        let small = InstanceArgs {
            nurses: 5,
            ..args.clone()
        };
        let large = InstanceArgs {
            nurses: 120,
            weeks: 8,
            ..args
        };

        assert_eq!(small.scenario_path(dir), dir.join("Sc-n005w4.json"));
        assert_eq!(large.scenario_path(dir), dir.join("Sc-n120w8.json"));
        assert_eq!(large.week_path(dir, 3), dir.join("WD-n120w8-3.json"));
    }

    #[test]
    fn parses_the_solve_command() {
        let cli = Cli::parse_from([
            "nsp", "--data-dir", "data", "solve", "0", "--backend", "mip", "-n", "30", "-w", "4",
            "-H", "1", "6", "2", "9", "1",
        ]);

        let Action::Solve {
            time_out,
            backend,
            instance,
            ..
        } = cli.command
        else {
            panic!("expected the solve command");
        };

        assert_eq!(time_out, 0);
        assert_eq!(backend, BackendKind::Mip);
        assert_eq!(instance.history, 1);
        assert_eq!(instance.week_files, vec![6, 2, 9, 1]);
    }

    #[test]
    fn observer_stops_logging_at_the_cap() {
        let observer = LoggingObserver {
            limit: 2,
            logged: Cell::new(0),
        };

        for objective in [90, 60, 30] {
            observer.on_solution(objective);
        }

        assert_eq!(observer.logged.get(), 2);
    }
}
