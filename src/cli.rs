use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::TestType;

#[derive(Parser, Debug)]
#[command(
    name = "benchboard",
    version,
    about = "Local benchmark result store and trend query tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest benchmark records (JSON object, JSON array, or JSONL)
    Submit(SubmitArgs),
    /// List stored benchmark runs with simple filters
    List(ListArgs),
    /// List benchmark runs with multi-valued filters
    Runs(RunsArgs),
    /// Enumerate distinct models, builds, GPUs, main GPUs, or split modes
    Catalog(CatalogArgs),
    /// Throughput trend grouped by a single column
    Trend(TrendArgs),
    /// Throughput trend grouped by caller-selected dimensions
    Pivot(PivotArgs),
    /// Per-series trend over (commit, model, gpu, test type)
    Series(RunsArgs),
    /// Compare throughput across model/build pairs
    Compare(CompareArgs),
    /// Show the dimension catalog, optionally with stored values
    Dimensions(DimensionsArgs),
    /// Summary statistics and recent submissions
    Stats(StatsArgs),
    /// Delete benchmark runs by id
    Delete(DeleteArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TestTypeArg {
    Pp,
    Tg,
    #[value(name = "pp+tg")]
    PpTg,
}

impl TestTypeArg {
    pub fn as_test_type(self) -> TestType {
        match self {
            Self::Pp => TestType::Pp,
            Self::Tg => TestType::Tg,
            Self::PpTg => TestType::PpTg,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SubmitFormat {
    Auto,
    Json,
    Jsonl,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CatalogKind {
    Models,
    Builds,
    Gpus,
    MainGpus,
    SplitModes,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    /// Input file; reads stdin when absent
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SubmitFormat::Auto)]
    pub format: SubmitFormat,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    #[arg(long)]
    pub commit: Option<String>,

    /// Substring match on model filename
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, value_enum)]
    pub test_type: Option<TestTypeArg>,

    /// Inclusive lower bound on test_time
    #[arg(long)]
    pub since: Option<String>,

    /// Inclusive upper bound on test_time
    #[arg(long)]
    pub until: Option<String>,

    #[arg(long, default_value_t = 50)]
    pub limit: i64,

    #[arg(long, default_value_t = 0)]
    pub offset: i64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunsArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    /// Exact model filename; repeatable
    #[arg(long = "model")]
    pub models: Vec<String>,

    /// GPU name substring; repeatable, matched against any listed GPU
    #[arg(long = "gpu")]
    pub gpus: Vec<String>,

    #[arg(long = "test-type", value_enum)]
    pub test_types: Vec<TestTypeArg>,

    #[arg(long = "main-gpu")]
    pub main_gpus: Vec<i64>,

    #[arg(long = "split-mode")]
    pub split_modes: Vec<String>,

    /// Dimension filter as key=value; repeatable
    #[arg(long = "dim")]
    pub dims: Vec<String>,

    #[arg(long, default_value_t = 100)]
    pub limit: i64,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    #[arg(long, value_enum)]
    pub kind: CatalogKind,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TrendArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    /// Grouping column; unknown names fall back to build_commit
    #[arg(long, default_value = "build_commit")]
    pub group_by: String,

    #[arg(long, value_enum, default_value_t = TestTypeArg::Tg)]
    pub test_type: TestTypeArg,

    /// Substring match on model filename
    #[arg(long)]
    pub model: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PivotArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    /// Extra grouping dimension key; repeatable, unknowns ignored
    #[arg(long = "dim")]
    pub dims: Vec<String>,

    /// Dimension filter as key=value; repeatable, unknowns ignored
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    #[arg(long = "test-type", value_enum)]
    pub test_types: Vec<TestTypeArg>,

    /// Exact model filename; repeatable
    #[arg(long = "model")]
    pub models: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    /// Exact model filename; repeatable
    #[arg(long = "model")]
    pub models: Vec<String>,

    /// Exact build commit; repeatable
    #[arg(long = "commit")]
    pub commits: Vec<String>,

    #[arg(long, value_enum, default_value_t = TestTypeArg::Tg)]
    pub test_type: TestTypeArg,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DimensionsArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    /// Include distinct stored values with occurrence counts
    #[arg(long, default_value_t = false)]
    pub values: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[arg(long, default_value = ".cache/benchboard/benchmarks.sqlite")]
    pub db_path: PathBuf,

    #[arg(long = "id", required = true)]
    pub ids: Vec<i64>,
}
