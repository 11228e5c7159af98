//! Batch driver: discovers plans, compiles them in parallel and writes one
//! container per plan and biome.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::allowlist::Allowlist;
use crate::compiler::{self, CompileContext, CompileOptions};
use crate::encoder;
use crate::error::{CompileError, Error, PlanFailure, Result};
use crate::plan::{self, Plan, SUPPORTED_BIOMES};
use crate::templates::TemplateLibrary;

pub const PLAN_EXTENSION: &str = "json";
pub const OUTPUT_EXTENSION: &str = "bin";

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub plans: PathBuf,
    pub templates: PathBuf,
    pub allowlist: PathBuf,
    pub out: PathBuf,
    pub options: CompileOptions,
    /// Biome variants to produce; empty means all supported biomes.
    pub biomes: Vec<String>,
    pub jobs: usize,
}

impl BatchConfig {
    pub fn new(plans: impl Into<PathBuf>, out: impl Into<PathBuf>) -> Self {
        BatchConfig {
            plans: plans.into(),
            templates: PathBuf::from("templates"),
            allowlist: PathBuf::from("allowlist.json"),
            out: out.into(),
            options: CompileOptions::default(),
            biomes: Vec::new(),
            jobs: default_jobs(),
        }
    }

    /// Selected biomes in canonical order, duplicates removed.
    pub fn selected_biomes(&self) -> Result<Vec<String>> {
        if let Some(unknown) = self
            .biomes
            .iter()
            .find(|b| !SUPPORTED_BIOMES.contains(&b.as_str()))
        {
            return Err(Error::config(format!(
                "unknown biome '{}' (expected one of {})",
                unknown,
                SUPPORTED_BIOMES.join(", ")
            )));
        }
        Ok(SUPPORTED_BIOMES
            .iter()
            .filter(|b| self.biomes.is_empty() || self.biomes.iter().any(|s| s == *b))
            .map(|b| (*b).to_owned())
            .collect())
    }
}

pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// One written container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    pub plan: PathBuf,
    pub biome: Option<String>,
    pub output: PathBuf,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub compiled: Vec<CompiledOutput>,
    pub failures: Vec<PlanFailure>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    fn sort(&mut self) {
        self.compiled
            .sort_by(|a, b| (&a.plan, &a.biome).cmp(&(&b.plan, &b.biome)));
        self.failures
            .sort_by(|a, b| (&a.plan, &a.biome).cmp(&(&b.plan, &b.biome)));
    }

    /// `[ok]` lines and the final count go to `out`, one line per failure to `err`.
    pub fn report<O: Write, E: Write>(&self, out: &mut O, err: &mut E) -> io::Result<()> {
        for compiled in &self.compiled {
            writeln!(
                out,
                "[ok] {} -> {}",
                compiled.plan.display(),
                compiled.output.display()
            )?;
        }
        for failure in &self.failures {
            writeln!(err, "[error] {}", failure)?;
        }
        writeln!(
            out,
            "compiled={} failed={}",
            self.compiled.len(),
            self.failures.len()
        )
    }
}

/// Every `*.json` below `root`, relative to it, sorted.
pub fn discover_plans(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::config(format!(
            "plan directory {} does not exist",
            root.display()
        )));
    }

    let mut plans = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            Error::config(format!("cannot walk {}: {}", root.display(), e))
        })?;
        let path = entry.path();
        let is_plan = entry.file_type().is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(PLAN_EXTENSION);
        if is_plan {
            if let Ok(relative) = path.strip_prefix(root) {
                plans.push(relative.to_path_buf());
            }
        }
    }
    plans.sort();

    if plans.is_empty() {
        return Err(Error::config(format!(
            "no *.{} plans found under {}",
            PLAN_EXTENSION,
            root.display()
        )));
    }
    Ok(plans)
}

pub fn load_context(config: &BatchConfig) -> Result<CompileContext> {
    let allowlist = Allowlist::load(&config.allowlist)?;
    info!(
        "loaded allowlist {} ({} blocks)",
        config.allowlist.display(),
        allowlist.len()
    );
    let templates = TemplateLibrary::load(&config.templates)?;
    info!(
        "loaded {} templates from {}",
        templates.len(),
        config.templates.display()
    );
    Ok(CompileContext {
        allowlist,
        templates,
    })
}

/// `<out>/<relative plan path>` with the `.bin` extension and an optional
/// `_<biome>` suffix on the file stem.
pub fn output_path(out: &Path, relative: &Path, biome: Option<&str>) -> PathBuf {
    let target = out.join(relative);
    match biome {
        Some(biome) => {
            let stem = target
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            target.with_file_name(format!("{}_{}.{}", stem, biome, OUTPUT_EXTENSION))
        }
        None => target.with_extension(OUTPUT_EXTENSION),
    }
}

/// Writes next to the target and renames, so readers never see a partial file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

/// One plan × biome unit and the file it writes.
#[derive(Debug, Clone)]
struct Variant {
    biome: Option<String>,
    output: PathBuf,
    /// Other plans that would write the same file.
    clashes_with: Vec<PathBuf>,
}

fn variants(plan: &Plan, relative: &Path, out: &Path, biomes: &[String]) -> Vec<Variant> {
    let variant = |biome: Option<&str>| Variant {
        biome: biome.map(str::to_owned),
        output: output_path(out, relative, biome),
        clashes_with: Vec::new(),
    };
    if plan.has_palettes() {
        biomes.iter().map(|b| variant(Some(b.as_str()))).collect()
    } else {
        vec![variant(None)]
    }
}

struct PlanJob {
    source: PathBuf,
    plan: Plan,
    variants: Vec<Variant>,
    context: Arc<CompileContext>,
    options: CompileOptions,
}

type JobResult = std::result::Result<CompiledOutput, PlanFailure>;

fn failure(source: &Path, biome: Option<&str>, error: CompileError) -> PlanFailure {
    PlanFailure {
        plan: source.to_path_buf(),
        biome: biome.map(str::to_owned),
        error,
    }
}

/// Loads every plan and assigns its variants their output files. Variants of
/// different plans that map to one file are marked on both sides. Plans that
/// fail to load come back as failures.
fn prepare(
    plans: Vec<PathBuf>,
    config: &BatchConfig,
    biomes: &[String],
    context: &Arc<CompileContext>,
) -> (Vec<PlanJob>, Vec<PlanFailure>) {
    let mut jobs = Vec::with_capacity(plans.len());
    let mut failures = Vec::new();
    for relative in plans {
        let source = config.plans.join(&relative);
        match plan::load_plan(&source) {
            Ok(plan) => jobs.push(PlanJob {
                variants: variants(&plan, &relative, &config.out, biomes),
                source,
                plan,
                context: Arc::clone(context),
                options: config.options,
            }),
            Err(error) => failures.push(failure(&source, None, error)),
        }
    }

    let mut claims: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for job in &jobs {
        for variant in &job.variants {
            claims
                .entry(variant.output.clone())
                .or_default()
                .push(job.source.clone());
        }
    }
    for job in &mut jobs {
        for variant in &mut job.variants {
            if let Some(sources) = claims.get(&variant.output) {
                variant.clashes_with = sources
                    .iter()
                    .filter(|s| **s != job.source)
                    .cloned()
                    .collect();
            }
        }
    }
    (jobs, failures)
}

impl PlanJob {
    fn fail(&self, biome: Option<&str>, error: CompileError) -> JobResult {
        Err(failure(&self.source, biome, error))
    }

    /// Compiles every variant of one plan; each variant fails on its own.
    fn run(self) -> Vec<JobResult> {
        self.variants
            .iter()
            .map(|variant| {
                let biome = variant.biome.as_deref();
                let output = &variant.output;
                if !variant.clashes_with.is_empty() {
                    let others: Vec<String> = variant
                        .clashes_with
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect();
                    return self.fail(
                        biome,
                        CompileError::schema(format!(
                            "output {} is also produced by {}",
                            output.display(),
                            others.join(", ")
                        )),
                    );
                }

                let written =
                    compiler::compile_plan(&self.plan, biome, &self.context, &self.options)
                        .and_then(|structure| {
                            encoder::encode(&structure).map_err(|e| CompileError::io(output, e))
                        })
                        .and_then(|bytes| {
                            write_atomic(output, &bytes).map_err(|e| CompileError::io(output, e))
                        });
                match written {
                    Ok(()) => {
                        debug!("wrote {}", output.display());
                        Ok(CompiledOutput {
                            plan: self.source.clone(),
                            biome: variant.biome.clone(),
                            output: output.clone(),
                        })
                    }
                    Err(error) => self.fail(biome, error),
                }
            })
            .collect()
    }
}

fn collect(summary: &mut BatchSummary, results: Vec<JobResult>) {
    for result in results {
        match result {
            Ok(compiled) => summary.compiled.push(compiled),
            Err(failure) => {
                warn!("{}", failure);
                summary.failures.push(failure);
            }
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Worker(e.to_string())
}

/// Runs a whole batch.
///
/// Configuration problems are returned as [`Error`] before any file is
/// written; plan failures are collected in the summary.
pub async fn run(config: BatchConfig) -> Result<BatchSummary> {
    let biomes = config.selected_biomes()?;
    let plans = discover_plans(&config.plans)?;
    let context = Arc::new(load_context(&config)?);
    fs::create_dir_all(&config.out).map_err(|e| Error::io(&config.out, e))?;
    let jobs = config.jobs.max(1);

    info!(
        "compiling {} plans with {} jobs (rotate={} mirror={} entities={})",
        plans.len(),
        jobs,
        config.options.rotation,
        config.options.mirror,
        config.options.include_entities
    );

    let (plan_jobs, load_failures) =
        tokio::task::spawn_blocking(move || prepare(plans, &config, &biomes, &context))
            .await
            .map_err(join_error)?;
    let mut summary = BatchSummary::default();
    collect(&mut summary, load_failures.into_iter().map(Err).collect());

    let mut tasks = JoinSet::new();
    for job in plan_jobs {
        while tasks.len() >= jobs {
            if let Some(joined) = tasks.join_next().await {
                collect(&mut summary, joined.map_err(join_error)?);
            }
        }
        tasks.spawn_blocking(move || job.run());
    }
    while let Some(joined) = tasks.join_next().await {
        collect(&mut summary, joined.map_err(join_error)?);
    }

    summary.sort();
    info!(
        "batch finished: compiled={} failed={}",
        summary.compiled.len(),
        summary.failures.len()
    );
    Ok(summary)
}
