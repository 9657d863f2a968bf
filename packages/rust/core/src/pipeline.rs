//! End-to-end batch run: rows → authors → generate → assemble → publish.
//!
//! Authors are resolved up front, one row at a time, so a missing author stops
//! the run before any generation is paid for. Topics are then processed on a
//! bounded set of tasks and collected in completion order; a failing topic is
//! logged and recorded without affecting the others.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, Span, debug, error, field, info, instrument, warn};

use autopress_cms::{AuthorCache, CmsClient, TaxonomyResolver};
use autopress_generator::ContentGenerator;
use autopress_shared::{
    AutopressError, InputRow, PostStatus, PublishSettings, Result, RunId, TermId,
};

use crate::assembler::PostAssembler;

/// Configuration for [`run_batch`].
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Decorated system instruction sent with every topic.
    pub instruction: String,
    /// Maximum number of topics in flight.
    pub concurrency: usize,
    /// Post assembly settings.
    pub publish: PublishSettings,
}

/// One unit of work: a row whose author has already been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostJob {
    pub topic: String,
    pub author_id: TermId,
    pub category_names: String,
    pub tag_names: String,
}

/// Step at which a topic failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Generation,
    Assembly,
    Publish,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation => f.write_str("generation"),
            Self::Assembly => f.write_str("assembly"),
            Self::Publish => f.write_str("publish"),
        }
    }
}

/// Result of processing a single topic.
#[derive(Debug)]
pub enum ItemOutcome {
    Published {
        topic: String,
        /// Raw CMS response body.
        response: String,
    },
    Failed {
        topic: String,
        stage: FailureStage,
        error: AutopressError,
    },
}

impl ItemOutcome {
    pub fn topic(&self) -> &str {
        match self {
            Self::Published { topic, .. } | Self::Failed { topic, .. } => topic,
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published { .. })
    }

    fn failed(topic: String, stage: FailureStage, error: AutopressError) -> Self {
        Self::Failed {
            topic,
            stage,
            error,
        }
    }
}

/// Summary of a batch run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    /// Number of input rows.
    pub total: usize,
    /// Distinct authors resolved.
    pub authors_resolved: usize,
    /// Status requested for every post of the run.
    pub post_status: PostStatus,
    /// Per-topic outcomes in completion order.
    pub outcomes: Vec<ItemOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn published_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_published()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.published_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.is_published())
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a topic finishes, successfully or not.
    fn item_finished(&self, outcome: &ItemOutcome, completed: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_finished(&self, _outcome: &ItemOutcome, _completed: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run a batch of input rows.
///
/// 1. Probe CMS authentication
/// 2. Resolve every row's author, sequentially and memoized
/// 3. Generate, assemble and publish each topic with at most
///    `config.concurrency` topics in flight
///
/// Fatal errors (rejected credentials, blank or unknown author) are returned
/// as `Err` before any topic is generated. Per-topic failures end up in the
/// report.
#[instrument(
    skip_all,
    fields(run_id = field::Empty, rows = rows.len(), concurrency = config.concurrency)
)]
pub async fn run_batch(
    config: &BatchConfig,
    rows: &[InputRow],
    generator: Arc<dyn ContentGenerator>,
    cms: &CmsClient,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    Span::current().record("run_id", field::display(&run_id));

    info!(post_status = %config.publish.post_status, "starting batch run");

    if rows.is_empty() {
        warn!("no rows to process");
        let report = RunReport {
            run_id,
            total: 0,
            authors_resolved: 0,
            post_status: config.publish.post_status.clone(),
            outcomes: Vec::new(),
            elapsed: start.elapsed(),
        };
        progress.done(&report);
        return Ok(report);
    }

    // --- Phase 1: Authentication ---
    progress.phase("Checking CMS credentials");
    cms.verify_authentication().await?;

    // --- Phase 2: Authors ---
    progress.phase("Resolving authors");
    let resolver = TaxonomyResolver::new(cms.clone());
    let (jobs, authors) = resolve_authors(&resolver, rows).await?;
    info!(
        authors = authors.len(),
        lookups = authors.remote_lookups(),
        "authors resolved"
    );

    // --- Phase 3: Generate and publish ---
    progress.phase("Generating and publishing");
    let assembler = Arc::new(PostAssembler::new(resolver, config.publish.clone()));
    let outcomes = process_jobs(config, jobs, generator, assembler, cms, progress).await;

    let report = RunReport {
        run_id,
        total: rows.len(),
        authors_resolved: authors.len(),
        post_status: config.publish.post_status.clone(),
        outcomes,
        elapsed: start.elapsed(),
    };

    info!(
        published = report.published_count(),
        failed = report.failed_count(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "batch run complete"
    );

    progress.done(&report);
    Ok(report)
}

/// Resolve every row's author in input order.
async fn resolve_authors(
    resolver: &TaxonomyResolver,
    rows: &[InputRow],
) -> Result<(Vec<PostJob>, AuthorCache)> {
    let mut authors = AuthorCache::new();
    let mut jobs = Vec::with_capacity(rows.len());

    for row in rows {
        let author_id = authors.resolve(resolver, &row.author_name).await?;
        jobs.push(PostJob {
            topic: row.topic.clone(),
            author_id,
            category_names: row.category_names.clone(),
            tag_names: row.tag_names.clone(),
        });
    }

    Ok((jobs, authors))
}

async fn process_jobs(
    config: &BatchConfig,
    jobs: Vec<PostJob>,
    generator: Arc<dyn ContentGenerator>,
    assembler: Arc<PostAssembler>,
    cms: &CmsClient,
    progress: &dyn ProgressReporter,
) -> Vec<ItemOutcome> {
    let total = jobs.len();
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let instruction: Arc<str> = Arc::from(config.instruction.as_str());

    let mut tasks = JoinSet::new();
    let mut topics = HashMap::with_capacity(total);

    for job in jobs {
        let sem = semaphore.clone();
        let generator = generator.clone();
        let assembler = assembler.clone();
        let cms = cms.clone();
        let instruction = instruction.clone();
        let topic = job.topic.clone();

        let task = async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return ItemOutcome::failed(
                    job.topic,
                    FailureStage::Generation,
                    AutopressError::Generation("worker pool closed".into()),
                );
            };
            process_job(job, generator.as_ref(), &assembler, &cms, &instruction).await
        };
        let handle = tasks.spawn(task.in_current_span());
        topics.insert(handle.id(), topic);
    }

    let mut outcomes = Vec::with_capacity(total);
    while let Some(joined) = tasks.join_next_with_id().await {
        let outcome = match joined {
            Ok((id, outcome)) => {
                topics.remove(&id);
                outcome
            }
            Err(e) => {
                let topic = topics.remove(&e.id()).unwrap_or_default();
                ItemOutcome::failed(
                    topic,
                    FailureStage::Generation,
                    AutopressError::Generation(format!("task failed: {e}")),
                )
            }
        };

        match &outcome {
            ItemOutcome::Published { topic, response } => {
                info!(%topic, "post published");
                debug!(%topic, %response, "CMS response");
            }
            ItemOutcome::Failed {
                topic,
                stage,
                error,
            } => {
                error!(%topic, %stage, %error, "topic failed");
            }
        }

        progress.item_finished(&outcome, outcomes.len() + 1, total);
        outcomes.push(outcome);
    }

    outcomes
}

async fn process_job(
    job: PostJob,
    generator: &dyn ContentGenerator,
    assembler: &PostAssembler,
    cms: &CmsClient,
    instruction: &str,
) -> ItemOutcome {
    let text = match generator.generate(&job.topic, instruction).await {
        Ok(text) => text,
        Err(e) => return ItemOutcome::failed(job.topic, FailureStage::Generation, e),
    };

    let document = match assembler
        .assemble(&text, job.author_id, &job.category_names, &job.tag_names)
        .await
    {
        Ok(document) => document,
        Err(e) => return ItemOutcome::failed(job.topic, FailureStage::Assembly, e),
    };

    match cms.publish(&document).await {
        Ok(response) => ItemOutcome::Published {
            topic: job.topic,
            response,
        },
        Err(e) => ItemOutcome::failed(job.topic, FailureStage::Publish, e),
    }
}
