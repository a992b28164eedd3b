//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Loading robots.txt once before the crawl
//! - Draining the frontier one generation (BFS level) at a time
//! - Dispatching fetch+parse tasks to a bounded worker pool
//! - Waiting for the whole generation before starting the next one
//! - Writing the visited set when the frontier is exhausted
//!
//! Claiming a URL happens at dispatch time through the admission
//! controller, so each URL is fetched at most once even when several pages
//! of the same level link to it.

use crate::config::{validate, Config};
use crate::crawler::fetcher::{Fetcher, PageContent};
use crate::crawler::parser::resolve_hrefs;
use crate::crawler::scheduler::{Frontier, FrontierEntry};
use crate::output::ResultSink;
use crate::robots::{PolicyHandle, RobotsPolicy};
use crate::url::{extract_domain, validate_seed, AdmissionController};
use crate::{CrawlerError, ExtractError, FetchCause, FetchError, UrlError};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// What happened during one BFS level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelReport {
    /// Depth of every entry in the level
    pub depth: u32,

    /// URLs claimed and handed to workers, in dispatch order
    pub dispatched: Vec<String>,

    /// Pages fetched successfully
    pub succeeded: usize,

    /// Pages refused by robots.txt
    pub blocked: usize,

    /// Pages that failed after retries (or whose task aborted)
    pub failed: usize,

    /// Entries dropped at dispatch (already claimed or beyond max depth)
    pub skipped: usize,
}

/// Summary of a finished crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Domain the crawl was confined to
    pub domain: String,

    /// Whether a robots policy was loaded
    pub robots_loaded: bool,

    /// Every URL fetched successfully
    pub visited: BTreeSet<String>,

    /// Per-level statistics in crawl order
    pub levels: Vec<LevelReport>,

    /// File the visited set was written to
    pub output: Option<PathBuf>,
}

impl CrawlReport {
    pub fn pages_visited(&self) -> usize {
        self.visited.len()
    }

    pub fn total_failed(&self) -> usize {
        self.levels.iter().map(|l| l.failed).sum()
    }

    pub fn total_blocked(&self) -> usize {
        self.levels.iter().map(|l| l.blocked).sum()
    }

    /// Depth at which `url` was dispatched, if it was
    pub fn level_of(&self, url: &str) -> Option<u32> {
        self.levels
            .iter()
            .find(|l| l.dispatched.iter().any(|u| u == url))
            .map(|l| l.depth)
    }
}

/// Result of one fetch+parse task
#[derive(Debug)]
enum PageOutcome {
    Visited { url: String },
    Blocked,
    Failed,
}

/// Shared handles a worker task needs
#[derive(Clone)]
struct TaskContext {
    fetcher: Arc<Fetcher>,
    admission: Arc<AdmissionController>,
    frontier: Arc<Frontier>,
    max_depth: u32,
}

/// Single-domain breadth-first crawler
///
/// A crawler is single-use: [`run`](Self::run) consumes it.
pub struct Crawler {
    seed: Url,
    max_depth: u32,
    max_workers: usize,
    fetcher: Arc<Fetcher>,
    admission: Arc<AdmissionController>,
    frontier: Arc<Frontier>,
    sink: ResultSink,
}

impl Crawler {
    /// Creates a crawler for `seed`
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(CrawlerError)` - The configuration or seed is invalid, or the HTTP client could not be built
    pub fn new(seed: &str, config: &Config) -> Result<Self, CrawlerError> {
        validate(config)?;
        let seed = validate_seed(seed)?;
        let domain =
            extract_domain(&seed).ok_or_else(|| UrlError::MissingHost(seed.to_string()))?;
        let fetcher = Fetcher::new(&config.crawler, &config.retry)?;

        Ok(Self {
            frontier: Arc::new(Frontier::with_seed(seed.as_str())),
            admission: Arc::new(AdmissionController::new(domain)),
            fetcher: Arc::new(fetcher),
            sink: ResultSink::new(&config.crawler.output_dir),
            max_depth: config.crawler.max_depth,
            max_workers: config.crawler.max_workers.max(1) as usize,
            seed,
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn domain(&self) -> &str {
        self.admission.domain()
    }

    /// `<scheme>://<domain>/robots.txt` for the seed
    pub fn robots_url(&self) -> String {
        format!("{}://{}/robots.txt", self.seed.scheme(), self.domain())
    }

    /// The robots policy currently installed
    pub fn policy(&self) -> &PolicyHandle {
        self.fetcher.policy()
    }

    /// Fetches and installs robots.txt
    ///
    /// A 200 response is parsed; any other outcome disables the policy for
    /// the rest of the crawl.
    pub async fn load_robots(&mut self) -> &PolicyHandle {
        let robots_url = self.robots_url();

        let handle = match self.fetcher.fetch_unchecked(&robots_url).await {
            Ok(page) if page.status_code == 200 => {
                tracing::info!(url = %robots_url, "Successfully loaded and parsed robots.txt");
                PolicyHandle::Loaded(RobotsPolicy::from_content(&page.body))
            }
            Ok(page) => {
                tracing::warn!(
                    url = %robots_url,
                    status = page.status_code,
                    "Failed to fetch robots.txt, crawling without it"
                );
                PolicyHandle::Disabled {
                    reason: FetchCause::Status(page.status_code).to_string(),
                }
            }
            Err(cause) => {
                tracing::warn!(
                    url = %robots_url,
                    error = %cause,
                    "Failed to fetch robots.txt, crawling without it"
                );
                PolicyHandle::Disabled {
                    reason: cause.to_string(),
                }
            }
        };

        Arc::make_mut(&mut self.fetcher).install_policy(handle);
        self.fetcher.policy()
    }

    /// Runs the whole crawl: robots.txt, BFS, then the result file
    pub async fn run(mut self) -> Result<CrawlReport, CrawlerError> {
        tracing::info!(
            seed = %self.seed,
            domain = self.domain(),
            max_depth = self.max_depth,
            max_workers = self.max_workers,
            "Starting crawl"
        );

        self.load_robots().await;
        let mut report = self.crawl().await;

        let path = self.sink.write(&report.visited)?;
        report.output = Some(path);

        Ok(report)
    }

    /// Runs the BFS loop with whatever robots policy is installed
    ///
    /// Each iteration drains the frontier into an immutable generation,
    /// claims and dispatches its entries, and waits for all of them before
    /// draining again. Links found during a generation form the next one.
    pub async fn crawl(&self) -> CrawlReport {
        let start_time = std::time::Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut report = CrawlReport {
            domain: self.domain().to_string(),
            robots_loaded: self.policy().is_loaded(),
            ..CrawlReport::default()
        };

        loop {
            let generation = self.frontier.drain_generation();
            let Some(depth) = generation.depth() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            let mut level = LevelReport {
                depth,
                ..LevelReport::default()
            };
            let mut tasks = JoinSet::new();

            for entry in generation {
                if entry.depth > self.max_depth || !self.admission.try_claim(&entry.url) {
                    level.skipped += 1;
                    continue;
                }

                level.dispatched.push(entry.url.clone());
                let ctx = self.task_context();
                let semaphore = Arc::clone(&semaphore);

                tasks.spawn(async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire_owned().await.ok();
                    crawl_page(entry, ctx).await
                });
            }

            // Barrier: the whole level finishes before the next drain
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(PageOutcome::Visited { url }) => {
                        level.succeeded += 1;
                        report.visited.insert(url);
                    }
                    Ok(PageOutcome::Blocked) => level.blocked += 1,
                    Ok(PageOutcome::Failed) => level.failed += 1,
                    Err(e) => {
                        tracing::error!(depth, error = %e, "Crawl task aborted");
                        level.failed += 1;
                    }
                }
            }

            if level.dispatched.is_empty() {
                continue;
            }

            tracing::info!(
                depth,
                dispatched = level.dispatched.len(),
                succeeded = level.succeeded,
                blocked = level.blocked,
                failed = level.failed,
                queued = self.frontier.len(),
                "Level complete"
            );
            report.levels.push(level);
        }

        tracing::info!(
            "Crawl completed: {} pages visited in {:?}",
            report.pages_visited(),
            start_time.elapsed()
        );

        report
    }

    fn task_context(&self) -> TaskContext {
        TaskContext {
            fetcher: Arc::clone(&self.fetcher),
            admission: Arc::clone(&self.admission),
            frontier: Arc::clone(&self.frontier),
            max_depth: self.max_depth,
        }
    }
}

/// Fetches one claimed URL and enqueues its admissible links
///
/// Errors stop at this boundary: they are logged and turned into an outcome.
async fn crawl_page(entry: FrontierEntry, ctx: TaskContext) -> PageOutcome {
    tracing::debug!(url = %entry.url, depth = entry.depth, "Crawling URL");

    let page = match ctx.fetcher.fetch(&entry.url).await {
        Ok(page) => page,
        Err(FetchError::RobotsDisallowed { url }) => {
            tracing::info!(url = %url, "URL blocked by robots.txt");
            return PageOutcome::Blocked;
        }
        Err(FetchError::FetchFailed { url, cause }) => {
            tracing::error!(url = %url, error = %cause, "Failed to fetch");
            return PageOutcome::Failed;
        }
    };

    ctx.admission.mark_visited(&entry.url);

    let queued = if entry.depth < ctx.max_depth {
        enqueue_links(&page, entry.depth + 1, &ctx)
    } else {
        0
    };

    tracing::info!(
        url = %entry.url,
        depth = entry.depth,
        status = page.status_code,
        queued,
        "Fetched page"
    );

    PageOutcome::Visited { url: entry.url }
}

/// Extracts links from `page` and pushes the admissible ones at `depth`
fn enqueue_links(page: &PageContent, depth: u32, ctx: &TaskContext) -> usize {
    let resolved = match resolve_hrefs(&page.body, &page.url) {
        Ok(resolved) => resolved,
        Err(ExtractError::EmptyContent) => {
            tracing::debug!(url = %page.url, "Empty page body, no links");
            return 0;
        }
        Err(e) => {
            tracing::warn!(url = %page.url, error = %e, "Failed to extract links");
            return 0;
        }
    };

    let links: Vec<String> = resolved
        .into_iter()
        .filter_map(|link| match link {
            Ok(link) => Some(link),
            Err(e) => {
                tracing::debug!(url = %page.url, error = %e, "Skipping unresolvable link");
                None
            }
        })
        .collect();

    let mut admissible: Vec<String> = ctx.admission.filter_admissible(links).into_iter().collect();
    admissible.sort();

    let count = admissible.len();
    ctx.frontier
        .extend(admissible.into_iter().map(|url| FrontierEntry::new(url, depth)));
    count
}
