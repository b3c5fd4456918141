//! Batch pipeline: plans a request, generates documents tier by tier in
//! bounded batches and streams them to the writer.
//!
//! States run `Planning → Generating → Draining → Done`. All randomness
//! comes from one seeded [`CorpusRng`], consumed in tier order, then document
//! order, then (for shuffled corpora) the shuffle.

use crate::distribution::DistributionPlan;
use crate::request::{GenerationRequest, RequestError};
use crate::stats::{CorpusStatistics, RunStatus, StatisticsCollector, WriteSummary};
use crate::writer::{Sink, StreamingWriter, WriteError, WriterOptions};
use corpus_templates::{CorpusRng, Document, Registry, TemplateError, TemplateFamily};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a run stopped before completing
#[derive(Debug, Error)]
pub enum AbortCause {
    #[error("cannot open output {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("write failed for {tier} document {index} at byte offset {offset}: {source}")]
    Write {
        tier: String,
        index: u64,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("flush failed at byte offset {offset}: {source}")]
    Flush {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("cannot serialize {tier} document {index}: {source}")]
    Serialize {
        tier: String,
        index: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("template failed for {tier} document {index}: {source}")]
    Template {
        tier: String,
        index: u64,
        #[source]
        source: TemplateError,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Request(#[from] RequestError),

    /// `partial` reflects only the documents written before the failure
    #[error("aborted after {} documents: {cause}", .partial.document_count)]
    Aborted {
        cause: AbortCause,
        partial: Box<CorpusStatistics>,
    },
}

impl PipelineError {
    /// Statistics of the documents written before an abort
    pub fn partial(&self) -> Option<&CorpusStatistics> {
        match self {
            PipelineError::Aborted { partial, .. } => Some(partial),
            PipelineError::Request(_) => None,
        }
    }
}

/// Cooperative cancellation flag, checked before every batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Planning,
    Generating,
    Draining,
    Done,
}

/// Called with `(documents_written, bytes_written)` after every batch
pub type ProgressFn<'a> = Box<dyn FnMut(u64, u64) + 'a>;

pub struct Pipeline<'a> {
    registry: &'a Registry,
    request: GenerationRequest,
    cancel: CancellationToken,
    progress: Option<ProgressFn<'a>>,
    state: PipelineState,
}

/// Everything decided during planning
struct Planned<'a> {
    family: &'a dyn TemplateFamily,
    plan: DistributionPlan,
    rng: CorpusRng,
    collector: StatisticsCollector,
    shuffle: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(registry: &'a Registry, request: GenerationRequest) -> Self {
        Self {
            registry,
            request,
            cancel: CancellationToken::new(),
            progress: None,
            state: PipelineState::Planning,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress<F: FnMut(u64, u64) + 'a>(mut self, f: F) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run the request, writing to `sink`.
    pub fn run(mut self, sink: &Sink) -> Result<CorpusStatistics, PipelineError> {
        let planned = self.plan_run()?;

        let writer = match StreamingWriter::open(sink, WriterOptions::from_request(&self.request))
        {
            Ok(writer) => writer,
            Err(source) => {
                self.transition(PipelineState::Done);
                return Err(PipelineError::Aborted {
                    cause: AbortCause::Open {
                        path: sink.to_string(),
                        source,
                    },
                    partial: Box::new(
                        planned
                            .collector
                            .finish(RunStatus::Aborted, &WriteSummary::default()),
                    ),
                });
            }
        };
        debug!(sink = %sink, "output opened");
        self.execute(planned, writer)
    }

    /// Run the request against an already opened writer
    pub fn run_with_writer(
        mut self,
        writer: StreamingWriter,
    ) -> Result<CorpusStatistics, PipelineError> {
        let planned = self.plan_run()?;
        self.execute(planned, writer)
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "pipeline state");
        self.state = next;
    }

    fn plan_run(&self) -> Result<Planned<'a>, PipelineError> {
        let request = &self.request;
        let plan = request.plan(self.registry)?;
        let family = self.registry.family(&request.family).map_err(RequestError::from)?;

        let seed = request.seed.unwrap_or_else(rand::random);
        let streaming = request.is_streaming();
        if streaming && request.shuffle && request.tier.is_mixed() && !family.ordered() {
            warn!(
                count = request.total_count,
                "streaming mode writes tiers in order; shuffle skipped"
            );
        }

        debug!(
            family = family.name(),
            tier = %request.tier,
            count = request.total_count,
            seed,
            streaming,
            plan = ?plan,
            "planned corpus"
        );

        let collector =
            StatisticsCollector::new(seed, request.format).with_tiers(plan.tiers());
        Ok(Planned {
            family,
            plan,
            rng: CorpusRng::seed_from_u64(seed),
            collector,
            shuffle: request.shuffles() && !family.ordered(),
        })
    }

    fn execute(
        &mut self,
        planned: Planned<'a>,
        writer: StreamingWriter,
    ) -> Result<CorpusStatistics, PipelineError> {
        let Planned {
            family,
            plan,
            mut rng,
            collector,
            shuffle,
        } = planned;

        self.transition(PipelineState::Generating);
        let mut generation = Generation {
            family,
            writer,
            collector,
            uncommitted: Uncommitted::default(),
            cancel: &self.cancel,
            progress: self.progress.as_mut(),
            batch_size: self.request.batch_size as u64,
            chunk_size: self.request.effective_flush_interval(),
        };

        let outcome = if shuffle {
            generation.shuffled(&plan, &mut rng)
        } else {
            generation.sequential(&plan, &mut rng)
        };
        let Generation {
            mut writer,
            mut collector,
            mut uncommitted,
            ..
        } = generation;

        self.transition(PipelineState::Draining);
        let result = match outcome {
            Ok(status) => {
                let closed = writer.close();
                uncommitted.settle(writer.committed_documents(), &mut collector);
                match closed {
                    Ok(summary) => Ok(collector.finish(status, &summary)),
                    Err(source) => Err(PipelineError::Aborted {
                        cause: AbortCause::Flush {
                            offset: writer.committed_bytes(),
                            source,
                        },
                        partial: Box::new(
                            collector.finish(RunStatus::Aborted, &writer.summary()),
                        ),
                    }),
                }
            }
            Err(cause) => {
                // JSON arrays stay unterminated; buffered documents get one last flush
                if let Err(e) = writer.abort() {
                    debug!(error = %e, "sink release failed after abort");
                }
                uncommitted.settle(writer.committed_documents(), &mut collector);
                Err(PipelineError::Aborted {
                    cause,
                    partial: Box::new(collector.finish(RunStatus::Aborted, &writer.summary())),
                })
            }
        };
        self.transition(PipelineState::Done);

        match &result {
            Ok(stats) => info!(
                documents = stats.document_count,
                bytes = stats.bytes_written,
                batches = stats.batches,
                status = %stats.status,
                "corpus generation finished"
            ),
            Err(e) => warn!(error = %e, "corpus generation aborted"),
        }
        result
    }
}

/// Documents handed to the writer that the sink has not accepted yet.
///
/// They reach the statistics only once a flush commits them, so partial
/// statistics never count output that was lost in the buffer.
#[derive(Default)]
struct Uncommitted {
    docs: VecDeque<(String, usize)>,
    recorded: u64,
}

impl Uncommitted {
    fn push(&mut self, tier: &str, len: usize) {
        self.docs.push_back((tier.to_string(), len));
    }

    /// Record everything up to the writer's committed document count
    fn settle(&mut self, committed: u64, collector: &mut StatisticsCollector) {
        while self.recorded < committed {
            let Some((tier, len)) = self.docs.pop_front() else {
                break;
            };
            collector.record(&tier, len);
            self.recorded += 1;
        }
    }
}

/// Mutable state of the Generating phase
struct Generation<'p, 'a> {
    family: &'a dyn TemplateFamily,
    writer: StreamingWriter,
    collector: StatisticsCollector,
    uncommitted: Uncommitted,
    cancel: &'p CancellationToken,
    progress: Option<&'p mut ProgressFn<'a>>,
    batch_size: u64,
    chunk_size: usize,
}

impl Generation<'_, '_> {
    /// Generate and write tier by tier, one batch at a time
    fn sequential(
        &mut self,
        plan: &DistributionPlan,
        rng: &mut CorpusRng,
    ) -> Result<RunStatus, AbortCause> {
        for allocation in plan {
            let tier = allocation.tier.as_str();
            let mut index = 0;
            while index < allocation.count {
                if self.cancel.is_cancelled() {
                    debug!(tier, index, "cancelled before batch");
                    return Ok(RunStatus::Cancelled);
                }
                let len = self.batch_size.min(allocation.count - index);

                let started = Instant::now();
                let batch = self.generate_batch(tier, index, len, rng)?;
                self.collector.add_generation_time(started.elapsed());

                let started = Instant::now();
                for (offset, doc) in (index..).zip(&batch) {
                    self.write(tier, offset, doc)?;
                }
                self.flush()?;
                self.collector.add_write_time(started.elapsed());
                self.collector.record_batch();

                debug!(tier, start = index, len, "batch written");
                self.report_progress();
                index += len;
            }
        }
        Ok(RunStatus::Completed)
    }

    /// Materialize every batch, shuffle the whole corpus, then write it in
    /// flush-interval chunks
    fn shuffled(
        &mut self,
        plan: &DistributionPlan,
        rng: &mut CorpusRng,
    ) -> Result<RunStatus, AbortCause> {
        let tiers: Vec<&str> = plan.tiers().collect();
        info!(
            documents = plan.total(),
            "holding the whole corpus in memory for the shuffle"
        );
        let mut corpus: Vec<(usize, u64, Document)> = Vec::with_capacity(plan.total() as usize);

        for (slot, allocation) in plan.iter().enumerate() {
            let tier = allocation.tier.as_str();
            let mut index = 0;
            while index < allocation.count {
                if self.cancel.is_cancelled() {
                    debug!(tier, index, "cancelled before batch");
                    return Ok(RunStatus::Cancelled);
                }
                let len = self.batch_size.min(allocation.count - index);

                let started = Instant::now();
                let batch = self.generate_batch(tier, index, len, rng)?;
                self.collector.add_generation_time(started.elapsed());
                self.collector.record_batch();

                corpus.extend((index..).zip(batch).map(|(i, doc)| (slot, i, doc)));
                debug!(tier, start = index, len, "batch generated");
                index += len;
            }
        }

        let started = Instant::now();
        corpus.shuffle(rng);
        self.collector.add_generation_time(started.elapsed());
        self.collector.set_shuffled(true);
        debug!(documents = corpus.len(), "corpus shuffled");

        for chunk in corpus.chunks(self.chunk_size) {
            if self.cancel.is_cancelled() {
                debug!(written = self.writer.documents_written(), "cancelled before chunk");
                return Ok(RunStatus::Cancelled);
            }
            let started = Instant::now();
            for (slot, index, doc) in chunk {
                self.write(tiers[*slot], *index, doc)?;
            }
            self.flush()?;
            self.collector.add_write_time(started.elapsed());
            self.report_progress();
        }
        Ok(RunStatus::Completed)
    }

    fn generate_batch(
        &self,
        tier: &str,
        start: u64,
        len: u64,
        rng: &mut CorpusRng,
    ) -> Result<Vec<Document>, AbortCause> {
        (start..start + len)
            .map(|index| {
                let id = format!("{}_{}", tier, index);
                self.family
                    .generate(tier, &id, rng)
                    .map_err(|source| AbortCause::Template {
                        tier: tier.to_string(),
                        index,
                        source,
                    })
            })
            .collect()
    }

    fn write(&mut self, tier: &str, index: u64, doc: &Document) -> Result<(), AbortCause> {
        match self.writer.write_document(doc) {
            Ok(len) => {
                self.uncommitted.push(tier, len);
                self.settle();
                Ok(())
            }
            Err(WriteError::Flush { len, source }) => {
                self.uncommitted.push(tier, len);
                Err(AbortCause::Flush {
                    offset: self.writer.committed_bytes(),
                    source,
                })
            }
            Err(WriteError::Serialize(source)) => Err(AbortCause::Serialize {
                tier: tier.to_string(),
                index,
                source,
            }),
            Err(WriteError::Io(source)) => Err(AbortCause::Write {
                tier: tier.to_string(),
                index,
                offset: self.writer.committed_bytes(),
                source,
            }),
            Err(WriteError::Closed) => Err(AbortCause::Write {
                tier: tier.to_string(),
                index,
                offset: self.writer.committed_bytes(),
                source: io::Error::other("writer already closed"),
            }),
        }
    }

    fn flush(&mut self) -> Result<(), AbortCause> {
        self.writer.flush().map_err(|source| AbortCause::Flush {
            offset: self.writer.committed_bytes(),
            source,
        })?;
        self.settle();
        Ok(())
    }

    fn settle(&mut self) {
        self.uncommitted
            .settle(self.writer.committed_documents(), &mut self.collector);
    }

    fn report_progress(&mut self) {
        let documents = self.writer.committed_documents();
        let bytes = self.writer.committed_bytes();
        if let Some(progress) = self.progress.as_deref_mut() {
            progress(documents, bytes);
        }
    }
}
