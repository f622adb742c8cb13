//! Streaming annotation of a whole VCF file.
//!
//! With one thread every line is read, annotated and written on the calling
//! thread. With more, a reader thread feeds a pool of annotation workers and
//! the calling thread writes results back in input order. The number of lines
//! between the reader and the writer is capped by `reorder_window`: the
//! reader needs a credit per line and the writer hands one back per line
//! written.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};
use indicatif::ProgressBar;

use crate::annotator::{AnnotatedRecord, Annotator};
use crate::collection::AlleleCollection;
use crate::config::{AnnotatorConfig, MalformedPolicy};
use crate::error::{AnnotateError, MalformedRecordError, Result};
use crate::reader::{VcfLine, VcfReader};
use crate::resolver::{AlleleResolver, TimeoutResolver};
use crate::summary::RunSummary;
use crate::writer::VcfWriter;

/// Lifecycle of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Streaming,
    Flushing,
    Done,
    Aborted,
}

/// Asks a running pipeline to stop. Cheap to clone and share across threads.
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

/// A line after the annotation stage.
enum Processed {
    Header(String),
    Annotated(Box<AnnotatedRecord>),
    Malformed {
        line_number: u64,
        raw: Vec<u8>,
        error: MalformedRecordError,
    },
}

fn process(annotator: &Annotator, line_number: u64, line: VcfLine) -> Processed {
    match line {
        VcfLine::Header(raw) => Processed::Header(raw),
        VcfLine::Record(record) => Processed::Annotated(Box::new(annotator.annotate(record))),
        VcfLine::Malformed { raw, error } => Processed::Malformed {
            line_number,
            raw,
            error,
        },
    }
}

/// Receives processed lines in input order and owns everything written.
struct Emitter {
    writer: VcfWriter,
    collection: AlleleCollection,
    summary: RunSummary,
    policy: MalformedPolicy,
    progress: Option<ProgressBar>,
}

impl Emitter {
    fn emit(&mut self, item: Processed) -> Result<()> {
        match item {
            Processed::Header(raw) => {
                self.summary.header_lines += 1;
                self.writer.write_header(&raw)?;
            }
            Processed::Annotated(annotated) => {
                self.summary.records += 1;
                if annotated.unresolved() > 0 {
                    self.summary.records_with_unresolved += 1;
                }
                self.summary.alleles_resolved += annotated.resolved() as u64;
                self.summary.alleles_unresolved += annotated.unresolved() as u64;
                self.summary.retries += annotated.retries;
                self.writer.write_line(&annotated.record.to_line())?;
                for allele in annotated.alleles {
                    self.collection.add(allele);
                }
                if let Some(progress) = &self.progress {
                    progress.inc(1);
                }
            }
            Processed::Malformed {
                line_number,
                raw,
                error,
            } => match self.policy {
                MalformedPolicy::Abort => {
                    return Err(AnnotateError::MalformedRecord {
                        line: line_number,
                        source: error,
                    });
                }
                MalformedPolicy::Skip => {
                    log::warn!("Skipping malformed record at line {}: {}", line_number, error);
                    self.summary.skipped += 1;
                    self.writer.write_raw(&raw)?;
                }
            },
        }
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send + 'static)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_owned()
}

fn thread_panicked(name: &str, payload: Box<dyn Any + Send + 'static>) -> AnnotateError {
    AnnotateError::Pipeline(format!(
        "{} thread panicked: {}",
        name,
        panic_message(payload.as_ref())
    ))
}

/// Write results in sequence order, returning a credit to the reader per line.
fn reorder(
    results: Receiver<(u64, Processed)>,
    credits: Sender<()>,
    emitter: &mut Emitter,
) -> Result<()> {
    let mut pending: BTreeMap<u64, Processed> = BTreeMap::new();
    let mut next = 0u64;
    for (seq, processed) in results {
        pending.insert(seq, processed);
        while let Some(processed) = pending.remove(&next) {
            emitter.emit(processed)?;
            next += 1;
            // fails only once the reader has finished
            let _ = credits.send(());
        }
    }
    if !pending.is_empty() {
        return Err(AnnotateError::Pipeline(format!(
            "{} lines after line {} were never written",
            pending.len(),
            next
        )));
    }
    Ok(())
}

/// Annotates a VCF file end to end.
pub struct Pipeline {
    annotator: Annotator,
    config: AnnotatorConfig,
    state: PipelineState,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl Pipeline {
    pub fn new<R: AlleleResolver + 'static>(resolver: R, config: AnnotatorConfig) -> Self {
        let resolver: Arc<dyn AlleleResolver> = Arc::new(resolver);
        let resolver: Arc<dyn AlleleResolver> = match config.resolver_timeout() {
            Some(timeout) => Arc::new(TimeoutResolver::new(resolver, timeout, config.threads)),
            None => resolver,
        };
        Self {
            annotator: Annotator::new(resolver, &config),
            config,
            state: PipelineState::Idle,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Tick `progress` once per data record written.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// A token that stops this pipeline's run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Annotate `input` into `output`, writing the resolved Alleles to
    /// `collection` when given.
    ///
    /// On error nothing is left at `output`, except when only the collection
    /// could not be written.
    pub fn run(
        &mut self,
        input: &Path,
        output: &Path,
        collection: Option<&Path>,
    ) -> Result<RunSummary> {
        let reader = match VcfReader::from_path(input) {
            Ok(reader) => reader,
            Err(e) => {
                self.state = PipelineState::Aborted;
                return Err(e.into());
            }
        };
        self.run_reader(reader, output, collection)
    }

    /// Like [`Pipeline::run`], reading from an already opened VCF.
    pub fn run_reader(
        &mut self,
        reader: VcfReader,
        output: &Path,
        collection: Option<&Path>,
    ) -> Result<RunSummary> {
        let result = self.execute(reader, output, collection);
        self.state = match result {
            Ok(_) => PipelineState::Done,
            Err(_) => PipelineState::Aborted,
        };
        result
    }

    fn execute(
        &mut self,
        reader: VcfReader,
        output: &Path,
        collection_path: Option<&Path>,
    ) -> Result<RunSummary> {
        if self.state != PipelineState::Idle {
            return Err(AnnotateError::Pipeline(format!(
                "pipeline already ran (state {:?})",
                self.state
            )));
        }
        self.config.validate()?;
        self.annotator.resolver().check_ready()?;

        let started = Instant::now();
        self.state = PipelineState::Streaming;
        log::info!(
            "Annotating into {} with {} thread(s)",
            output.display(),
            self.config.threads
        );

        let mut emitter = Emitter {
            writer: VcfWriter::create(output, &self.config)?,
            collection: AlleleCollection::new(),
            summary: RunSummary::default(),
            policy: self.config.malformed_policy,
            progress: self.progress.clone(),
        };
        if self.config.threads > 1 {
            self.stream_parallel(reader, &mut emitter)?;
        } else {
            self.stream_sequential(reader, &mut emitter)?;
        }
        if self.cancel.is_cancelled() {
            return Err(AnnotateError::Cancelled {
                records: emitter.summary.records,
            });
        }

        self.state = PipelineState::Flushing;
        let Emitter {
            writer,
            collection,
            mut summary,
            ..
        } = emitter;
        writer.finish()?;
        summary.distinct_alleles = collection.len() as u64;
        match collection_path {
            Some(path) => {
                collection.flush(path)?;
            }
            None => log::info!(
                "No allele collection requested; {} distinct alleles not persisted",
                summary.distinct_alleles
            ),
        }
        summary.elapsed = started.elapsed();
        log::info!(
            "Annotated {} records ({} alleles, {} unresolved, {} skipped lines)",
            summary.records,
            summary.alleles(),
            summary.alleles_unresolved,
            summary.skipped
        );
        Ok(summary)
    }

    fn stream_sequential(&self, reader: VcfReader, emitter: &mut Emitter) -> Result<()> {
        for item in reader {
            if self.cancel.is_cancelled() {
                break;
            }
            let (line_number, line) = item?;
            emitter.emit(process(&self.annotator, line_number, line))?;
        }
        Ok(())
    }

    fn stream_parallel(&self, reader: VcfReader, emitter: &mut Emitter) -> Result<()> {
        let threads = self.config.threads;
        let window = self.config.reorder_window;

        let (line_tx, line_rx) = bounded::<(u64, u64, VcfLine)>(threads * 2);
        let (result_tx, result_rx) = bounded::<(u64, Processed)>(window);
        let (credit_tx, credit_rx) = bounded::<()>(window);
        for _ in 0..window {
            credit_tx
                .send(())
                .map_err(|e| AnnotateError::Pipeline(e.to_string()))?;
        }

        let stop = AtomicBool::new(false);
        let annotator = &self.annotator;
        let cancel = &self.cancel;

        thread::scope(|scope| {
            let stop = &stop;
            let reader_thread = scope.spawn(move || -> Result<()> {
                log::debug!("Reader thread started.");
                for (seq, item) in (0u64..).zip(reader) {
                    if cancel.is_cancelled() || stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let (line_number, line) = item?;
                    if credit_rx.recv().is_err() || line_tx.send((seq, line_number, line)).is_err()
                    {
                        break;
                    }
                }
                log::debug!("Reader thread finished.");
                Ok(())
            });

            let workers: Vec<_> = (0..threads)
                .map(|_| {
                    let lines = line_rx.clone();
                    let results = result_tx.clone();
                    scope.spawn(move || {
                        for (seq, line_number, line) in lines {
                            let processed = process(annotator, line_number, line);
                            if results.send((seq, processed)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();
            drop(line_rx);
            drop(result_tx);

            let written = reorder(result_rx, credit_tx, emitter);
            if written.is_err() {
                stop.store(true, Ordering::Relaxed);
            }

            let joined: Vec<_> = workers.into_iter().map(|worker| worker.join()).collect();
            let read = reader_thread.join();
            if let Some(payload) = joined.into_iter().find_map(|joined| joined.err()) {
                return Err(thread_panicked("Worker", payload));
            }
            let read = read.map_err(|payload| thread_panicked("Reader", payload))?;
            written?;
            read
        })
    }
}
