//! The seam between the pipeline and whatever turns alleles into VRS Alleles.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use vats_vrs::{Allele, Translator};

use crate::error::{AnnotateError, ResolutionFailure};
use crate::record::AlleleDescription;

/// Resolves one VCF allele to an identified VRS Allele.
///
/// Implementations are shared between worker threads.
pub trait AlleleResolver: Send + Sync {
    fn resolve(&self, allele: &AlleleDescription) -> Result<Allele, ResolutionFailure>;

    /// Fail before the run starts when the resolver cannot work at all.
    fn check_ready(&self) -> Result<(), AnnotateError> {
        Ok(())
    }
}

impl<R: AlleleResolver + ?Sized> AlleleResolver for Arc<R> {
    fn resolve(&self, allele: &AlleleDescription) -> Result<Allele, ResolutionFailure> {
        (**self).resolve(allele)
    }

    fn check_ready(&self) -> Result<(), AnnotateError> {
        (**self).check_ready()
    }
}

impl AlleleResolver for Translator {
    fn resolve(&self, allele: &AlleleDescription) -> Result<Allele, ResolutionFailure> {
        // an in-memory store answers every lookup, so failures never go away
        self.translate_vcf(&allele.chrom, allele.pos, &allele.reference, &allele.alternate)
            .map_err(ResolutionFailure::permanent)
    }

    fn check_ready(&self) -> Result<(), AnnotateError> {
        Translator::check_ready(self).map_err(|e| AnnotateError::Configuration(e.to_string()))
    }
}

type Reply = Sender<Result<Allele, ResolutionFailure>>;

/// A queued call. Workers drop it unanswered once `deadline` has passed.
struct Job {
    allele: AlleleDescription,
    deadline: Instant,
    reply: Reply,
}

/// Bounds every call of an inner resolver.
///
/// Calls run on a fixed set of long-lived worker threads fed through a
/// bounded queue. A call that misses the deadline is reported as a transient
/// failure and its eventual result is dropped. At most `workers` calls run
/// and `workers` more wait at any time; once both are taken, further calls
/// fail as transient when their deadline passes without a free slot.
pub struct TimeoutResolver<R: ?Sized> {
    inner: Arc<R>,
    timeout: Duration,
    jobs: Sender<Job>,
    workers: usize,
}

impl<R: AlleleResolver + ?Sized + 'static> TimeoutResolver<R> {
    pub fn new(inner: Arc<R>, timeout: Duration, workers: usize) -> Self {
        let (jobs, queue) = bounded::<Job>(workers.max(1));
        let mut started = 0;
        for i in 0..workers.max(1) {
            let worker_inner = Arc::clone(&inner);
            let queue = queue.clone();
            let spawned = thread::Builder::new()
                .name(format!("vats-resolve-{}", i))
                .spawn(move || serve(worker_inner.as_ref(), queue));
            match spawned {
                Ok(_) => started += 1,
                Err(e) => log::warn!("Could not start resolver worker {}: {}", i, e),
            }
        }
        Self {
            inner,
            timeout,
            jobs,
            workers: started,
        }
    }

    fn timed_out(&self) -> ResolutionFailure {
        ResolutionFailure::transient(format!(
            "resolver did not answer within {} ms",
            self.timeout.as_millis()
        ))
    }
}

/// Worker loop; ends when the owning [`TimeoutResolver`] is dropped.
fn serve<R: AlleleResolver + ?Sized>(inner: &R, queue: Receiver<Job>) {
    for job in queue {
        if Instant::now() >= job.deadline {
            continue;
        }
        // the caller may have given up already
        let _ = job.reply.send(inner.resolve(&job.allele));
    }
}

impl<R: AlleleResolver + ?Sized + 'static> AlleleResolver for TimeoutResolver<R> {
    fn resolve(&self, allele: &AlleleDescription) -> Result<Allele, ResolutionFailure> {
        let deadline = Instant::now() + self.timeout;
        let (reply, answer) = bounded(1);
        let job = Job {
            allele: allele.clone(),
            deadline,
            reply,
        };
        match self.jobs.send_deadline(job, deadline) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(_)) => return Err(self.timed_out()),
            Err(SendTimeoutError::Disconnected(_)) => {
                return Err(ResolutionFailure::transient("resolver workers have stopped"));
            }
        }

        match answer.recv_deadline(deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out()),
            Err(RecvTimeoutError::Disconnected) => Err(ResolutionFailure::transient(
                "resolver worker exited without a result",
            )),
        }
    }

    fn check_ready(&self) -> Result<(), AnnotateError> {
        if self.workers == 0 {
            return Err(AnnotateError::Configuration(
                "no resolver worker threads could be started".to_string(),
            ));
        }
        self.inner.check_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use rstest::*;
    use vats_refget::SequenceStore;

    use crate::error::FailureKind;

    #[fixture]
    fn translator() -> Translator {
        let mut store = SequenceStore::in_memory();
        store
            .add_sequence("chr1", None, b"TACGTAAAAGCGTACGTACG".to_vec())
            .unwrap();
        Translator::new(Arc::new(store))
    }

    fn describe(chrom: &str, pos: u64, reference: &str, alternate: &str) -> AlleleDescription {
        AlleleDescription {
            chrom: chrom.to_string(),
            pos,
            reference: reference.to_string(),
            alternate: alternate.to_string(),
        }
    }

    struct Slow {
        delay: Duration,
        started: AtomicUsize,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Slow {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                started: AtomicUsize::new(0),
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl AlleleResolver for Slow {
        fn resolve(&self, _: &AlleleDescription) -> Result<Allele, ResolutionFailure> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Allele::literal("SQ.x", 0, 1, "A").identify())
        }
    }

    #[rstest]
    fn test_translator_resolves(translator: Translator) {
        let allele = translator.resolve(&describe("1", 2, "A", "G")).unwrap();
        assert_eq!(allele.location.start, 1);
        assert!(allele.id.unwrap().starts_with("ga4gh:VA."));
    }

    #[rstest]
    #[case(describe("chrUn", 2, "A", "G"))]
    #[case(describe("chr1", 2, "C", "G"))]
    #[case(describe("chr1", 2, "A", "<DEL>"))]
    #[case(describe("chr1", 2, "A", "*"))]
    fn test_translator_failures_are_permanent(translator: Translator, #[case] allele: AlleleDescription) {
        let failure = translator.resolve(&allele).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Permanent);
    }

    #[rstest]
    fn test_empty_store_not_ready() {
        let translator = Translator::new(Arc::new(SequenceStore::in_memory()));
        let result = AlleleResolver::check_ready(&translator);
        assert!(matches!(result, Err(AnnotateError::Configuration(_))));
    }

    #[rstest]
    fn test_timeout_is_transient() {
        let slow = Arc::new(Slow::new(Duration::from_millis(500)));
        let resolver = TimeoutResolver::new(slow, Duration::from_millis(10), 1);
        let failure = resolver.resolve(&describe("1", 1, "A", "G")).unwrap_err();
        assert!(failure.is_transient());
    }

    #[rstest]
    fn test_fast_call_passes_through() {
        let resolver = TimeoutResolver::new(Arc::new(Slow::new(Duration::ZERO)), Duration::from_secs(5), 2);
        for _ in 0..10 {
            assert!(resolver.resolve(&describe("1", 1, "A", "G")).is_ok());
        }
    }

    #[rstest]
    fn test_hung_calls_stay_bounded() {
        let slow = Arc::new(Slow::new(Duration::from_millis(300)));
        let resolver = TimeoutResolver::new(Arc::clone(&slow), Duration::from_millis(5), 2);

        for _ in 0..20 {
            let failure = resolver.resolve(&describe("1", 1, "A", "G")).unwrap_err();
            assert!(failure.is_transient());
        }
        thread::sleep(Duration::from_millis(700));

        // two running, at most two queued behind them
        assert!(slow.peak.load(Ordering::SeqCst) <= 2);
        assert!(slow.started.load(Ordering::SeqCst) <= 4);
    }
}
