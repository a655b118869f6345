use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// One input file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Name relative to the batch directory.
    pub file_name: String,
    pub claimed: bool,
}

impl FileTask {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            claimed: false,
        }
    }
}

/// Task list shared by all workers of a batch.
///
/// Every task is handed out at most once. Tasks are never removed or
/// reordered, and the claimed flag only goes from `false` to `true`.
#[derive(Debug, Default)]
pub struct WorkQueue {
    tasks: Mutex<Vec<FileTask>>,
}

impl WorkQueue {
    pub fn new<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tasks: Mutex::new(file_names.into_iter().map(FileTask::new).collect()),
        }
    }

    /// Claims the first unclaimed task in list order.
    ///
    /// Returns `None` once every task has been handed out.
    pub fn claim_next(&self) -> Option<FileTask> {
        let mut tasks = self.lock();
        let task = tasks.iter_mut().find(|task| !task.claimed)?;
        task.claimed = true;
        Some(task.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.lock().iter().filter(|task| !task.claimed).count()
    }

    /// A worker that panicked never holds the lock across a partial update,
    /// so a poisoned list is still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<FileTask>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A directory and the queue of files to convert inside it.
#[derive(Debug)]
pub struct WorkBatch {
    pub target_dir: PathBuf,
    pub queue: WorkQueue,
}

impl WorkBatch {
    pub fn new<I, S>(target_dir: impl Into<PathBuf>, file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target_dir: target_dir.into(),
            queue: WorkQueue::new(file_names),
        }
    }

    /// Full path of a task's input.
    pub fn input_path(&self, task: &FileTask) -> PathBuf {
        self.target_dir.join(&task.file_name)
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn claims_in_list_order() {
        let queue = WorkQueue::new(["a.wav", "b.wav", "c.wav"]);

        let names: Vec<_> = std::iter::from_fn(|| queue.claim_next())
            .map(|task| task.file_name)
            .collect();
        assert_eq!(names, ["a.wav", "b.wav", "c.wav"]);
        assert_eq!(queue.remaining(), 0);
        assert_eq!(queue.len(), 3);
        assert!(queue.claim_next().is_none());
    }

    #[test]
    fn empty_queue() {
        let queue = WorkQueue::new(Vec::<String>::new());
        assert!(queue.is_empty());
        assert!(queue.claim_next().is_none());
    }

    #[test]
    fn every_task_claimed_exactly_once() {
        const TASKS: usize = 500;
        const WORKERS: usize = 8;

        let batch = Arc::new(WorkBatch::new(
            "/music",
            (0..TASKS).map(|i| format!("{i}.wav")),
        ));
        let counts: Arc<Vec<AtomicUsize>> =
            Arc::new((0..TASKS).map(|_| AtomicUsize::new(0)).collect());

        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let batch = Arc::clone(&batch);
                let counts = Arc::clone(&counts);
                thread::spawn(move || {
                    while let Some(task) = batch.queue.claim_next() {
                        assert!(task.claimed);
                        let index: usize = task.file_name.trim_end_matches(".wav").parse().unwrap();
                        counts[index].fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(counts.iter().all(|count| count.load(Ordering::SeqCst) == 1));
        assert_eq!(batch.queue.remaining(), 0);
    }

    #[test]
    fn input_path_joins_directory() {
        let batch = WorkBatch::new("/music", ["song.wav"]);
        let task = batch.queue.claim_next().unwrap();
        assert_eq!(batch.input_path(&task), Path::new("/music/song.wav"));
        assert_eq!(batch.target_dir(), Path::new("/music"));
    }

    #[test]
    fn survives_poisoned_lock() {
        let queue = Arc::new(WorkQueue::new(["a.wav", "b.wav"]));
        let poisoner = Arc::clone(&queue);
        let _ = thread::spawn(move || {
            let _guard = poisoner.tasks.lock().unwrap();
            panic!("worker died");
        })
        .join();

        assert_eq!(queue.claim_next().unwrap().file_name, "a.wav");
        assert_eq!(queue.remaining(), 1);
    }
}
