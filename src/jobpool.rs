//! Hand-rolled worker pool over a single `Mutex`-guarded task queue and
//! a `Condvar`, matching the original `Renderer`'s job-dispatch contract:
//! LIFO task pop (the most recently queued row range is likely still
//! hot in a worker's cache) and a halt flag for cooperative cancellation.
//! Workers run inside a `std::thread::scope`, so callers can hand out
//! tasks that borrow the scene and camera instead of needing `'static`
//! + `Arc` plumbing.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

pub type RowRange = (u32, u32);

struct Shared {
    tasks: Mutex<Vec<RowRange>>,
    queue_cv: Condvar,
    done_cv: Condvar,
    active: Mutex<usize>,
    halt: Mutex<bool>,
}

/// Runs `render_rows(worker_id, y0, y1)` across `num_jobs` worker
/// threads for every range in `ranges`, blocking until the queue drains.
/// `render_rows` must be `Sync` since every worker calls it concurrently.
pub fn run_scoped<F>(num_jobs: usize, ranges: Vec<RowRange>, render_rows: F)
where
    F: Fn(usize, u32, u32) + Sync,
{
    let shared = Shared {
        tasks: Mutex::new(ranges),
        queue_cv: Condvar::new(),
        done_cv: Condvar::new(),
        active: Mutex::new(0),
        halt: Mutex::new(false),
    };

    std::thread::scope(|scope| {
        for worker_id in 0..num_jobs.max(1) {
            let shared = &shared;
            let render_rows = &render_rows;
            scope.spawn(move || job_main(shared, worker_id, render_rows));
        }

        let guard = shared.active.lock().unwrap();
        let _ = shared
            .done_cv
            .wait_timeout_while(guard, Duration::from_secs(3600), |&mut active| {
                active > 0 || !shared.tasks.lock().unwrap().is_empty()
            })
            .unwrap();

        *shared.halt.lock().unwrap() = true;
        shared.queue_cv.notify_all();
    });
}

fn job_main<F>(shared: &Shared, worker_id: usize, render_rows: &F)
where
    F: Fn(usize, u32, u32),
{
    loop {
        let task = {
            let mut tasks = shared.tasks.lock().unwrap();
            loop {
                if let Some(task) = tasks.pop() {
                    break Some(task);
                }
                if *shared.halt.lock().unwrap() {
                    break None;
                }
                tasks = shared.queue_cv.wait(tasks).unwrap();
            }
        };
        let Some((y0, y1)) = task else { break };

        *shared.active.lock().unwrap() += 1;
        render_rows(worker_id, y0, y1);
        let mut active = shared.active.lock().unwrap();
        *active -= 1;
        if *active == 0 && shared.tasks.lock().unwrap().is_empty() {
            shared.done_cv.notify_all();
        }
    }
}

/// Splits `height` rows into `max(jobs, 4) * 20` roughly equal chunks of
/// between 1 and 16 rows each, matching the original's task granularity.
pub fn partition_rows(height: u32, jobs: usize) -> Vec<RowRange> {
    let num = (jobs.max(4) * 20) as u32;
    let inc_y = (height / num.max(1)).clamp(1, 16);
    let mut out = Vec::new();
    let mut y = 0;
    while y < height {
        let y1 = (y + inc_y).min(height);
        out.push((y, y1));
        y = y1;
    }
    out
}
