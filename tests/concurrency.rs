use meshwire::prelude::*;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Pool {
    size: usize,
}

struct Gateway {
    pool: Arc<Pool>,
}

fn container(builds: &Arc<AtomicUsize>) -> Container {
    let counter = Arc::clone(builds);
    Container::builder()
        .provide(provide(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
            Pool { size: 8 }
        }))
        .provide(provide(|pool: Arc<Pool>| Gateway { pool }))
        .build()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolution_from_tasks() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = Arc::new(container(&builds));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let container = Arc::clone(&container);
            tokio::task::spawn_blocking(move || {
                if i % 2 == 0 {
                    container.resolve::<Gateway>().unwrap().pool.clone()
                } else {
                    container.resolve::<Pool>().unwrap()
                }
            })
        })
        .collect();

    let mut pools = Vec::new();
    for handle in handles {
        pools.push(handle.await.unwrap());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(pools.iter().all(|pool| Arc::ptr_eq(pool, &pools[0])));
    assert_eq!(pools[0].size, 8);
}

#[test]
fn test_parallel_populate() {
    let builds = Arc::new(AtomicUsize::new(0));
    let container = container(&builds);

    let gateways: Vec<Arc<Gateway>> = (0..64)
        .into_par_iter()
        .map(|_| {
            let mut slot = None;
            container.populate(&mut slot).unwrap();
            slot.unwrap()
        })
        .collect();

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(
        gateways
            .iter()
            .all(|gateway| Arc::ptr_eq(&gateway.pool, &gateways[0].pool))
    );
}

#[test]
fn test_failed_build_retried_concurrently() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let container = Container::builder()
        .provide(try_provide(move || -> anyhow::Result<Pool> {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("pool exhausted");
            }
            Ok(Pool { size: 4 })
        }))
        .build()
        .unwrap();

    assert!(matches!(
        container.resolve::<Pool>(),
        Err(MeshwireError::ConstructionFailed { .. })
    ));

    let sizes: Vec<usize> = (0..16)
        .into_par_iter()
        .map(|_| container.resolve::<Pool>().unwrap().size)
        .collect();

    assert!(sizes.iter().all(|&size| size == 4));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
