use std::sync::Arc;

use cardio_core::reading::{Reading, VitalType};
use cardio_store::{ActiveAlertRegistry, TimeSeriesStore};

// ---------------------------------------------------------------------------
// TimeSeriesStore
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_are_not_lost() {
    let store = Arc::new(TimeSeriesStore::new());
    let mut tasks = Vec::new();

    for patient_id in 1..=8 {
        for vital in [VitalType::HeartRate, VitalType::Saturation, VitalType::Ecg] {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                for ts in 0..250 {
                    store.append(Reading::new(patient_id, vital, 1.0, ts));
                    tokio::task::yield_now().await;
                }
            }));
        }
    }

    let reader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            for _ in 0..200 {
                for patient_id in store.list_patients() {
                    let readings = store.query(patient_id, 0, i64::MAX);
                    assert!(readings.iter().all(|r| r.patient_id == patient_id));
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for task in tasks {
        task.await.expect("append task panicked");
    }
    reader.await.expect("reader task panicked");

    assert_eq!(store.list_patients().len(), 8);
    for patient_id in 1..=8 {
        assert_eq!(store.reading_count(patient_id), 3 * 250);
        assert_eq!(store.query(patient_id, 100, 199).len(), 3 * 100);
    }
}

// ---------------------------------------------------------------------------
// ActiveAlertRegistry
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_acknowledge_emits_each_trigger_once() {
    let registry = Arc::new(ActiveAlertRegistry::new(1..=4));
    for patient_id in 1..=4 {
        registry.mark_triggered(patient_id, 10).expect("registered");
    }

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            (1..=4).filter(|id| registry.acknowledge(*id).is_some()).count()
        }));
    }

    let mut total = 0;
    for task in tasks {
        total += task.await.expect("acknowledge task panicked");
    }
    assert_eq!(total, 4);
}
