//! # Observer Scenarios
//!
//! What an outside observer sees on the bus and in the metrics registry
//! while several callers drive the kernel at once.

#[cfg(test)]
mod tests {
    use super::super::harness::{boot, boot_recording, take_events};
    use ark_04_event_queue::{EventQueueApi, SYSTEM_QUEUE_ID};
    use ark_telemetry::{encode_metrics, QUEUE_DEPTH};
    use shared_bus::{EventFilter, EventTopic, KernelEvent};
    use shared_types::entities::{Address, EventTypeId};
    use std::time::Duration;

    const OWNER: Address = Address::from_low_u16(0x0A);
    const WORKER: Address = Address::from_low_u16(0x0B);

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stream_sees_enqueues_in_commit_order() {
        let kernel = boot();
        let mut stream = kernel.stream(EventFilter::topics(vec![EventTopic::EventQueue]));

        let mut producers = Vec::new();
        for n in 0..4u16 {
            let queues = kernel.container.queues.clone();
            producers.push(tokio::spawn(async move {
                let producer = Address::from_low_u16(0x100 + n);
                for _ in 0..10 {
                    queues
                        .enqueue_event_to_queue(producer, SYSTEM_QUEUE_ID, EventTypeId::of_name("TICK"), Vec::new())
                        .await
                        .unwrap();
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        let ids: Vec<u64> = take_events(&mut stream, 40)
            .await
            .into_iter()
            .map(|event| match event {
                KernelEvent::EventEnqueued { event_id, .. } => event_id,
                other => panic!("unexpected {}", other.name()),
            })
            .collect();
        assert_eq!(ids, (0..40).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_recorder_tracks_queue_depth() {
        let kernel = boot_recording();
        let queues = &kernel.container.queues;
        let mut stream = kernel.stream(EventFilter::topics(vec![EventTopic::EventQueue]));

        let q = queues
            .create_queue(OWNER, "metered".to_string(), 8, 10_000)
            .await
            .unwrap();
        queues.add_processor(OWNER, q, WORKER).await.unwrap();
        for _ in 0..3 {
            queues
                .enqueue_event_to_queue(OWNER, q, EventTypeId::of_name("JOB"), Vec::new())
                .await
                .unwrap();
        }
        let first = queues.dequeue_event(WORKER, q).await.unwrap();
        queues.mark_event_processed(WORKER, q, first.id).await.unwrap();

        // created, processor added, 3 enqueued, dequeued, processed
        take_events(&mut stream, 7).await;

        let label = q.to_string();
        let mut depth = 0.0;
        for _ in 0..50 {
            depth = QUEUE_DEPTH.with_label_values(&[&label]).get();
            if depth == 2.0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(depth, 2.0);

        let text = encode_metrics().unwrap();
        assert!(text.contains("ark_queue_depth"));
        assert!(text.contains("ark_queue_events_total"));

        kernel.container.shutdown();
    }
}
