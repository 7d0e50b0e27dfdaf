//! # Queue Scenarios
//!
//! Producers enqueue, processors dequeue and acknowledge, and stuck events
//! come back after the processing timeout.

#[cfg(test)]
mod tests {
    use super::super::harness::{boot, boot_with, next_event, ADMIN, START_MS};
    use ark_04_event_queue::{EventQueueApi, QueueError, SYSTEM_QUEUE_ID};
    use kernel_runtime::KernelConfig;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use shared_bus::{EventFilter, EventTopic, KernelEvent};
    use shared_types::entities::{Address, EventTypeId};
    use std::collections::HashSet;

    const OWNER: Address = Address::from_low_u16(0x0A);
    const WORKER: Address = Address::from_low_u16(0x0B);
    const PRODUCER: Address = Address::from_low_u16(0x0C);
    const TIMEOUT_MS: u64 = 10_000;

    fn job() -> EventTypeId {
        EventTypeId::of_name("JOB")
    }

    #[tokio::test]
    async fn test_bounded_queue_scenario() {
        let kernel = boot();
        let queues = &kernel.container.queues;

        let q = queues
            .create_queue(OWNER, "jobs".to_string(), 2, TIMEOUT_MS)
            .await
            .unwrap();
        queues.add_processor(OWNER, q, WORKER).await.unwrap();

        assert_eq!(queues.enqueue_event_to_queue(PRODUCER, q, job(), b"a".to_vec()).await, Ok(0));
        assert_eq!(queues.enqueue_event_to_queue(PRODUCER, q, job(), b"b".to_vec()).await, Ok(1));
        assert_eq!(
            queues.enqueue_event_to_queue(PRODUCER, q, job(), b"c".to_vec()).await,
            Err(QueueError::QueueFull {
                queue_id: q,
                max_size: 2
            })
        );

        let first = queues.dequeue_event(WORKER, q).await.unwrap();
        assert_eq!(first.id, 0);
        assert_eq!(first.payload, b"a".to_vec());
        queues.mark_event_processed(WORKER, q, first.id).await.unwrap();
        assert_eq!(queues.get_queue_length(q).await.unwrap(), 1);

        assert_eq!(queues.enqueue_event_to_queue(PRODUCER, q, job(), b"c".to_vec()).await, Ok(2));
    }

    #[tokio::test]
    async fn test_stuck_event_is_reclaimed_by_another_worker() {
        let kernel = boot();
        let queues = &kernel.container.queues;
        let backup = Address::from_low_u16(0x0D);

        let q = queues
            .create_queue(OWNER, "jobs".to_string(), 4, TIMEOUT_MS)
            .await
            .unwrap();
        queues.add_processor(OWNER, q, WORKER).await.unwrap();
        queues.add_processor(OWNER, q, backup).await.unwrap();
        queues.enqueue_event_to_queue(PRODUCER, q, job(), vec![]).await.unwrap();

        let mut sub = kernel.subscribe(EventFilter::topics(vec![EventTopic::EventQueue]));

        queues.dequeue_event(WORKER, q).await.unwrap();
        assert_eq!(queues.dequeue_event(backup, q).await, Err(QueueError::QueueEmpty(q)));

        kernel.clock.advance(TIMEOUT_MS);
        let reclaimed = queues.dequeue_event(backup, q).await.unwrap();
        assert_eq!(reclaimed.id, 0);
        assert_eq!(reclaimed.processor, Some(backup));
        assert_eq!(reclaimed.processing_started_at, Some(START_MS + TIMEOUT_MS));
        assert_eq!(reclaimed.attempts, 2);

        assert_eq!(
            next_event(&mut sub).await,
            KernelEvent::EventDequeued {
                queue_id: q,
                event_id: 0,
                processor: WORKER
            }
        );
        assert_eq!(
            next_event(&mut sub).await,
            KernelEvent::EventReclaimed {
                queue_id: q,
                event_id: 0,
                processor: backup
            }
        );
    }

    #[tokio::test]
    async fn test_processed_event_never_returns() {
        let kernel = boot();
        let queues = &kernel.container.queues;
        queues.enqueue_event(PRODUCER, job(), vec![1]).await.unwrap();
        queues.enqueue_event(PRODUCER, job(), vec![2]).await.unwrap();

        let first = queues.dequeue_event(ADMIN, SYSTEM_QUEUE_ID).await.unwrap();
        queues
            .mark_event_processed(ADMIN, SYSTEM_QUEUE_ID, first.id)
            .await
            .unwrap();

        for _ in 0..3 {
            kernel.clock.advance(kernel.container.config.queue.processing_timeout_ms);
            let next = queues.get_next_event(SYSTEM_QUEUE_ID).await.unwrap();
            assert_ne!(next.id, first.id);
        }
    }

    #[tokio::test]
    async fn test_system_queue_from_config() {
        let mut config = KernelConfig::for_admin(ADMIN);
        config.queue.system_queue_size = 1;
        config.queue.system_owner = Some(OWNER);
        let kernel = boot_with(config);
        let queues = &kernel.container.queues;

        let system = queues.get_queue(SYSTEM_QUEUE_ID).await.unwrap();
        assert_eq!(system.owner, OWNER);

        queues.enqueue_event(PRODUCER, job(), vec![]).await.unwrap();
        assert!(matches!(
            queues.enqueue_event(PRODUCER, job(), vec![]).await,
            Err(QueueError::QueueFull { .. })
        ));
        assert_eq!(
            queues.delete_queue(OWNER, SYSTEM_QUEUE_ID).await,
            Err(QueueError::SystemQueueProtected)
        );
    }

    #[tokio::test]
    async fn test_length_tracks_random_workload() {
        let kernel = boot();
        let queues = &kernel.container.queues;
        let q = queues
            .create_queue(OWNER, "load".to_string(), 16, TIMEOUT_MS)
            .await
            .unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let mut live: HashSet<u64> = HashSet::new();
        let mut processing: Vec<u64> = Vec::new();

        for _ in 0..400 {
            match rng.gen_range(0..3) {
                0 => {
                    if let Ok(id) = queues.enqueue_event_to_queue(PRODUCER, q, job(), vec![]).await {
                        assert!(live.insert(id), "event id {id} reused");
                    }
                }
                1 => {
                    if let Ok(event) = queues.dequeue_event(OWNER, q).await {
                        processing.push(event.id);
                    }
                }
                _ => {
                    if let Some(id) = processing.pop() {
                        queues.mark_event_processed(OWNER, q, id).await.unwrap();
                        live.remove(&id);
                    }
                }
            }
            assert_eq!(queues.get_queue_length(q).await.unwrap(), live.len());
            assert!(live.len() <= 16);
        }
    }
}
