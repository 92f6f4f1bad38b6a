use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct RecordingSource {
    started: AtomicUsize,
}

#[async_trait]
impl InputSource for RecordingSource {
    fn name(&self) -> &str {
        "recording"
    }

    async fn initialize(&self, _config: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    async fn start(&self, callback: InputEventCallback) -> anyhow::Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        callback(InputEvent {
            event_type: InputEventType::Created,
            resource_spec: serde_json::json!({"k": "v"}),
        });
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn start_invokes_callback_with_observed_event() {
    let source = RecordingSource {
        started: AtomicUsize::new(0),
    };
    let seen: Arc<std::sync::Mutex<Vec<InputEventType>>> = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let callback: InputEventCallback = Arc::new(move |event| {
        seen_clone.lock().unwrap().push(event.event_type);
    });

    source.start(callback).await.unwrap();

    assert_eq!(source.started.load(Ordering::SeqCst), 1);
    assert_eq!(seen.lock().unwrap().as_slice(), &[InputEventType::Created]);
}
