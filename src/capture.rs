//! Capture Controller collaborator.
//!
//! The link never owns the recorder. The host application implements
//! [`CaptureController`] and wires it to flags with [`recording_actions`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::constants::{START_FLAG, STOP_FLAG};
use crate::core::FlagError;
use crate::dispatch::{ActionTableBuilder, Flag};

/// A recorder that can be started and stopped remotely.
pub trait CaptureController: Send + Sync + 'static {
    /// Begin a recording session.
    fn start(&self);

    /// End the current recording session.
    fn stop(&self);

    /// Whether a session is in progress.
    fn is_recording(&self) -> bool;
}

/// Wire `start_flag` → start-if-idle and `stop_flag` → stop-if-recording.
///
/// Triggers that would not change the recorder's state are ignored.
pub fn recording_actions<C>(
    builder: &mut ActionTableBuilder,
    controller: Arc<C>,
    start_flag: Flag,
    stop_flag: Flag,
) where
    C: CaptureController + ?Sized,
{
    let starter = Arc::clone(&controller);
    builder.register(start_flag, move |_| {
        if starter.is_recording() {
            debug!("start trigger ignored, already recording");
        } else {
            info!("remote trigger: starting capture");
            starter.start();
        }
    });

    builder.register(stop_flag, move |_| {
        if controller.is_recording() {
            info!("remote trigger: stopping capture");
            controller.stop();
        } else {
            debug!("stop trigger ignored, not recording");
        }
    });
}

/// [`recording_actions`] with the standard `a` / `b` flags.
pub fn default_recording_actions<C>(
    builder: &mut ActionTableBuilder,
    controller: Arc<C>,
) -> Result<(), FlagError>
where
    C: CaptureController + ?Sized,
{
    recording_actions(
        builder,
        controller,
        Flag::new(START_FLAG)?,
        Flag::new(STOP_FLAG)?,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ActionTable;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRecorder {
        recording: AtomicBool,
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    impl CaptureController for FakeRecorder {
        fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.recording.store(true, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.recording.store(false, Ordering::SeqCst);
        }

        fn is_recording(&self) -> bool {
            self.recording.load(Ordering::SeqCst)
        }
    }

    fn table_for(recorder: &Arc<FakeRecorder>) -> ActionTable {
        let mut builder = ActionTable::builder();
        default_recording_actions(&mut builder, Arc::clone(recorder)).unwrap();
        builder.build()
    }

    #[test]
    fn test_start_then_stop() {
        let recorder = Arc::new(FakeRecorder::default());
        let table = table_for(&recorder);

        assert!(table.dispatch("a", "").handled);
        assert!(recorder.is_recording());

        assert!(table.dispatch("b", "").handled);
        assert!(!recorder.is_recording());

        assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_redundant_triggers_ignored() {
        let recorder = Arc::new(FakeRecorder::default());
        let table = table_for(&recorder);

        table.dispatch("b", "");
        assert_eq!(recorder.stops.load(Ordering::SeqCst), 0);

        table.dispatch("a", "");
        table.dispatch("a", "");
        assert_eq!(recorder.starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_flags() {
        let recorder = Arc::new(FakeRecorder::default());
        let mut builder = ActionTable::builder();
        recording_actions(
            &mut builder,
            Arc::clone(&recorder),
            Flag::new("rec").unwrap(),
            Flag::new("halt").unwrap(),
        );
        let table = builder.build();

        assert!(!table.dispatch("a", "").handled);
        table.dispatch("rec", "");
        assert!(recorder.is_recording());
        table.dispatch("halt", "");
        assert!(!recorder.is_recording());
    }
}
