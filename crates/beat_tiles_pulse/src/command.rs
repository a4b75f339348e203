//! Hand-off queue for requests produced off the frame thread
//!
//! Audio decoding or level streaming may run elsewhere; they send commands
//! here and the frame thread drains them before ticking.

use crate::{PlacementId, ProfileId};
use beat_tiles_core::TileId;
use crossbeam::channel::{unbounded, Receiver, Sender};

/// A request for the animator, applied at the start of a frame
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatorCommand {
    /// Register with an explicit profile at the beat current when drained
    Register {
        placement: PlacementId,
        profile: ProfileId,
    },
    /// Register a catalog tile at the beat current when drained
    RegisterTile { placement: PlacementId, tile: TileId },
    Retire(PlacementId),
    SetTempo(f64),
    /// Authoritative playback position in seconds
    SyncAudio(f64),
}

/// Producing end of the command queue; clone it to feed from several threads
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<AnimatorCommand>,
}

impl CommandSender {
    /// Queue a command. Returns false if the receiving end is gone.
    pub fn send(&self, command: AnimatorCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn register_tile(&self, placement: PlacementId, tile: TileId) -> bool {
        self.send(AnimatorCommand::RegisterTile { placement, tile })
    }

    pub fn retire(&self, placement: PlacementId) -> bool {
        self.send(AnimatorCommand::Retire(placement))
    }

    pub fn sync_audio(&self, position_secs: f64) -> bool {
        self.send(AnimatorCommand::SyncAudio(position_secs))
    }
}

/// Consuming end of the command queue, owned by the frame thread
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<AnimatorCommand>,
}

impl CommandReceiver {
    /// Take every command queued so far without blocking
    pub fn drain(&self) -> impl Iterator<Item = AnimatorCommand> + '_ {
        self.rx.try_iter()
    }

    /// Number of commands waiting to be drained
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a connected sender/receiver pair
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = unbounded();
    (CommandSender { tx }, CommandReceiver { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let (sender, receiver) = command_channel();
        let producer = std::thread::spawn(move || {
            sender.register_tile(PlacementId(1), TileId(18));
            sender.sync_audio(1.5);
            sender.retire(PlacementId(1));
        });
        producer.join().unwrap();

        let commands: Vec<_> = receiver.drain().collect();
        assert_eq!(
            commands,
            vec![
                AnimatorCommand::RegisterTile {
                    placement: PlacementId(1),
                    tile: TileId(18)
                },
                AnimatorCommand::SyncAudio(1.5),
                AnimatorCommand::Retire(PlacementId(1)),
            ]
        );
        assert_eq!(receiver.drain().count(), 0);
    }

    #[test]
    fn test_send_fails_after_receiver_dropped() {
        let (sender, receiver) = command_channel();
        drop(receiver);
        assert!(!sender.retire(PlacementId(3)));
    }

    #[test]
    fn test_cloned_senders_share_one_queue() {
        let (sender, receiver) = command_channel();
        let producers: Vec<_> = (0..4)
            .map(|i| {
                let sender = sender.clone();
                std::thread::spawn(move || {
                    assert!(sender.retire(PlacementId(i)));
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(receiver.len(), 4);
        let mut retired: Vec<_> = receiver
            .drain()
            .map(|command| match command {
                AnimatorCommand::Retire(placement) => placement.0,
                other => panic!("unexpected command {:?}", other),
            })
            .collect();
        retired.sort_unstable();
        assert_eq!(retired, vec![0, 1, 2, 3]);
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_receiver_can_be_shared_with_the_frame_thread() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<CommandSender>();
        assert_sync::<CommandReceiver>();
    }
}
