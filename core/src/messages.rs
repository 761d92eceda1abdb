use std::{collections::VecDeque, fmt};

use glam::Vec3;

use crate::{ActorDef, PlayerDef};

/// Particle effects the simulation can request from the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// One-shot blood splatter emitted on every hit.
    Blood,
    /// Continuous flame emitted by wall torches.
    TorchFire,
}

impl ParticleKind {
    /// Name of the particle definition used by renderers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blood => "blood0",
            Self::TorchFire => "torchfire0",
        }
    }

    /// Reports whether the system emits a single burst rather than continuously.
    #[must_use]
    pub const fn is_one_shot(self) -> bool {
        matches!(self, Self::Blood)
    }
}

/// Fire-and-forget request to spawn a particle system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSpawn {
    /// Particle definition to instantiate.
    pub kind: ParticleKind,
    /// World-space emitter origin.
    pub position: Vec3,
    /// Emission direction.
    pub direction: Vec3,
}

/// Messages exchanged between the scene and its collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// A player joined the scene.
    PlayerAdded(PlayerDef),
    /// A batch of actors should be constructed and added to the scene.
    ActorsAdded(Vec<ActorDef>),
    /// A particle system should be spawned.
    ParticleSystemAdded(ParticleSpawn),
}

impl Message {
    /// Discriminant used to route the message to subscribers.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::PlayerAdded(_) => MessageKind::PlayerAdded,
            Self::ActorsAdded(_) => MessageKind::ActorsAdded,
            Self::ParticleSystemAdded(_) => MessageKind::ParticleSystemAdded,
        }
    }
}

/// Message discriminants subscribers register against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// See [`Message::PlayerAdded`].
    PlayerAdded,
    /// See [`Message::ActorsAdded`].
    ActorsAdded,
    /// See [`Message::ParticleSystemAdded`].
    ParticleSystemAdded,
}

impl MessageKind {
    const COUNT: usize = 3;

    const fn slot(self) -> usize {
        match self {
            Self::PlayerAdded => 0,
            Self::ActorsAdded => 1,
            Self::ParticleSystemAdded => 2,
        }
    }
}

type Subscriber = Box<dyn FnMut(&Message)>;

/// Synchronous publish/subscribe bus.
///
/// Posting only queues a message. [`MessageBus::dispatch`] delivers queued
/// messages in FIFO order, calling each kind's subscribers from the most
/// recently registered to the oldest, and hands the delivered batch back to
/// the host so it can route messages addressed to the scene itself.
pub struct MessageBus {
    subscribers: [Vec<Subscriber>; MessageKind::COUNT],
    queue: VecDeque<Message>,
}

impl MessageBus {
    /// Creates a bus without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: [Vec::new(), Vec::new(), Vec::new()],
            queue: VecDeque::new(),
        }
    }

    /// Registers a handler invoked for every dispatched message of `kind`.
    pub fn subscribe(&mut self, kind: MessageKind, handler: impl FnMut(&Message) + 'static) {
        self.subscribers[kind.slot()].push(Box::new(handler));
    }

    /// Queues a message for the next dispatch.
    pub fn post(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    /// Number of messages waiting for dispatch.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Iterator over queued messages without consuming them.
    pub fn iter_pending(&self) -> impl Iterator<Item = &Message> {
        self.queue.iter()
    }

    /// Delivers every queued message and returns them in delivery order.
    pub fn dispatch(&mut self) -> Vec<Message> {
        let delivered: Vec<Message> = self.queue.drain(..).collect();
        for message in &delivered {
            for handler in self.subscribers[message.kind().slot()].iter_mut().rev() {
                handler(message);
            }
        }
        delivered
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field(
                "subscribers",
                &self.subscribers.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .field("queue", &self.queue)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    fn blood() -> Message {
        Message::ParticleSystemAdded(ParticleSpawn {
            kind: ParticleKind::Blood,
            position: Vec3::ZERO,
            direction: Vec3::X,
        })
    }

    #[test]
    fn post_queues_until_dispatch() {
        let seen = Rc::new(RefCell::new(0));
        let mut bus = MessageBus::new();
        let counter = Rc::clone(&seen);
        bus.subscribe(MessageKind::ParticleSystemAdded, move |_| {
            *counter.borrow_mut() += 1;
        });

        bus.post(blood());
        assert_eq!(*seen.borrow(), 0);
        assert_eq!(bus.pending(), 1);

        let delivered = bus.dispatch();
        assert_eq!(delivered, vec![blood()]);
        assert_eq!(*seen.borrow(), 1);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn subscribers_run_newest_first_and_only_for_their_kind() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus = MessageBus::new();
        for label in ["first", "second"] {
            let order = Rc::clone(&order);
            bus.subscribe(MessageKind::ParticleSystemAdded, move |_| {
                order.borrow_mut().push(label);
            });
        }
        let untouched = Rc::clone(&order);
        bus.subscribe(MessageKind::ActorsAdded, move |_| {
            untouched.borrow_mut().push("actors");
        });

        bus.post(blood());
        let _ = bus.dispatch();

        assert_eq!(*order.borrow(), vec!["second", "first"]);
    }

    #[test]
    fn particle_kinds_name_their_definitions() {
        assert_eq!(ParticleKind::Blood.name(), "blood0");
        assert!(ParticleKind::Blood.is_one_shot());
        assert_eq!(ParticleKind::TorchFire.name(), "torchfire0");
        assert!(!ParticleKind::TorchFire.is_one_shot());
    }
}
