#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Actor AI and the registry constructing actors from spawn announcements.

mod trash;

use std::{collections::HashMap, fmt, sync::Arc};

use crypt_crawler_core::{ActorDef, CrawlerError};
use crypt_crawler_world::{Actor, ActorSpawner, ArmatureAnimations};
use tracing::info;

pub use trash::{AggressiveTrash, TrashTuning};

/// Type tag of the crab enemy scattered by the level populator.
pub const CRABBY: &str = "crabby";

type Constructor = Box<dyn Fn(&ActorDef) -> Box<dyn Actor>>;

/// Registry mapping actor type tags to constructors.
#[derive(Default)]
pub struct ActorFactory {
    constructors: HashMap<String, Constructor>,
}

impl ActorFactory {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in enemy type.
    pub fn with_default_types(
        tuning: TrashTuning,
        animations: Arc<ArmatureAnimations>,
    ) -> Result<Self, CrawlerError> {
        let mut factory = Self::new();
        factory.register(CRABBY, move |def| {
            Box::new(AggressiveTrash::new(def, tuning, Arc::clone(&animations)))
        })?;
        info!(types = factory.constructors.len(), "actor_factory_ready");
        Ok(factory)
    }

    /// Registers `constructor` under `kind`. Each tag can be registered once.
    pub fn register(
        &mut self,
        kind: &str,
        constructor: impl Fn(&ActorDef) -> Box<dyn Actor> + 'static,
    ) -> Result<(), CrawlerError> {
        if self.constructors.contains_key(kind) {
            return Err(CrawlerError::DuplicateActorType(kind.to_owned()));
        }
        let _ = self
            .constructors
            .insert(kind.to_owned(), Box::new(constructor));
        Ok(())
    }

    /// Reports whether `kind` has a constructor.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Fails on the first tag in `required` without a constructor.
    pub fn validate<'a>(
        &self,
        required: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), CrawlerError> {
        for kind in required {
            if !self.contains(kind) {
                return Err(CrawlerError::UnknownActorType(kind.to_owned()));
            }
        }
        Ok(())
    }
}

impl ActorSpawner for ActorFactory {
    fn spawn(&self, def: &ActorDef) -> Result<Box<dyn Actor>, CrawlerError> {
        let constructor = self
            .constructors
            .get(&def.kind)
            .ok_or_else(|| CrawlerError::UnknownActorType(def.kind.clone()))?;
        Ok(constructor(def))
    }
}

impl fmt::Debug for ActorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ActorFactory").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypt_crawler_core::ActorState;
    use glam::Vec3;

    fn def(kind: &str) -> ActorDef {
        ActorDef {
            kind: kind.into(),
            position: Vec3::new(16.0, 0.0, 16.0),
            angle: 1.0,
            state: ActorState::Idle,
        }
    }

    fn factory() -> ActorFactory {
        ActorFactory::with_default_types(
            TrashTuning::default(),
            Arc::new(ArmatureAnimations::default()),
        )
        .expect("factory")
    }

    #[test]
    fn registered_types_spawn_from_their_definition() {
        let actor = factory().spawn(&def(CRABBY)).expect("crabby");
        assert_eq!(actor.kind(), CRABBY);
        assert_eq!(actor.body().position, Vec3::new(16.0, 0.0, 16.0));
        assert_eq!(actor.body().angle, 1.0);
        assert_eq!(actor.radius(), 8.0);
    }

    #[test]
    fn unknown_types_are_reported() {
        let factory = factory();
        assert_eq!(
            factory.spawn(&def("lich")).map(|_| ()),
            Err(CrawlerError::UnknownActorType("lich".into()))
        );
        assert_eq!(
            factory.validate([CRABBY, "lich"]),
            Err(CrawlerError::UnknownActorType("lich".into()))
        );
        assert_eq!(factory.validate([CRABBY]), Ok(()));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut factory = factory();
        let result = factory.register(CRABBY, |def| {
            Box::new(AggressiveTrash::new(
                def,
                TrashTuning::default(),
                Arc::new(ArmatureAnimations::default()),
            ))
        });
        assert_eq!(
            result,
            Err(CrawlerError::DuplicateActorType(CRABBY.into()))
        );
    }
}
