use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vdtrack_core::Thing;

use super::{ThingRegistry, register_defaults};

#[derive(Debug, thiserror::Error)]
pub enum InMemoryError {
    #[error("not found")]
    NotFound,
}

/// In-memory registry. Reference implementation of the trait; things do not
/// survive a restart.
#[derive(Default)]
pub struct InMemoryThingRegistry {
    pub things: RwLock<HashMap<Box<str>, Thing>>,
}

impl InMemoryThingRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThingRegistry for InMemoryThingRegistry {
    type Error = InMemoryError;

    async fn find_or_register(&self, device_id: &str) -> Result<Thing, Self::Error> {
        let mut things = self.things.write().await;
        let thing = things
            .entry(device_id.into())
            .or_insert_with(|| register_defaults(device_id));

        Ok(thing.clone())
    }

    async fn get(&self, device_id: &str) -> Result<Option<Thing>, Self::Error> {
        let things = self.things.read().await;
        Ok(things.get(device_id).cloned())
    }

    async fn update(&self, device_id: &str, new: Thing) -> Result<(), Self::Error> {
        let mut things = self.things.write().await;
        match things.get_mut(device_id) {
            Some(slot) => {
                *slot = new;
                Ok(())
            }
            None => Err(InMemoryError::NotFound),
        }
    }
}
