//! Utilities for exercising holders in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Entity;

static INSTANCE_COUNT: AtomicUsize = AtomicUsize::new(0);

/// Generate an instance ID which is unique within the process.
pub fn gen_instance_id() -> String {
    format!("instance-{}", INSTANCE_COUNT.fetch_add(1, Ordering::SeqCst))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Starting,
    Up,
    Down,
}

/// A minimal registered instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    id: String,
    status: Status,
    version: u32,
}

impl Instance {

    pub fn new(id: &str, status: Status) -> Instance {
        Instance { id: id.to_string(), status, version: 0 }
    }

    pub fn with_status(&self, status: Status) -> Instance {
        Instance { status, ..self.clone() }
    }

    pub fn with_version(&self, version: u32) -> Instance {
        Instance { version, ..self.clone() }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

impl Entity for Instance {

    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}
