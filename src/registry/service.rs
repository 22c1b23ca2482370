//! Registration-list backed registry.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::lifecycle::participant::Participant;
use crate::lifecycle::phase::Capability;
use crate::registry::{Registry, RegistryError};

type Disposer = Box<dyn FnOnce() + Send + Sync>;

struct Registration {
    participant: Arc<dyn Participant>,
    capabilities: Vec<Capability>,
}

#[derive(Default)]
struct Registrations {
    participants: Vec<Registration>,
    values: toml::Table,
    disposers: Vec<(String, Disposer)>,
}

/// Collects registrations before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    registrations: Registrations,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a participant under an explicit set of capabilities.
    pub fn add_participant<P: Participant>(
        &mut self,
        participant: P,
        capabilities: &[Capability],
    ) -> &mut Self {
        self.add_shared(Arc::new(participant), capabilities)
    }

    /// Register an already shared participant.
    pub fn add_shared(
        &mut self,
        participant: Arc<dyn Participant>,
        capabilities: &[Capability],
    ) -> &mut Self {
        let mut deduped: Vec<Capability> = Vec::with_capacity(capabilities.len());
        for capability in capabilities {
            if !deduped.contains(capability) {
                deduped.push(*capability);
            }
        }
        self.registrations.participants.push(Registration {
            participant,
            capabilities: deduped,
        });
        self
    }

    /// Register a hosted service: invoked in the start and stop phases.
    pub fn add_hosted_service<P: Participant>(&mut self, service: P) -> &mut Self {
        self.add_participant(service, &Capability::HOSTED_SERVICE)
    }

    /// Register a lifecycle participant: invoked in every phase.
    pub fn add_lifecycle_participant<P: Participant>(&mut self, participant: P) -> &mut Self {
        self.add_participant(participant, &Capability::ALL)
    }

    /// Register a named configuration value. A later value replaces an
    /// earlier one under the same key.
    pub fn add_value(
        &mut self,
        key: impl Into<String>,
        value: impl Into<toml::Value>,
    ) -> &mut Self {
        self.registrations.values.insert(key.into(), value.into());
        self
    }

    /// Register a resource release action, run when the registry is disposed.
    pub fn add_disposer<F>(&mut self, name: impl Into<String>, dispose: F) -> &mut Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        self.registrations.disposers.push((name.into(), Box::new(dispose)));
        self
    }

    /// Freeze the registrations.
    pub fn build(self) -> ServiceRegistry {
        tracing::debug!(
            participants = self.registrations.participants.len(),
            values = self.registrations.values.len(),
            disposers = self.registrations.disposers.len(),
            "Registry built"
        );
        ServiceRegistry {
            inner: RwLock::new(Some(self.registrations)),
            disposed: AtomicBool::new(false),
        }
    }
}

/// A registry over a fixed, ordered registration list.
pub struct ServiceRegistry {
    inner: RwLock<Option<Registrations>>,
    disposed: AtomicBool,
}

impl Registry for ServiceRegistry {
    fn resolve_all(
        &self,
        capability: Capability,
    ) -> Result<Vec<Arc<dyn Participant>>, RegistryError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let registrations = guard.as_ref().ok_or(RegistryError::Disposed)?;

        let resolved: Vec<Arc<dyn Participant>> = registrations
            .participants
            .iter()
            .filter(|r| r.capabilities.contains(&capability))
            .map(|r| Arc::clone(&r.participant))
            .collect();

        tracing::trace!(
            capability = %capability,
            count = resolved.len(),
            "Resolve participants"
        );
        Ok(resolved)
    }

    fn resolve_value(&self, key: &str) -> Result<Option<toml::Value>, RegistryError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let registrations = guard.as_ref().ok_or(RegistryError::Disposed)?;
        tracing::trace!(key, "Resolve configuration value");
        Ok(registrations.values.get(key).cloned())
    }

    fn dispose(&self) {
        if self
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let registrations = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(registrations) = registrations else {
            return;
        };

        // Participants go first so disposers see no live references from us.
        drop(registrations.participants);
        for (name, dispose) in registrations.disposers.into_iter().rev() {
            tracing::trace!(resource = %name, "Dispose resource");
            dispose();
        }
        tracing::debug!("Registry disposed");
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    struct Named(&'static str);

    impl Participant for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn names(participants: &[Arc<dyn Participant>]) -> Vec<String> {
        participants.iter().map(|p| p.name().to_string()).collect()
    }

    #[test]
    fn test_resolution_preserves_registration_order() {
        let mut builder = RegistryBuilder::new();
        builder
            .add_hosted_service(Named("a"))
            .add_lifecycle_participant(Named("b"))
            .add_participant(Named("c"), &[Capability::Start, Capability::Start])
            .add_participant(Named("d"), &[Capability::PostStop]);
        let registry = builder.build();

        let start = registry.resolve_all(Capability::Start).unwrap();
        assert_eq!(names(&start), vec!["a", "b", "c"]);

        let pre_start = registry.resolve_all(Capability::PreStart).unwrap();
        assert_eq!(names(&pre_start), vec!["b"]);

        let post_stop = registry.resolve_all(Capability::PostStop).unwrap();
        assert_eq!(names(&post_stop), vec!["b", "d"]);
    }

    #[test]
    fn test_typed_value_resolution() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Pool {
            size: u32,
        }

        let mut pool = toml::Table::new();
        pool.insert("size".into(), toml::Value::Integer(8));

        let mut builder = RegistryBuilder::new();
        builder.add_value("pool", pool).add_value("name", "demo");
        let registry: Arc<dyn Registry> = Arc::new(builder.build());

        assert_eq!(registry.resolve::<Pool>("pool").unwrap(), Pool { size: 8 });
        assert_eq!(registry.resolve::<String>("name").unwrap(), "demo");
        assert!(matches!(
            registry.resolve::<Pool>("missing"),
            Err(RegistryError::Missing(_))
        ));
        assert!(matches!(
            registry.resolve::<Pool>("name"),
            Err(RegistryError::Bind { .. })
        ));
    }

    #[test]
    fn test_dispose_runs_once_in_reverse_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = RegistryBuilder::new();
        for name in ["first", "second"] {
            let log = log.clone();
            builder.add_disposer(name, move || log.lock().unwrap().push(name));
        }
        builder.add_hosted_service(Named("svc"));
        let registry = builder.build();

        registry.dispose();
        registry.dispose();

        assert!(registry.is_disposed());
        assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
        assert!(matches!(
            registry.resolve_all(Capability::Start),
            Err(RegistryError::Disposed)
        ));
    }
}
