//! Check-then-create for a single named resource

use crate::error::Result;
use crate::model::ResourceKind;
use crate::report::{ProvisionEvent, ProvisionObserver, StepAction};
use std::future::Future;

/// A resource that is known to exist after [`ensure`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ensured<T> {
    Existing(T),
    Created(T),
}

impl<T> Ensured<T> {
    pub fn get(&self) -> &T {
        match self {
            Ensured::Existing(value) | Ensured::Created(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Ensured::Existing(value) | Ensured::Created(value) => value,
        }
    }

    pub fn action(&self) -> StepAction {
        match self {
            Ensured::Existing(_) => StepAction::Reused,
            Ensured::Created(_) => StepAction::Created,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Ensured::Created(_))
    }
}

/// Query `name`; reuse it if present, otherwise run `create`
///
/// Errors from either future propagate unchanged. `create` is never called
/// when the query finds the resource.
pub async fn ensure<T, Q, QF, C, CF>(
    kind: ResourceKind,
    name: &str,
    observer: &dyn ProvisionObserver,
    query: Q,
    create: C,
) -> Result<Ensured<T>>
where
    Q: FnOnce() -> QF,
    QF: Future<Output = Result<Option<T>>>,
    C: FnOnce() -> CF,
    CF: Future<Output = Result<T>>,
{
    observer.on_event(&ProvisionEvent::Checking {
        kind,
        name: name.to_string(),
    });

    if let Some(existing) = query().await? {
        tracing::info!("{} {} already exists, reusing", kind, name);
        observer.on_event(&ProvisionEvent::Reusing {
            kind,
            name: name.to_string(),
        });
        return Ok(Ensured::Existing(existing));
    }

    tracing::info!("Creating {} {}", kind, name);
    observer.on_event(&ProvisionEvent::Creating {
        kind,
        name: name.to_string(),
    });

    let created = create().await?;

    observer.on_event(&ProvisionEvent::Created {
        kind,
        name: name.to_string(),
    });
    Ok(Ensured::Created(created))
}
