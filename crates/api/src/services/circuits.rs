//! Circuit creation.
//!
//! A new circuit names only its terminating interface. The device and site
//! columns are resolved from that interface and written inside the creating
//! transaction, so the circuit's single `create` audit record already holds
//! the final termination.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::{CircuitTermination, CreateCircuit};
use persistence::entities::{CircuitEntity, DeviceEntity, InterfaceEntity};
use persistence::repositories::{CircuitRepository, PendingCreate};
use persistence::RepositoryError;

/// Orchestrates circuit creation over the generic repository.
#[derive(Clone)]
pub struct CircuitService {
    circuits: CircuitRepository,
}

impl CircuitService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            circuits: CircuitRepository::new(pool),
        }
    }

    /// Creates the circuit and derives its termination in one transaction.
    ///
    /// The interface and device rows stay share-locked until commit, so a
    /// concurrent move of the device waits for the circuit to land.
    pub async fn create(&self, payload: &CreateCircuit) -> Result<CircuitEntity, RepositoryError> {
        let mut pending = self.circuits.create_deferred(payload).await?;

        let termination = match resolve_termination(&mut pending, payload.interface_id).await {
            Ok(termination) => termination,
            Err(err) => {
                if let Err(rollback_err) = pending.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back circuit creation");
                }
                return Err(err);
            }
        };

        pending.assign(&termination).await?;
        let circuit = pending.commit().await?;

        info!(
            circuit_id = %circuit.id,
            cid = %circuit.cid,
            device_id = %termination.device_id,
            site_id = %termination.site_id,
            "Circuit created"
        );
        Ok(circuit)
    }
}

async fn resolve_termination(
    pending: &mut PendingCreate<CircuitEntity>,
    interface_id: Uuid,
) -> Result<CircuitTermination, RepositoryError> {
    let interface = pending.lock_shared::<InterfaceEntity>(interface_id).await?;
    let device = pending.lock_shared::<DeviceEntity>(interface.device_id).await?;

    Ok(CircuitTermination {
        device_id: device.id,
        site_id: device.site_id,
    })
}
