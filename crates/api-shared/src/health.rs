use crate::dto::HealthRes;

/// Simple health service shared by every API surface.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static health check; needs no instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Civic intake is alive".into(),
        }
    }
}
