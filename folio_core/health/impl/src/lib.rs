use folio_core_contact_contracts::ContactFeatureService;
use folio_core_health_contracts::{HealthFeatureService, HealthStatus};
use folio_shared_contracts::time::TimeService;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HealthFeatureServiceImpl<Time, Contact> {
    time: Time,
    contact: Contact,
}

impl<Time, Contact> HealthFeatureServiceImpl<Time, Contact> {
    pub fn new(time: Time, contact: Contact) -> Self {
        Self { time, contact }
    }
}

impl<Time, Contact> HealthFeatureService for HealthFeatureServiceImpl<Time, Contact>
where
    Time: TimeService,
    Contact: ContactFeatureService,
{
    async fn get_status(&self) -> HealthStatus {
        let email = self.contact.is_configured();
        if !email {
            debug!("Contact messages cannot be delivered, email is not configured");
        }

        HealthStatus {
            timestamp: self.time.now(),
            email,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use folio_core_contact_contracts::MockContactFeatureService;
    use folio_shared_contracts::time::MockTimeService;
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn ok() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let sut = HealthFeatureServiceImpl::new(
            MockTimeService::new().with_now(now),
            MockContactFeatureService::new().with_is_configured(true),
        );

        // Act
        let result = sut.get_status().await;

        // Assert
        assert_eq!(
            result,
            HealthStatus {
                timestamp: now,
                email: true
            }
        );
    }

    #[tokio::test]
    async fn email_not_configured() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let sut = HealthFeatureServiceImpl::new(
            MockTimeService::new().with_now(now),
            MockContactFeatureService::new().with_is_configured(false),
        );

        // Act
        let result = sut.get_status().await;

        // Assert
        assert!(!result.email);
        assert_eq!(result.timestamp, now);
    }
}
