use async_trait::async_trait;

pub const REMINDER_TITLE: &str = "Recordatorio de Medicación";

pub fn reminder_body(id_medicamento: &str) -> String {
    format!("Es hora de tomar el medicamento: {}", id_medicamento)
}

/// Repeat interval for a reminder. The client always scheduled
/// `frecuencia × 3600` seconds, so that is the contract here too.
pub fn interval_seconds(frecuencia_dias: i64) -> u64 {
    frecuencia_dias.max(0) as u64 * 3600
}

/// Contact point for the platform notification scheduler. Fire-and-forget:
/// there is no acknowledgment and no cancellation contract, and a
/// scheduling failure never fails the reminder write itself.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule_repeating(&self, seconds: u64, title: &str, body: &str)
        -> Result<(), String>;
}

/// Default scheduler: records the request in the log. Stands in until a
/// push-notification bridge exists.
pub struct LoggingScheduler;

#[async_trait]
impl ReminderScheduler for LoggingScheduler {
    async fn schedule_repeating(
        &self,
        seconds: u64,
        title: &str,
        body: &str,
    ) -> Result<(), String> {
        tracing::info!(
            "Scheduling repeating notification every {}s: {} - {}",
            seconds,
            title,
            body
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_multiplies_by_an_hour() {
        assert_eq!(interval_seconds(8), 28_800);
        assert_eq!(interval_seconds(1), 3_600);
        assert_eq!(interval_seconds(0), 0);
        assert_eq!(interval_seconds(-5), 0);
    }

    #[test]
    fn notification_text_matches_the_client() {
        assert_eq!(REMINDER_TITLE, "Recordatorio de Medicación");
        assert_eq!(
            reminder_body("Amoxicilina"),
            "Es hora de tomar el medicamento: Amoxicilina"
        );
    }

    #[tokio::test]
    async fn logging_scheduler_always_succeeds() {
        let scheduler = LoggingScheduler;
        scheduler
            .schedule_repeating(3600, REMINDER_TITLE, "cuerpo")
            .await
            .unwrap();
    }
}
