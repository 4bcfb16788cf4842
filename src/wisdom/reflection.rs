use crate::gemini::GenerativeContentService;
use tracing::{instrument, warn};

const LOG_TARGET: &str = "dharma_daily::wisdom::reflection";

/// Reply used when the service fails.
pub const FAILURE_ECHO: &str = "Your path is unique and valid. May you find clarity.";
/// Reply used when the service answers with nothing.
pub const EMPTY_ECHO: &str = "May your reflection bring you closer to peace.";

/// Turns a user's reflection into a short "Dharma Echo".
///
/// Returns `None` for a blank reflection without contacting the service.
/// Service failures are absorbed into a fixed reply.
#[instrument(skip(service, reflection))]
pub async fn handle_reflect(
    service: &dyn GenerativeContentService,
    concept: &str,
    reflection: &str,
) -> Option<String> {
    if reflection.trim().is_empty() {
        return None;
    }

    let echo = match service.generate_reflective_echo(concept, reflection).await {
        Ok(reply) if reply.trim().is_empty() => EMPTY_ECHO.to_string(),
        Ok(reply) => reply.trim().to_string(),
        Err(e) => {
            warn!(target: LOG_TARGET, "Error generating reflection echo: {}", e);
            FAILURE_ECHO.to_string()
        }
    };
    Some(echo)
}
