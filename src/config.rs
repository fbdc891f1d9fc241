use serde::Deserialize;

/// What the order placement flow does with already-committed lines when a
/// later line fails. `Abandon` leaves them in place; `Compensate` restocks
/// them and deletes the partial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    Abandon,
    Compensate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub failure_mode: FailureMode,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let failure_mode = failure_mode_from(std::env::var("ORDER_COMPENSATION").ok().as_deref());
        Ok(Self {
            database_url,
            failure_mode,
        })
    }
}

fn failure_mode_from(raw: Option<&str>) -> FailureMode {
    match raw {
        Some("1") | Some("true") | Some("yes") => FailureMode::Compensate,
        _ => FailureMode::Abandon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compensation_defaults_off() {
        assert_eq!(failure_mode_from(None), FailureMode::Abandon);
        assert_eq!(failure_mode_from(Some("0")), FailureMode::Abandon);
        assert_eq!(failure_mode_from(Some("nope")), FailureMode::Abandon);
    }

    #[test]
    fn compensation_opt_in() {
        assert_eq!(failure_mode_from(Some("1")), FailureMode::Compensate);
        assert_eq!(failure_mode_from(Some("true")), FailureMode::Compensate);
        assert_eq!(failure_mode_from(Some("yes")), FailureMode::Compensate);
    }
}
